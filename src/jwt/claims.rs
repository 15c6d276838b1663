use serde::{Deserialize, Serialize};

/// The registered claims carried by every self-issued API token.
///
/// All timestamps are seconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Audience the token is intended for (`"api"` by default).
    pub aud: String,

    /// Issuer of the token (`"mobile"` by default).
    pub iss: String,

    /// Issued-at time.
    pub iat: u64,

    /// Not-before time; equal to `iat` for issued tokens.
    pub nbf: u64,

    /// Expiration time.
    pub exp: u64,

    /// Token type, always `"JWT"`.
    pub typ: String,
}

impl Claims {
    /// Seconds of validity left at `now`, saturating at zero.
    pub fn remaining(&self, now: u64) -> u64 {
        self.exp.saturating_sub(now)
    }
}
