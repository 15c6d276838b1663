use std::fmt;
use std::ops::Deref;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use super::claims::Claims;

/// A signed bearer token together with the claims it was minted from.
///
/// Keeping the claims alongside the compact string lets callers reason about
/// expiry without decoding the token again.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    encoded: String,
    claims: Claims,
}

impl Token {
    pub(crate) fn new(encoded: String, claims: Claims) -> Token {
        Token { encoded, claims }
    }

    /// The compact `header.payload.signature` form.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Claims embedded in the token.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Expiration time in Unix seconds.
    pub fn expires_at(&self) -> u64 {
        self.claims.exp
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.claims.exp
    }
}

impl Deref for Token {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.encoded.as_str()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

// The encoded form is a credential; keep it out of debug output and logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("encoded", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Current time in whole seconds since the Unix epoch.
pub(crate) fn unix_now() -> Result<u64, SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
