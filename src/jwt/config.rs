use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::{required, ConfigurationError};

/// Environment variable holding the shared HMAC secret.
pub const SECRET_ENV: &str = "API_JWT_SECRET";

/// Audience stamped into every token.
pub const DEFAULT_AUDIENCE: &str = "api";

/// Issuer stamped into every token.
pub const DEFAULT_ISSUER: &str = "mobile";

/// Token lifetime: two hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub(crate) const TOKEN_TYPE: &str = "JWT";

/// Claim template and secret shared by [`TokenIssuer`](super::TokenIssuer)
/// and [`TokenVerifier`](super::TokenVerifier).
#[derive(Clone)]
pub struct IssuerConfig {
    secret: String,
    audience: String,
    issuer: String,
    ttl: Duration,
}

impl IssuerConfig {
    pub fn new(secret: impl Into<String>) -> IssuerConfig {
        IssuerConfig {
            secret: secret.into(),
            audience: DEFAULT_AUDIENCE.to_owned(),
            issuer: DEFAULT_ISSUER.to_owned(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Reads the secret from [`SECRET_ENV`].
    pub fn from_env() -> Result<IssuerConfig, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<IssuerConfig, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        required(&lookup, SECRET_ENV).map(IssuerConfig::new)
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> IssuerConfig {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> IssuerConfig {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> IssuerConfig {
        self.ttl = ttl;
        self
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}
