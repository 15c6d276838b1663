use std::env;
use std::time::Duration;

use url::Url;

use crate::jwt::Token;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

/// Optional environment variable overriding the refresh skew, in seconds.
pub const REFRESH_SKEW_ENV: &str = "API_TOKEN_REFRESH_SKEW_SECS";

/// How long before `exp` a cached token is replaced unless configured otherwise.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(60);

/// Errors raised while assembling configuration. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A required environment variable is unset or blank.
    #[error("environment variable '{name}' is not set")]
    MissingEnv {
        /// Name of the variable.
        name: &'static str,
    },

    /// The base URL is empty or whitespace.
    #[error("the API base URL is empty")]
    MissingBaseUrl,

    /// The base URL does not parse as an absolute URL.
    #[error("the API base URL is not a valid absolute URL: {0}")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The HMAC signing secret is empty.
    #[error("the token signing secret is empty")]
    MissingSecret,

    /// The refresh skew override is not a whole number of seconds.
    #[error("'{value}' is not a valid refresh skew in seconds")]
    InvalidSkew {
        /// The rejected raw value.
        value: String,
    },

    /// The underlying reqwest client could not be built.
    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Decides when a cached token must be replaced before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Keep the first token for the lifetime of the client, even past `exp`.
    Never,

    /// Issue a new token once `now >= exp - skew`.
    BeforeExpiry {
        /// Margin before expiry at which the cached token counts as stale.
        skew: Duration,
    },
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy::BeforeExpiry {
            skew: DEFAULT_REFRESH_SKEW,
        }
    }
}

impl RefreshPolicy {
    /// Whether `token` must be replaced at `now` (Unix seconds).
    pub fn needs_refresh(&self, token: &Token, now: u64) -> bool {
        match self {
            RefreshPolicy::Never => false,
            RefreshPolicy::BeforeExpiry { skew } => {
                token.is_expired(now.saturating_add(skew.as_secs()))
            }
        }
    }
}

/// Connection settings for [`ApiClient`](crate::ApiClient).
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: String,
    refresh: RefreshPolicy,
    timeout: Option<Duration>,
}

impl ApiConfig {
    /// Creates a config for `base_url`, which must be a non-empty absolute URL.
    ///
    /// The URL is kept verbatim; request URLs are `base_url + endpoint`.
    pub fn new(base_url: impl Into<String>) -> Result<ApiConfig, ConfigurationError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        Url::parse(&base_url).map_err(ConfigurationError::InvalidBaseUrl)?;

        Ok(ApiConfig {
            base_url,
            refresh: RefreshPolicy::default(),
            timeout: None,
        })
    }

    /// Reads [`BASE_URL_ENV`] and, if present, [`REFRESH_SKEW_ENV`].
    pub fn from_env() -> Result<ApiConfig, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<ApiConfig, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required(&lookup, BASE_URL_ENV)?;
        let mut config = ApiConfig::new(base_url)?;

        if let Some(raw) = lookup(REFRESH_SKEW_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigurationError::InvalidSkew { value: raw.clone() })?;
            config.refresh = RefreshPolicy::BeforeExpiry {
                skew: Duration::from_secs(secs),
            };
        }

        Ok(config)
    }

    /// Replaces the token refresh policy.
    #[must_use]
    pub fn with_refresh_policy(mut self, refresh: RefreshPolicy) -> ApiConfig {
        self.refresh = refresh;
        self
    }

    /// Applies a total request timeout to every call. Unset by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> ApiConfig {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Plain concatenation; no escaping or slash normalization.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

/// Looks up `name`, treating unset and blank values alike.
pub(crate) fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigurationError::MissingEnv { name })
}
