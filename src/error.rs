/// A crate-wide result type alias using the custom [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for token issuance, API calls and token verification.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration is missing or malformed.
    #[error(transparent)]
    Configuration(#[from] crate::config::ConfigurationError),

    /// The bearer token could not be produced.
    #[error(transparent)]
    Signing(#[from] crate::jwt::SigningError),

    /// The API answered with a non-success status.
    #[error("API Error: {status} - {status_text}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for `status`, empty if unknown.
        status_text: String,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request to the API failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize the request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body was not the JSON shape the caller asked for.
    #[error("failed to decode the API response: {0}")]
    Decode(#[source] reqwest::Error),

    /// An incoming token failed verification.
    #[error(transparent)]
    Verification(#[from] crate::jwt::VerificationError),
}
