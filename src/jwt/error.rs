use std::time::SystemTimeError;

use thiserror::Error;

pub(super) type VerificationResult<T> = std::result::Result<T, VerificationError>;

/// Errors that can occur while minting a token.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The signing primitive rejected the header, claims or key.
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// `iat + ttl` does not fit in a Unix timestamp.
    #[error("token expiry overflows: issued at {issued_at} with a ttl of {ttl}s")]
    ExpiryOverflow {
        /// Requested issue time.
        issued_at: u64,
        /// Configured lifetime in seconds.
        ttl: u64,
    },

    /// The system clock reports a time before the Unix epoch.
    #[error("system clock is before the Unix epoch: {0}")]
    Clock(#[from] SystemTimeError),

    /// The encoded token cannot be carried in an HTTP header.
    #[error("token is not a valid HTTP header value")]
    HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}

/// Errors that can occur during token verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The token signature does not match the shared secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token header names an algorithm other than HS256.
    #[error("Invalid token algorithm")]
    InvalidAlgorithm,

    /// The token format is invalid or could not be parsed.
    #[error("Invalid token")]
    InvalidToken,

    /// The token's `exp` is in the past.
    #[error("Token has expired")]
    Expired,

    /// The token's `nbf` is in the future.
    #[error("Token is not valid yet")]
    NotYetValid,

    /// The token's `aud` does not match.
    #[error("Invalid audience")]
    InvalidAudience,

    /// The token's `iss` is not accepted.
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// A required claim is absent.
    #[error("Missing required claim '{0}'")]
    MissingClaim(String),

    /// Failed to Base64 decode JWT.
    #[error("Could not decode token payload")]
    CannotDecodeJwt(#[from] base64::DecodeError),
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                VerificationError::InvalidAlgorithm
            }
            ErrorKind::ExpiredSignature => VerificationError::Expired,
            ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
            ErrorKind::InvalidAudience => VerificationError::InvalidAudience,
            ErrorKind::InvalidIssuer => VerificationError::InvalidIssuer,
            ErrorKind::MissingRequiredClaim(claim) => {
                VerificationError::MissingClaim(claim.clone())
            }
            _ => VerificationError::InvalidToken,
        }
    }
}
