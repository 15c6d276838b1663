use std::fmt;

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::claims::Claims;
use super::config::IssuerConfig;
use super::error::{VerificationError, VerificationResult};
use crate::config::ConfigurationError;

/// Validates tokens minted by [`TokenIssuer`](super::TokenIssuer) for the same secret.
///
/// Checks the HS256 signature, `aud`, `iss`, `exp` and `nbf` with no leeway.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &IssuerConfig) -> Result<TokenVerifier, ConfigurationError> {
        if config.secret().is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_audience(&[config.audience()]);
        validation.set_issuer(&[config.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        Ok(TokenVerifier {
            key: DecodingKey::from_secret(config.secret()),
            validation,
        })
    }

    pub fn from_env() -> Result<TokenVerifier, ConfigurationError> {
        TokenVerifier::new(&IssuerConfig::from_env()?)
    }

    /// Verifies `token` and returns its claims.
    pub fn verify(&self, token: &str) -> VerificationResult<Claims> {
        self.verify_as(token)
    }

    /// Verifies `token` and deserializes the payload into `T`.
    pub fn verify_as<T: DeserializeOwned>(&self, token: &str) -> VerificationResult<T> {
        let header =
            jsonwebtoken::decode_header(token).map_err(|_| VerificationError::InvalidToken)?;

        if header.alg != Algorithm::HS256 {
            return Err(VerificationError::InvalidAlgorithm);
        }

        jsonwebtoken::decode::<T>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                match Self::peek::<serde_json::Value>(token) {
                    Ok(unverified) => {
                        debug!(error = %err, claims = %unverified, "Token verification failed");
                    }
                    Err(_) => debug!(error = %err, "Token verification failed"),
                }
                VerificationError::from(err)
            })
    }

    /// Decodes the payload without checking the signature or any claim.
    ///
    /// Only for diagnostics; never trust the result.
    pub fn peek<T: DeserializeOwned>(token: &str) -> VerificationResult<T> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(VerificationError::InvalidToken);
        }

        let payload = BASE64_URL_SAFE_NO_PAD.decode(parts[1].trim())?;

        serde_json::from_slice(&payload).map_err(|_| VerificationError::InvalidToken)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::token::unix_now;
    use crate::jwt::TokenIssuer;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    use serde::Deserialize;

    fn random_secret() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect()
    }

    fn pair(config: IssuerConfig) -> (TokenIssuer, TokenVerifier) {
        let verifier = TokenVerifier::new(&config).unwrap();
        (TokenIssuer::new(config).unwrap(), verifier)
    }

    #[test]
    fn accepts_freshly_issued_token() {
        let (issuer, verifier) = pair(IssuerConfig::new(random_secret()));
        let token = issuer.issue().unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(&claims, token.claims());
    }

    #[test]
    fn verify_as_deserializes_subset() {
        #[derive(Deserialize)]
        struct Audience {
            aud: String,
        }

        let (issuer, verifier) = pair(IssuerConfig::new(random_secret()));
        let token = issuer.issue().unwrap();

        let partial: Audience = verifier.verify_as(&token).unwrap();
        assert_eq!(partial.aud, "api");
    }

    #[test]
    fn fails_on_invalid_jwt_format() {
        let (_, verifier) = pair(IssuerConfig::new(random_secret()));
        let result = verifier.verify("not.a.jwt");
        assert!(
            matches!(result, Err(VerificationError::InvalidToken)),
            "Expected InvalidToken error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_wrong_secret() {
        let issuer = TokenIssuer::new(IssuerConfig::new(random_secret())).unwrap();
        let verifier = TokenVerifier::new(&IssuerConfig::new(random_secret())).unwrap();

        let result = verifier.verify(&issuer.issue().unwrap());
        assert!(
            matches!(result, Err(VerificationError::InvalidSignature)),
            "Expected InvalidSignature error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_incorrect_audience() {
        let secret = random_secret();
        let issuer =
            TokenIssuer::new(IssuerConfig::new(secret.clone()).with_audience("other")).unwrap();
        let verifier = TokenVerifier::new(&IssuerConfig::new(secret)).unwrap();

        let result = verifier.verify(&issuer.issue().unwrap());
        assert!(
            matches!(result, Err(VerificationError::InvalidAudience)),
            "Expected InvalidAudience error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_incorrect_issuer() {
        let secret = random_secret();
        let issuer =
            TokenIssuer::new(IssuerConfig::new(secret.clone()).with_issuer("web")).unwrap();
        let verifier = TokenVerifier::new(&IssuerConfig::new(secret)).unwrap();

        let result = verifier.verify(&issuer.issue().unwrap());
        assert!(
            matches!(result, Err(VerificationError::InvalidIssuer)),
            "Expected InvalidIssuer error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_expired_token() {
        let (issuer, verifier) = pair(IssuerConfig::new(random_secret()));

        // Issued three hours ago, so it expired an hour ago.
        let token = issuer.issue_at(unix_now().unwrap() - 3 * 60 * 60).unwrap();

        let result = verifier.verify(&token);
        assert!(
            matches!(result, Err(VerificationError::Expired)),
            "Expected Expired error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_token_not_valid_yet() {
        let (issuer, verifier) = pair(IssuerConfig::new(random_secret()));
        let token = issuer.issue_at(unix_now().unwrap() + 600).unwrap();

        let result = verifier.verify(&token);
        assert!(
            matches!(result, Err(VerificationError::NotYetValid)),
            "Expected NotYetValid error, got {result:?}"
        );
    }

    #[test]
    fn fails_on_wrong_algorithm() {
        let secret = random_secret();
        let (issuer, verifier) = pair(IssuerConfig::new(secret.clone()));
        let claims = issuer.issue().unwrap().claims().clone();

        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = verifier.verify(&token);
        assert!(
            matches!(result, Err(VerificationError::InvalidAlgorithm)),
            "Expected InvalidAlgorithm error, got {result:?}"
        );
    }

    #[test]
    fn rejected_token_payload_is_still_readable() {
        let issuer = TokenIssuer::new(IssuerConfig::new(random_secret())).unwrap();
        let verifier = TokenVerifier::new(&IssuerConfig::new(random_secret())).unwrap();
        let token = issuer.issue().unwrap();

        assert!(matches!(
            verifier.verify_as::<serde_json::Value>(&token),
            Err(VerificationError::InvalidSignature)
        ));

        let unverified = TokenVerifier::peek::<serde_json::Value>(&token).unwrap();
        assert_eq!(unverified["aud"], "api");
        assert_eq!(unverified["exp"], token.expires_at());
    }

    #[test]
    fn peek_rejects_non_three_part_tokens() {
        let result = TokenVerifier::peek::<Claims>("header.payload");
        assert!(matches!(result, Err(VerificationError::InvalidToken)));
    }

    #[test]
    fn peek_reports_bad_base64() {
        let result = TokenVerifier::peek::<Claims>("a.!!!.c");
        assert!(matches!(result, Err(VerificationError::CannotDecodeJwt(_))));
    }

    #[test]
    fn rejects_empty_secret() {
        let err = TokenVerifier::new(&IssuerConfig::new("")).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSecret));
    }
}
