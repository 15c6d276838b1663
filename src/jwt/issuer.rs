use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tracing::debug;

use super::claims::Claims;
use super::config::{IssuerConfig, TOKEN_TYPE};
use super::error::SigningError;
use super::token::{unix_now, Token};
use crate::config::ConfigurationError;

/// Anything that can hand [`ApiClient`](crate::ApiClient) a fresh bearer token.
///
/// [`TokenIssuer`] is the production implementation; other sources can be
/// injected with [`ApiClient::with_source`](crate::ApiClient::with_source).
pub trait TokenSource: Send + Sync + 'static {
    /// Produces a new token. Called only when the client has no usable cached token.
    fn issue(&self) -> Result<Token, SigningError>;
}

/// Mints HS256 tokens from a fixed claim template and a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
    key: EncodingKey,
}

impl TokenIssuer {
    /// Creates an issuer; fails if the secret is empty.
    pub fn new(config: IssuerConfig) -> Result<TokenIssuer, ConfigurationError> {
        if config.secret().is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }

        let key = EncodingKey::from_secret(config.secret());
        Ok(TokenIssuer { config, key })
    }

    /// Creates an issuer whose secret comes from
    /// [`SECRET_ENV`](super::SECRET_ENV).
    pub fn from_env() -> Result<TokenIssuer, ConfigurationError> {
        TokenIssuer::new(IssuerConfig::from_env()?)
    }

    /// Issues a token valid from now until now + ttl.
    pub fn issue(&self) -> Result<Token, SigningError> {
        self.issue_at(unix_now()?)
    }

    /// Issues a token as if the current time were `now` (Unix seconds).
    pub fn issue_at(&self, now: u64) -> Result<Token, SigningError> {
        let ttl = self.config.ttl().as_secs();
        let exp = now
            .checked_add(ttl)
            .ok_or(SigningError::ExpiryOverflow { issued_at: now, ttl })?;

        let claims = Claims {
            aud: self.config.audience().to_owned(),
            iss: self.config.issuer().to_owned(),
            iat: now,
            nbf: now,
            exp,
            typ: TOKEN_TYPE.to_owned(),
        };

        let encoded = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(SigningError::Encode)?;

        debug!(aud = %claims.aud, iss = %claims.iss, exp = claims.exp, "Issued API token");
        Ok(Token::new(encoded, claims))
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }
}

impl TokenSource for TokenIssuer {
    fn issue(&self) -> Result<Token, SigningError> {
        TokenIssuer::issue(self)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{TokenVerifier, DEFAULT_TTL, SECRET_ENV};
    use std::time::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(IssuerConfig::new("test-secret")).unwrap()
    }

    #[test]
    fn stamps_fixed_claim_template() {
        let token = issuer().issue_at(1_700_000_000).unwrap();

        assert_eq!(
            token.claims(),
            &Claims {
                aud: "api".into(),
                iss: "mobile".into(),
                iat: 1_700_000_000,
                nbf: 1_700_000_000,
                exp: 1_700_007_200,
                typ: "JWT".into(),
            }
        );
    }

    #[test]
    fn issue_uses_current_time() {
        let before = unix_now().unwrap();
        let token = issuer().issue().unwrap();
        let after = unix_now().unwrap();

        let claims = token.claims();
        assert!(before <= claims.iat && claims.iat <= after);
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp, claims.iat + DEFAULT_TTL.as_secs());
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn produces_three_part_hs256_token() {
        let token = issuer().issue().unwrap();
        assert_eq!(token.split('.').count(), 3);

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn encoded_payload_matches_returned_claims() {
        let token = issuer().issue().unwrap();
        let decoded: Claims = TokenVerifier::peek(&token).unwrap();
        assert_eq!(&decoded, token.claims());
    }

    #[test]
    fn honours_custom_template() {
        let issuer = TokenIssuer::new(
            IssuerConfig::new("s3cr3t")
                .with_audience("reports")
                .with_issuer("batch")
                .with_ttl(Duration::from_secs(30)),
        )
        .unwrap();

        let claims = issuer.issue_at(100).unwrap().claims().clone();
        assert_eq!(claims.aud, "reports");
        assert_eq!(claims.iss, "batch");
        assert_eq!(claims.exp, 130);
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let issuer = TokenIssuer::new(IssuerConfig::new("s").with_ttl(Duration::MAX)).unwrap();
        let result = issuer.issue_at(1_700_000_000);
        assert!(
            matches!(
                result,
                Err(SigningError::ExpiryOverflow { issued_at: 1_700_000_000, ttl }) if ttl == u64::MAX
            ),
            "Expected ExpiryOverflow error, got {result:?}"
        );

        let result = self::issuer().issue_at(u64::MAX);
        assert!(
            matches!(result, Err(SigningError::ExpiryOverflow { ttl: 7200, .. })),
            "Expected ExpiryOverflow error, got {result:?}"
        );
    }

    #[test]
    fn rejects_empty_secret() {
        let err = TokenIssuer::new(IssuerConfig::new("")).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSecret));
    }

    #[test]
    fn missing_secret_env_is_reported_by_name() {
        let err = IssuerConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingEnv { name } if name == SECRET_ENV
        ));
    }

    #[test]
    fn debug_output_hides_secret() {
        let debug = format!("{:?}", issuer());
        assert!(!debug.contains("test-secret"));
    }
}
