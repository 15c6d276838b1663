use actix_web::error::InternalError;
use actix_web::http::{header, StatusCode};
use actix_web::{dev, http::header::Header, web, FromRequest, HttpRequest};
use actix_web::{HttpResponse, ResponseError};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::{err, ok, Ready};
use tracing::debug;

use crate::{Claims, Error, TokenVerifier};

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            // Local misconfiguration or an unusable token on our side
            Error::Configuration(_) | Error::Signing(_) | Error::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            Error::Network(http_err) if http_err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,

            // The upstream API failed or answered with something unusable
            Error::Api { .. } | Error::Network(_) | Error::Decode(_) => StatusCode::BAD_GATEWAY,

            Error::Verification(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl FromRequest for Claims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let Some(verifier) = req.app_data::<web::Data<TokenVerifier>>() else {
            return err(internal_token_verification_error());
        };

        let bearer = match Authorization::<Bearer>::parse(req) {
            Ok(header) => header.into_scheme(),
            Err(_) => {
                // RFC 7235: a missing or non-Bearer Authorization header is a 401
                // with a WWW-Authenticate challenge, not Actix's default 400.
                return err(missing_or_malformed_auth_header());
            }
        };

        match verifier.verify(bearer.token()) {
            Ok(claims) => ok(claims),
            Err(verification_err) => {
                debug!(error = %verification_err, "Rejected bearer token");
                err(invalid_token_error(&Error::Verification(verification_err)))
            }
        }
    }
}

fn internal_token_verification_error() -> actix_web::Error {
    let response = HttpResponse::InternalServerError()
        .body("Token verification is not configured for this application");

    InternalError::from_response("token_verification_failure", response).into()
}

fn missing_or_malformed_auth_header() -> actix_web::Error {
    unauthorized_with_www_authenticate(
        "invalid_request",
        "Authorization header missing or not using Bearer scheme",
        "Authorization header is missing or malformed",
    )
}

fn invalid_token_error(err: &Error) -> actix_web::Error {
    unauthorized_with_www_authenticate(
        "invalid_token",
        &err.to_string(),
        "Invalid authentication credentials",
    )
}

/// Constructs a 401 `actix_web::Error` carrying a Bearer `WWW-Authenticate` challenge.
fn unauthorized_with_www_authenticate(
    www_error_code: &str,
    www_error_description: &str,
    body: impl Into<String>,
) -> actix_web::Error {
    let header_value = format!(
        r#"Bearer realm="api", error="{www_error_code}", error_description="{www_error_description}""#
    );

    let response = HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, header_value))
        .body(body.into());

    InternalError::from_response("auth_error", response).into()
}
