//! # mobile-api-auth
//!
//! Authenticated access to a custom JSON API using self-issued bearer tokens.
//!
//! [`TokenIssuer`] mints HS256 tokens with a fixed claim template
//! (`aud = "api"`, `iss = "mobile"`, two-hour lifetime) from a shared secret.
//! [`ApiClient`] caches the token, attaches it to every request as
//! `Authorization: Bearer <token>` and decodes JSON responses into typed
//! results. On the receiving side, [`TokenVerifier`] validates those tokens
//! and [`Claims`] can be used directly as an Actix Web extractor.
//!
//! ## Example
//!
//! ```no_run
//! use mobile_api_auth::{ApiClient, Result};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     item_id: u32,
//!     query: Option<String>,
//! }
//!
//! async fn fetch_item() -> Result<Item> {
//!     // Reads API_BASE_URL and API_JWT_SECRET
//!     let api = ApiClient::from_env()?;
//!     api.get("/items/42?q=shoes").await
//! }
//! ```

mod client;
mod config;
mod error;
mod impls;
mod jwt;

pub use client::*;
pub use config::*;
pub use error::*;
pub use jwt::{
    Claims, IssuerConfig, SigningError, Token, TokenIssuer, TokenSource, TokenVerifier,
    VerificationError, DEFAULT_AUDIENCE, DEFAULT_ISSUER, DEFAULT_TTL, SECRET_ENV,
};
