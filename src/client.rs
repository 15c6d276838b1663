use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::*;

use crate::config::{ApiConfig, ConfigurationError};
use crate::jwt::{unix_now, SigningError, Token, TokenIssuer, TokenSource};
use crate::Error;

const APPLICATION_JSON: &str = "application/json";

/// Authenticated JSON client for the custom API.
///
/// Every request carries `Authorization: Bearer <token>` and
/// `Content-Type: application/json`. The token is obtained from the
/// [`TokenSource`] on first use and cached; the configured
/// [`RefreshPolicy`](crate::RefreshPolicy) decides when it is replaced.
///
/// Cloning is cheap and clones share the cached token, so one client can be
/// handed to every component that talks to the API.
pub struct ApiClient<S = TokenIssuer> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    config: ApiConfig,
    http: reqwest::Client,
    source: S,
    token: Mutex<Option<Token>>,
}

impl<S> Clone for ApiClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ApiClient<TokenIssuer> {
    /// Creates a client that signs its own tokens with `issuer`.
    pub fn new(config: ApiConfig, issuer: TokenIssuer) -> crate::Result<Self> {
        Self::with_source(config, issuer)
    }

    /// Builds the client from `API_BASE_URL` and `API_JWT_SECRET`.
    ///
    /// Fails with [`ConfigurationError`] before any request is made if either is unset.
    pub fn from_env() -> crate::Result<Self> {
        Self::new(ApiConfig::from_env()?, TokenIssuer::from_env()?)
    }

    #[cfg(test)]
    pub(crate) fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig::from_lookup(&lookup)?;
        let issuer = TokenIssuer::new(crate::jwt::IssuerConfig::from_lookup(&lookup)?)?;
        Self::new(config, issuer)
    }
}

impl<S: TokenSource> ApiClient<S> {
    /// Creates a client that takes its tokens from an arbitrary source.
    pub fn with_source(config: ApiConfig, source: S) -> crate::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigurationError::HttpClient)?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                source,
                token: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The token currently cached, if any.
    pub fn cached_token(&self) -> Option<Token> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the cached token so the next request issues a new one.
    pub fn clear_token(&self) {
        let mut cached = self.inner.token.lock().unwrap_or_else(PoisonError::into_inner);
        if cached.take().is_some() {
            debug!("Cleared cached API token");
        }
    }

    /// Sends `GET base_url + endpoint` and decodes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> crate::Result<T> {
        self.send::<T, ()>(Method::GET, endpoint, None).await
    }

    /// Sends `POST base_url + endpoint` with `body` as JSON and decodes the JSON response.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> crate::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    /// Sends `PUT base_url + endpoint` with `body` as JSON and decodes the JSON response.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> crate::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, endpoint, Some(body)).await
    }

    /// Sends `PATCH base_url + endpoint` with `body` as JSON and decodes the JSON response.
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> crate::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PATCH, endpoint, Some(body)).await
    }

    /// Sends `DELETE base_url + endpoint` and decodes the JSON response.
    ///
    /// An empty response body fails to decode; use `T = ()` only with APIs
    /// that answer `null`.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> crate::Result<T> {
        self.send::<T, ()>(Method::DELETE, endpoint, None).await
    }

    async fn send<T, B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> crate::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let headers = self.headers()?;
        let url = self.inner.config.url(endpoint);

        let mut request = self.inner.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body).map_err(Error::Serialize)?);
        }

        let response = request.send().await.map_err(Error::Network)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "API request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        response.json::<T>().await.map_err(Error::Decode)
    }

    /// Builds the per-request header set around a usable token.
    pub(crate) fn headers(&self) -> crate::Result<HeaderMap> {
        let token = self.token()?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(SigningError::HeaderValue)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok(headers)
    }

    /// Returns the cached token, issuing a new one if none is cached or the
    /// refresh policy marks it stale.
    ///
    /// The lock is held across issuance so concurrent callers never sign twice.
    fn token(&self) -> Result<Token, SigningError> {
        let mut cached = self.inner.token.lock().unwrap_or_else(PoisonError::into_inner);

        match cached.as_ref() {
            Some(token) => {
                let now = unix_now()?;
                if !self.inner.config.refresh_policy().needs_refresh(token, now) {
                    return Ok(token.clone());
                }
                debug!(
                    exp = token.expires_at(),
                    remaining = token.claims().remaining(now),
                    "Cached API token is stale, reissuing"
                );
            }
            None => debug!("No cached API token, issuing"),
        }

        let token = self.inner.source.issue()?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

impl<S> fmt::Debug for ApiClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
