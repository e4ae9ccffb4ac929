//! Client for the remote bookstore services (auth, books, users).
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is the source of truth; the storefront keeps no copy
//!   beyond the browser session and a short-lived catalog cache
//! - Every request passes through [`AuthInterceptor`], which attaches the
//!   browser's bearer token and purges it on a 401
//!
//! # Example
//!
//! ```rust,ignore
//! use bookstore_storefront::api::{BackendClient, conversions, paths};
//!
//! let client = BackendClient::new(&config.api)?;
//! let body: serde_json::Value = client
//!     .post_json(None, paths::LOGIN, &LoginBody { identifier, password })
//!     .await?;
//! let envelope = conversions::decode_envelope(&body);
//! ```

mod cache;
mod catalog;
pub mod conversions;
pub mod interceptor;
pub mod types;

pub use catalog::{BookPage, BookQuery, BookSort, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SortField};
pub use conversions::Identity;
pub use interceptor::{AuthInterceptor, PublicEndpoints};

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::BackendConfig;
use crate::session::{StoreError, TokenStore};

use cache::CacheValue;

/// Backend endpoint paths, relative to the configured base URL.
pub mod paths {
    pub const LOGIN: &str = "auth/login";
    pub const REGISTER: &str = "auth/register";
    pub const ADMIN_REGISTER: &str = "auth/admin/register";
    pub const LOGOUT: &str = "auth/logout";
    pub const FORGOT_PASSWORD: &str = "auth/forgot-password";
    pub const RESET_PASSWORD: &str = "auth/reset-password";
    pub const PROFILE: &str = "users/profile";
    pub const CHANGE_PASSWORD: &str = "users/change-password";
    pub const USERNAMES: &str = "users/usernames";
    pub const EMAILS: &str = "users/emails";
    pub const BOOKS: &str = "books";
}

/// Errors that can occur when talking to the bookstore backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials (401). Stored tokens have
    /// already been cleared when this is returned.
    #[error("Unauthorized")]
    Unauthorized {
        /// Parsed error body, if it was JSON.
        body: Option<serde_json::Value>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Parsed error body, if it was JSON.
        body: Option<serde_json::Value>,
    },

    /// A success response whose body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The browser session could not be read while preparing the request.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// The backend's error body, when there was one.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Unauthorized { body } | Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// The HTTP status the backend answered with, if it answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the bookstore backend.
///
/// Cheaply cloneable; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    interceptor: AuthInterceptor,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
                interceptor: AuthInterceptor::default(),
                cache,
            }),
        })
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Url` if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build a request for `path`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Url` or `ApiError::Http` if the request cannot be built.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request, ApiError> {
        let mut builder = self.inner.client.request(method, self.endpoint(path)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    /// Send a request through the auth interceptor.
    ///
    /// The access token is read from `tokens` at call time. Non-success
    /// statuses become errors; a 401 additionally clears `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on 401, `ApiError::Status` on any
    /// other non-success status, and `ApiError::Http` on transport failure.
    #[instrument(skip_all, fields(method = %request.method(), path = %request.url().path()))]
    pub async fn execute(
        &self,
        tokens: Option<&TokenStore>,
        request: Request,
    ) -> Result<reqwest::Response, ApiError> {
        let token = match tokens {
            Some(tokens) => tokens.access_token().await?,
            None => None,
        };
        let request = self.inner.interceptor.intercept(request, token.as_ref());

        let response = self.inner.client.execute(request).await?;
        let status = response.status();
        self.inner.interceptor.on_response(status, tokens).await;

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text).ok();
        tracing::debug!(
            status = %status,
            body = %text.chars().take(200).collect::<String>(),
            "Backend returned non-success status"
        );

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized { body })
        } else {
            Err(ApiError::Status { status, body })
        }
    }

    /// Send a request and decode its JSON body. An empty body decodes as
    /// JSON `null`, so `T` may be an `Option` or a type with defaults.
    async fn send_json<T, B>(
        &self,
        tokens: Option<&TokenStore>,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(method, path, body)?;
        let response = self.execute(tokens, request).await?;
        let text = response.text().await?;

        if text.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]; also `ApiError::Parse` for unexpected bodies.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        tokens: Option<&TokenStore>,
        path: &str,
    ) -> Result<T, ApiError> {
        self.send_json::<T, ()>(tokens, Method::GET, path, None)
            .await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]; also `ApiError::Parse` for unexpected bodies.
    pub async fn post_json<T, B>(
        &self,
        tokens: Option<&TokenStore>,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(tokens, Method::POST, path, Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]; also `ApiError::Parse` for unexpected bodies.
    pub async fn put_json<T, B>(
        &self,
        tokens: Option<&TokenStore>,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(tokens, Method::PUT, path, Some(body)).await
    }

    /// Whether the backend answers at all. Any HTTP response counts.
    pub async fn ping(&self) -> bool {
        self.inner
            .client
            .get(self.inner.base_url.clone())
            .send()
            .await
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        let config = BackendConfig::with_base_url("http://api.test/v1").unwrap();
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = client();
        assert_eq!(
            client.endpoint(paths::LOGIN).unwrap().as_str(),
            "http://api.test/v1/auth/login"
        );
        assert_eq!(
            client.endpoint("/books/3").unwrap().as_str(),
            "http://api.test/v1/books/3"
        );
    }

    #[test]
    fn test_request_carries_json_body() {
        let client = client();
        let request = client
            .request(
                Method::POST,
                paths::FORGOT_PASSWORD,
                Some(&serde_json::json!({ "email": "a@b.c" })),
            )
            .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_api_error_status_and_body() {
        let err = ApiError::Status {
            status: StatusCode::CONFLICT,
            body: Some(serde_json::json!({ "message": "taken" })),
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.body().unwrap()["message"], "taken");
        assert_eq!(err.to_string(), "HTTP 409 Conflict");

        let err = ApiError::Unauthorized { body: None };
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.body().is_none());
    }
}
