//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, BackendClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It holds only what every
/// browser shares; per-browser auth state lives in the session and is
/// rebuilt for each request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: BackendClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = BackendClient::new(&config.api)?;
        Ok(Self::with_client(config, api))
    }

    /// Create application state around an existing backend client.
    #[must_use]
    pub fn with_client(config: StorefrontConfig, api: BackendClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, api }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the bookstore backend client.
    #[must_use]
    pub fn api(&self) -> &BackendClient {
        &self.inner.api
    }
}
