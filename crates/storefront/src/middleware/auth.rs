//! Per-request auth context.
//!
//! Builds the token store and session state for each browser request from
//! the session attached by the session layer, hydrates the state once, and
//! hands both to handlers through [`AuthContext`].

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::Span;

use crate::api::BackendClient;
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthService;
use crate::session::{SessionState, TokenStore};

/// The browser's token store and hydrated session state for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub tokens: TokenStore,
    pub state: SessionState,
}

impl AuthContext {
    /// Auth operations bound to this request.
    #[must_use]
    pub const fn service<'a>(&'a self, api: &'a BackendClient) -> AuthService<'a> {
        AuthService::new(api, &self.tokens, &self.state)
    }
}

/// Middleware that attaches an [`AuthContext`] to every request.
///
/// Must run inside the session layer.
pub async fn session_context_middleware(mut request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return AppError::Internal("session layer missing".to_string()).into_response();
    };

    let tokens = TokenStore::new(session);
    let state = SessionState::new();
    if let Err(e) = state.hydrate(&tokens).await {
        return AppError::Session(e).into_response();
    }

    match state.snapshot().await {
        (_, Some(admin)) => {
            Span::current().record("user", admin.username.as_str());
            set_sentry_user(&admin.id, &admin.username, Some(&admin.email));
        }
        (Some(customer), None) => {
            Span::current().record("user", customer.username.as_str());
            set_sentry_user(&customer.id, &customer.username, Some(&customer.email));
        }
        (None, None) => {}
    }

    request
        .extensions_mut()
        .insert(AuthContext { tokens, state });
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Internal("auth context middleware missing".to_string()))
    }
}
