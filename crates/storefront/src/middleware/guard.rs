//! Route guards.
//!
//! Decides whether a navigation to a protected page may proceed. Allowed
//! requests pass through untouched. Denied page requests are redirected to
//! the login page with the attempted URL preserved in `returnUrl`; denied
//! `/api/` requests get a bare status.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use url::form_urlencoded;

use super::auth::AuthContext;
use crate::error::AppError;
use crate::session::SessionState;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Query parameter carrying the page to return to after login.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Why a guard refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    /// Page request from a visitor who is not logged in.
    RedirectToLogin(String),
    /// API request from a visitor who is not logged in.
    Unauthorized,
    /// Logged in, but without the required role.
    Forbidden,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please log in to continue" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "You do not have access to this page" })),
            )
                .into_response(),
        }
    }
}

/// Whether the visitor may enter a login-protected route.
pub async fn can_enter(state: &SessionState) -> bool {
    state.is_logged_in().await
}

/// Login page URL that will bring the visitor back to `target`.
///
/// The target's own query parameters are carried over (minus any stale
/// `returnUrl`), and `returnUrl` is set to the exact path and query that
/// was attempted.
#[must_use]
pub fn login_redirect_url(target: &Uri) -> String {
    let attempted = target
        .path_and_query()
        .map_or_else(|| target.path().to_string(), ToString::to_string);

    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(existing) = target.query() {
        for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
            if key != RETURN_URL_PARAM {
                query.append_pair(&key, &value);
            }
        }
    }
    query.append_pair(RETURN_URL_PARAM, &attempted);

    format!("{LOGIN_PATH}?{}", query.finish())
}

/// The `returnUrl` to send the visitor to after login, if it stays on this
/// site. Anything else falls back to `default`.
#[must_use]
pub fn safe_return_url<'a>(raw: Option<&'a str>, default: &'a str) -> &'a str {
    match raw.map(str::trim) {
        Some(url)
            if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") =>
        {
            url
        }
        _ => default,
    }
}

fn deny(uri: &Uri) -> GuardRejection {
    if uri.path().starts_with("/api/") {
        GuardRejection::Unauthorized
    } else {
        GuardRejection::RedirectToLogin(login_redirect_url(uri))
    }
}

/// The request's session state. Cloned out so no borrow of the request is
/// held across an await.
fn session_state(request: &Request) -> Result<SessionState, AppError> {
    request
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.state.clone())
        .ok_or_else(|| AppError::Internal("auth context middleware missing".to_string()))
}

/// Middleware admitting only logged-in visitors (customer or admin).
pub async fn require_login(request: Request, next: Next) -> Response {
    let state = match session_state(&request) {
        Ok(state) => state,
        Err(e) => return e.into_response(),
    };
    if !can_enter(&state).await {
        tracing::debug!(path = %request.uri().path(), "Login required");
        return deny(request.uri()).into_response();
    }
    next.run(request).await
}

/// Middleware admitting only logged-in admins.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let state = match session_state(&request) {
        Ok(state) => state,
        Err(e) => return e.into_response(),
    };
    if !can_enter(&state).await {
        return deny(request.uri()).into_response();
    }
    if state.current_admin().await.is_none() {
        tracing::info!(path = %request.uri().path(), "Non-admin refused admin route");
        return GuardRejection::Forbidden.into_response();
    }
    next.run(request).await
}
