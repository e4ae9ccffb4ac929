//! Authentication route handlers.
//!
//! Handles login, registration, logout, password reset, and the session
//! view against the bookstore auth service.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use bookstore_core::{AdminProfile, CustomerProfile, Role};

use crate::api::Identity;
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{AuthContext, safe_return_url};
use crate::models::SessionView;
use crate::services::auth::{AdminRegisterRequest, Availability, RegisterRequest};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageQuery {
    pub return_url: Option<String>,
    pub error: Option<String>,
}

/// Values to check with [`availability`].
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub username: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// What the login page needs to render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageView {
    /// Where a successful login will go; already checked to be on-site.
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session: SessionView,
}

/// Result of a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub identity: Identity,
    pub redirect_to: String,
}

/// Result of a registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse<P> {
    pub profile: P,
    /// Whether the new account was logged in straight away.
    pub logged_in: bool,
}

/// A confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Login page view model.
pub async fn login_page(
    context: AuthContext,
    Query(query): Query<LoginPageQuery>,
) -> Result<Json<LoginPageView>> {
    Ok(Json(LoginPageView {
        return_url: safe_return_url(query.return_url.as_deref(), "/").to_string(),
        error: query.error,
        session: session_view(&context).await?,
    }))
}

/// Log in.
pub async fn login(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = context
        .service(state.api())
        .login(&form.identifier, &form.password)
        .await?;

    let default_target = match identity.role() {
        Role::Admin => "/admin",
        Role::Customer => "/",
    };
    let redirect_to = safe_return_url(form.return_url.as_deref(), default_target).to_string();

    identify(&identity);
    add_breadcrumb("auth", "Logged in");

    Ok(Json(LoginResponse {
        identity,
        redirect_to,
    }))
}

/// Register a customer account.
pub async fn register(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse<CustomerProfile>>)> {
    let profile = context.service(state.api()).register(&form).await?;
    let logged_in = context.state.current_customer().await.is_some();
    if logged_in {
        set_sentry_user(&profile.id, &profile.username, Some(&profile.email));
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { profile, logged_in }),
    ))
}

/// Register an admin account.
pub async fn register_admin(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<AdminRegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse<AdminProfile>>)> {
    let profile = context.service(state.api()).register_admin(&form).await?;
    let logged_in = context.state.current_admin().await.is_some();
    if logged_in {
        set_sentry_user(&profile.id, &profile.username, Some(&profile.email));
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { profile, logged_in }),
    ))
}

/// Log out. Always succeeds.
pub async fn logout(State(state): State<AppState>, context: AuthContext) -> Json<SessionView> {
    context.service(state.api()).logout().await;
    clear_sentry_user();
    add_breadcrumb("auth", "Logged out");
    Json(SessionView::new(None, None, None))
}

/// Request a password reset email.
pub async fn forgot_password(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let message = context
        .service(state.api())
        .forgot_password(&form.email)
        .await?;
    Ok(Json(MessageResponse { message }))
}

/// Set a new password from a reset link.
pub async fn reset_password(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let message = context
        .service(state.api())
        .reset_password(&form.token, &form.new_password)
        .await?;
    Ok(Json(MessageResponse { message }))
}

/// Who is logged in.
pub async fn session(context: AuthContext) -> Result<Json<SessionView>> {
    Ok(Json(session_view(&context).await?))
}

/// Check whether a username and/or email is free.
pub async fn availability(
    State(state): State<AppState>,
    context: AuthContext,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>> {
    let availability = context
        .service(state.api())
        .check_availability(query.username.as_deref(), query.email.as_deref())
        .await?;
    Ok(Json(availability))
}

// =============================================================================
// Helpers
// =============================================================================

/// The browser's view of its own session.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn session_view(context: &AuthContext) -> Result<SessionView> {
    let (customer, admin) = context.state.snapshot().await;
    let display_username = context.tokens.display_username().await?;
    Ok(SessionView::new(customer, admin, display_username))
}

fn identify(identity: &Identity) {
    match identity {
        Identity::Customer(c) => set_sentry_user(&c.id, &c.username, Some(&c.email)),
        Identity::Admin(a) => set_sentry_user(&a.id, &a.username, Some(&a.email)),
    }
}
