//! Account route handlers.
//!
//! These routes sit behind the login guard.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use bookstore_core::CustomerProfile;

use super::auth::{MessageResponse, session_view};
use crate::api::Identity;
use crate::api::types::ProfileUpdate;
use crate::error::Result;
use crate::middleware::AuthContext;
use crate::models::SessionView;
use crate::state::AppState;

/// Change password form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account overview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub session: SessionView,
    /// Name shown in the greeting.
    pub display_name: String,
}

/// Account overview for whoever is logged in.
pub async fn index(context: AuthContext) -> Result<Json<AccountOverview>> {
    let session = session_view(&context).await?;
    let display_name = match (&session.customer, &session.admin) {
        (_, Some(admin)) => admin.display_name().to_string(),
        (Some(customer), None) => customer.display_name().to_string(),
        (None, None) => String::new(),
    };
    Ok(Json(AccountOverview {
        session,
        display_name,
    }))
}

/// Reload the profile from the backend.
pub async fn profile(
    State(state): State<AppState>,
    context: AuthContext,
) -> Result<Json<Identity>> {
    let identity = context.service(state.api()).fetch_profile().await?;
    Ok(Json(identity))
}

/// Update the customer profile.
pub async fn update_profile(
    State(state): State<AppState>,
    context: AuthContext,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<CustomerProfile>> {
    let profile = context.service(state.api()).update_profile(update).await?;
    Ok(Json(profile))
}

/// Change the customer's password.
pub async fn change_password(
    State(state): State<AppState>,
    context: AuthContext,
    Json(form): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let message = context
        .service(state.api())
        .change_password(&form.current_password, &form.new_password)
        .await?;
    Ok(Json(MessageResponse { message }))
}
