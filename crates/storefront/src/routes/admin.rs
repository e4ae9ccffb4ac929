//! Admin route handlers.
//!
//! These routes sit behind the admin guard.

use axum::Json;
use serde::Serialize;

use bookstore_core::AdminProfile;

use crate::error::{AppError, Result};
use crate::middleware::AuthContext;

/// Admin landing data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub admin: AdminProfile,
    pub greeting: String,
}

/// Admin overview.
pub async fn index(context: AuthContext) -> Result<Json<AdminOverview>> {
    let admin = context
        .state
        .current_admin()
        .await
        .ok_or_else(|| AppError::Forbidden("Admins only".to_string()))?;
    let greeting = format!("Welcome back, {}", admin.display_name());
    Ok(Json(AdminOverview { admin, greeting }))
}
