//! Wire types for the bookstore backend.
//!
//! # Canonical contract
//!
//! Auth endpoints answer with the envelope
//!
//! ```json
//! { "success": true, "user": { ... }, "accessToken": "...", "refreshToken": "...", "message": "..." }
//! ```
//!
//! using camelCase field names. Older deployments send snake_case or
//! differently named mirrors (`data`, `token`, `full_name`, ...), sometimes
//! next to the canonical field. Response types here are therefore plain
//! structs: [`super::conversions`] fills them from raw JSON, canonical key
//! first, and is the only place that does.

use serde::{Deserialize, Serialize};

/// Response envelope for auth and profile endpoints.
#[derive(Debug, Clone, Default)]
pub struct AuthEnvelope {
    pub success: Option<bool>,
    pub user: Option<WireUser>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub message: Option<String>,
}

/// A user record as sent by the auth and users services.
#[derive(Debug, Clone, Default)]
pub struct WireUser {
    /// Numeric or string id.
    pub id: Option<serde_json::Value>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<String>,
    pub bio: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub role: Option<String>,
    pub user_role: Option<String>,
    pub roles: Vec<String>,
}

/// A book as sent by the books service.
#[derive(Debug, Clone)]
pub struct WireBook {
    pub id: serde_json::Value,
    pub title: String,
    pub author: Option<String>,
    pub price: rust_decimal::Decimal,
    pub currency: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

/// Book listing: a page object, or a bare array when the page fields are
/// all `None`.
#[derive(Debug, Clone, Default)]
pub struct WireBookPage {
    pub content: Vec<WireBook>,
    pub total_elements: Option<u64>,
    pub number: Option<u32>,
    pub size: Option<u32>,
}

// =============================================================================
// Request bodies
// =============================================================================

/// `POST /auth/login`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

/// `POST /auth/register` and `POST /auth/admin/register`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    pub username: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<&'a str>,
    pub password: &'a str,
}

/// `POST /users/change-password`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// `POST /auth/forgot-password`
#[derive(Debug, Serialize)]
pub struct ForgotPasswordBody<'a> {
    pub email: &'a str,
}

/// `POST /auth/reset-password`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/// `PUT /users/profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Generic `{ success, message }` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}
