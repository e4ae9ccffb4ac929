//! Session-related types.
//!
//! Keys under which authentication state is persisted in the browser's
//! session, and the view of that state handed back to the browser.

use serde::Serialize;

use bookstore_core::{AdminProfile, CustomerProfile, Role};

/// Session keys for authentication data.
///
/// Each value lives under its own key so that a corrupt entry can be
/// dropped without losing the others.
pub mod keys {
    /// Key for the access token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for the refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// Key for the serialized customer profile.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the serialized admin profile.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the display-only "logged in as" username.
    pub const DISPLAY_USERNAME: &str = "display_username";

    /// Every key written by the auth layer, cleared together on logout.
    pub const ALL: [&str; 5] = [
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        CURRENT_CUSTOMER,
        CURRENT_ADMIN,
        DISPLAY_USERNAME,
    ];
}

/// What the browser is told about its own session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_username: Option<String>,
}

impl SessionView {
    /// Build a view from the two identity slots.
    #[must_use]
    pub fn new(
        customer: Option<CustomerProfile>,
        admin: Option<AdminProfile>,
        display_username: Option<String>,
    ) -> Self {
        let role = match (&customer, &admin) {
            (_, Some(_)) => Some(Role::Admin),
            (Some(_), None) => Some(Role::Customer),
            (None, None) => None,
        };

        Self {
            logged_in: role.is_some(),
            role,
            customer,
            admin,
            display_username,
        }
    }
}
