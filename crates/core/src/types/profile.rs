//! Customer and admin identity profiles.
//!
//! A logged-in browser holds at most one of these at a time. Both are
//! replaced wholesale whenever the backend returns a fresh copy; there is no
//! field-level merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AdminId, CustomerId};
use super::role::Role;

/// A storefront customer as reported by the users service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Date of birth as sent by the backend (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Raw role markers attached to the account.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CustomerProfile {
    /// Name to greet the customer with: full name, falling back to username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// A storefront administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: AdminId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Backend-specific role label (e.g. `"ADMIN"`, `"SUPER_ADMIN"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl AdminProfile {
    /// Name to greet the admin with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer() -> CustomerProfile {
        CustomerProfile {
            id: CustomerId::new(1),
            full_name: String::new(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            mobile_number: "0771234567".to_string(),
            profile_picture: None,
            date_of_birth: None,
            bio: None,
            created_at: None,
            updated_at: None,
            roles: vec!["USER".to_string()],
        }
    }

    #[test]
    fn test_customer_display_name_falls_back_to_username() {
        let mut profile = customer();
        assert_eq!(profile.display_name(), "reader");
        profile.full_name = "Ada Reader".to_string();
        assert_eq!(profile.display_name(), "Ada Reader");
    }

    #[test]
    fn test_customer_serializes_camel_case() {
        let json = serde_json::to_value(customer()).unwrap();
        assert_eq!(json["fullName"], "");
        assert_eq!(json["mobileNumber"], "0771234567");
        assert!(json.get("bio").is_none());
    }

    #[test]
    fn test_admin_display_name() {
        let admin = AdminProfile {
            id: AdminId::new(9),
            username: "admin".to_string(),
            email: "admin@test.com".to_string(),
            role: Role::Admin,
            full_name: Some("  ".to_string()),
            user_role: Some("ADMIN".to_string()),
        };
        assert_eq!(admin.display_name(), "admin");
    }
}
