//! Identity roles recognized by the storefront.

use serde::{Deserialize, Serialize};

/// Which of the two mutually exclusive identities a logged-in user has.
///
/// The backend reports this as a free-form string (`"ADMIN"`, `"admin"`,
/// `"CUSTOMER"`, `"USER"`, ...). Only an admin marker is significant;
/// everything else is a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    /// Decide the role from the backend's role marker.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace and a
    /// leading `ROLE_` prefix. Missing markers mean customer.
    #[must_use]
    pub fn from_marker(marker: Option<&str>) -> Self {
        let Some(marker) = marker else {
            return Self::Customer;
        };
        let marker = marker.trim();
        let marker = if marker
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("role_"))
        {
            marker.get(5..).unwrap_or_default()
        } else {
            marker
        };

        if marker.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Customer
        }
    }

    /// Returns `true` for the admin role.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_markers() {
        assert_eq!(Role::from_marker(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::from_marker(Some("admin")), Role::Admin);
        assert_eq!(Role::from_marker(Some(" Admin ")), Role::Admin);
        assert_eq!(Role::from_marker(Some("ROLE_ADMIN")), Role::Admin);
    }

    #[test]
    fn test_everything_else_is_customer() {
        assert_eq!(Role::from_marker(None), Role::Customer);
        assert_eq!(Role::from_marker(Some("")), Role::Customer);
        assert_eq!(Role::from_marker(Some("USER")), Role::Customer);
        assert_eq!(Role::from_marker(Some("CUSTOMER")), Role::Customer);
        assert_eq!(Role::from_marker(Some("administrator")), Role::Customer);
    }

    #[test]
    fn test_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Customer.to_string(), "customer");
    }
}
