//! Email addresses as typed into the auth forms.

use core::fmt;

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    /// Not of the form `local@domain`.
    #[error("email must look like name@domain")]
    Malformed,
}

/// A validated email address, checked before any registration, login or
/// password-reset request leaves the storefront.
///
/// The backend has the final word on deliverability; this only rejects
/// input that can never be an address.
///
/// ```
/// use bookstore_core::Email;
///
/// assert!(Email::parse(" reader@example.com ").is_ok());
/// assert!(Email::parse("reader@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse a trimmed address.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, too long, or lacks a
    /// non-empty local part and domain around a single `@`.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EmailError::Empty);
        }
        if raw.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match raw.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(raw.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Whether a login identifier should be treated as an email rather
    /// than a username.
    #[must_use]
    pub fn looks_like_email(identifier: &str) -> bool {
        identifier.contains('@')
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
