//! Domain models for the storefront.
//!
//! - [`session`] - Persisted session keys and the session view returned to the browser
//! - [`token`] - Bearer tokens and the local expiry check

pub mod session;
pub mod token;

pub use session::{SessionView, keys as session_keys};
pub use token::AccessToken;
