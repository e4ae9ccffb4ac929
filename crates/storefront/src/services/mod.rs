//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login, logout, registration, passwords, and profile, run
//!   against the bookstore backend on behalf of one browser session

pub mod auth;
