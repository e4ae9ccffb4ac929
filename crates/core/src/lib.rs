//! Bookstore Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront and its tests:
//! customer and admin profiles, catalog entries, and the small newtypes
//! they are built from.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! storage. Mapping from the remote backend's wire format into these types
//! lives in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Profiles, roles, books, prices, emails, and typed IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
