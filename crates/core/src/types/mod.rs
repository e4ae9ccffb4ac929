//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod book;
pub mod email;
pub mod id;
pub mod price;
pub mod profile;
pub mod role;

pub use book::Book;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use profile::{AdminProfile, CustomerProfile};
pub use role::Role;
