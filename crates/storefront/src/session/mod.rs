//! Client-side authentication state.
//!
//! Two pieces cooperate here:
//!
//! - [`TokenStore`] mirrors tokens and profiles into the browser's
//!   persistent session so they survive a reload.
//! - [`SessionState`] is the in-memory view of who is logged in, hydrated
//!   once from the token store and then updated by the auth operations.
//!
//! Neither writes to the other on its own; the auth service keeps them in
//! step.

mod state;
pub(crate) mod token_store;

pub use state::SessionState;
pub use token_store::TokenStore;

/// Errors from the underlying session store.
pub type StoreError = tower_sessions::session::Error;
