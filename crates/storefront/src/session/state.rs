//! In-memory session state: who is logged in.

use std::sync::Arc;

use tokio::sync::RwLock;

use bookstore_core::{AdminProfile, CustomerProfile, Role};

use super::{StoreError, TokenStore};

#[derive(Debug, Default)]
struct Slots {
    customer: Option<CustomerProfile>,
    admin: Option<AdminProfile>,
    initialized: bool,
}

/// The current customer or admin, plus whether persisted state has been
/// loaded yet.
///
/// Constructed explicitly for each browser request and passed to the guard,
/// the interceptor and the auth operations; there is no global instance.
/// Clones share the same slots.
///
/// At most one of customer and admin is set: each setter clears the other
/// slot.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Slots>>,
}

impl SessionState {
    /// Empty, not-yet-initialized state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted profiles from `tokens` the first time it is called.
    ///
    /// Later calls do nothing. The state counts as initialized after the
    /// first attempt even if the store could not be read. If both profiles
    /// were persisted, the admin wins and the stale customer entry is
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn hydrate(&self, tokens: &TokenStore) -> Result<(), StoreError> {
        let mut slots = self.inner.write().await;
        if slots.initialized {
            return Ok(());
        }
        slots.initialized = true;

        let admin = tokens.admin().await?;
        let mut customer = tokens.customer().await?;

        if admin.is_some() && customer.is_some() {
            tracing::warn!("Both customer and admin profiles persisted; keeping admin");
            tokens.remove_customer().await?;
            customer = None;
        }

        slots.admin = admin;
        slots.customer = customer;
        Ok(())
    }

    /// Whether [`Self::hydrate`] has run.
    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.initialized
    }

    /// The logged-in customer, if any.
    pub async fn current_customer(&self) -> Option<CustomerProfile> {
        self.inner.read().await.customer.clone()
    }

    /// The logged-in admin, if any.
    pub async fn current_admin(&self) -> Option<AdminProfile> {
        self.inner.read().await.admin.clone()
    }

    /// Customer set or admin set.
    pub async fn is_logged_in(&self) -> bool {
        let slots = self.inner.read().await;
        slots.customer.is_some() || slots.admin.is_some()
    }

    /// Role of whoever is logged in.
    pub async fn role(&self) -> Option<Role> {
        let slots = self.inner.read().await;
        match (&slots.customer, &slots.admin) {
            (_, Some(_)) => Some(Role::Admin),
            (Some(_), None) => Some(Role::Customer),
            (None, None) => None,
        }
    }

    /// Both slots read under one lock.
    pub async fn snapshot(&self) -> (Option<CustomerProfile>, Option<AdminProfile>) {
        let slots = self.inner.read().await;
        (slots.customer.clone(), slots.admin.clone())
    }

    /// Replace the customer and clear the admin slot.
    pub async fn set_customer(&self, profile: CustomerProfile) {
        let mut slots = self.inner.write().await;
        slots.customer = Some(profile);
        slots.admin = None;
    }

    /// Replace the admin and clear the customer slot.
    pub async fn set_admin(&self, profile: AdminProfile) {
        let mut slots = self.inner.write().await;
        slots.admin = Some(profile);
        slots.customer = None;
    }

    /// Log out in memory. The initialized flag is kept.
    pub async fn clear(&self) {
        let mut slots = self.inner.write().await;
        slots.customer = None;
        slots.admin = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::token_store::tests::{memory_token_store, sample_admin, sample_customer};

    #[tokio::test]
    async fn test_new_state_is_empty_and_uninitialized() {
        let state = SessionState::new();
        assert!(!state.is_initialized().await);
        assert!(!state.is_logged_in().await);
        assert_eq!(state.role().await, None);
    }

    #[tokio::test]
    async fn test_setters_keep_slots_exclusive() {
        let state = SessionState::new();
        state.set_customer(sample_customer()).await;
        assert_eq!(state.role().await, Some(Role::Customer));

        state.set_admin(sample_admin()).await;
        assert!(state.current_customer().await.is_none());
        assert_eq!(state.current_admin().await.unwrap().username, "admin");

        state.set_customer(sample_customer()).await;
        assert!(state.current_admin().await.is_none());
        assert!(state.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = SessionState::new();
        let clone = state.clone();
        clone.set_customer(sample_customer()).await;
        assert!(state.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_hydrate_loads_persisted_customer() {
        let tokens = memory_token_store();
        tokens.set_customer(&sample_customer()).await.unwrap();

        let state = SessionState::new();
        state.hydrate(&tokens).await.unwrap();

        assert!(state.is_initialized().await);
        assert_eq!(state.current_customer().await, Some(sample_customer()));
    }

    #[tokio::test]
    async fn test_hydrate_with_nothing_stored_still_initializes() {
        let tokens = memory_token_store();
        let state = SessionState::new();
        state.hydrate(&tokens).await.unwrap();

        assert!(state.is_initialized().await);
        assert!(!state.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_hydrate_runs_once() {
        let tokens = memory_token_store();
        let state = SessionState::new();
        state.hydrate(&tokens).await.unwrap();

        tokens.set_customer(&sample_customer()).await.unwrap();
        state.hydrate(&tokens).await.unwrap();

        assert!(!state.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_hydrate_prefers_admin_when_both_persisted() {
        let tokens = memory_token_store();
        tokens.set_customer(&sample_customer()).await.unwrap();
        tokens.set_admin(&sample_admin()).await.unwrap();

        let state = SessionState::new();
        state.hydrate(&tokens).await.unwrap();

        assert!(state.current_customer().await.is_none());
        assert!(state.current_admin().await.is_some());
        assert!(tokens.customer().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_keeps_initialized() {
        let tokens = memory_token_store();
        tokens.set_admin(&sample_admin()).await.unwrap();
        let state = SessionState::new();
        state.hydrate(&tokens).await.unwrap();

        state.clear().await;
        assert!(!state.is_logged_in().await);
        assert!(state.is_initialized().await);
    }
}
