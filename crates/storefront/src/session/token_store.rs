//! Persistent storage of tokens and cached profiles.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use bookstore_core::{AdminProfile, CustomerProfile};

use super::StoreError;
use crate::models::{AccessToken, session_keys};

/// Token and profile storage backed by the browser's persistent session.
///
/// Cheap to clone; clones share the same underlying session record.
#[derive(Clone)]
pub struct TokenStore {
    session: Session,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Wrap the session attached to the current request.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, StoreError> {
        Ok(self
            .get_string(session_keys::ACCESS_TOKEN)
            .await?
            .map(AccessToken::new))
    }

    /// The stored refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self
            .get_string(session_keys::REFRESH_TOKEN)
            .await?
            .map(SecretString::from))
    }

    /// Store a fresh access token, and the refresh token when one was issued.
    ///
    /// A missing refresh token leaves any previously stored one in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_tokens(
        &self,
        access: &AccessToken,
        refresh: Option<&SecretString>,
    ) -> Result<(), StoreError> {
        self.session
            .insert(session_keys::ACCESS_TOKEN, access.expose())
            .await?;
        if let Some(refresh) = refresh {
            self.session
                .insert(session_keys::REFRESH_TOKEN, refresh.expose_secret())
                .await?;
        }
        Ok(())
    }

    /// Remove both tokens, leaving profiles in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn remove_tokens(&self) -> Result<(), StoreError> {
        self.session
            .remove_value(session_keys::ACCESS_TOKEN)
            .await?;
        self.session
            .remove_value(session_keys::REFRESH_TOKEN)
            .await?;
        Ok(())
    }

    /// Whether the stored access token exists and its `exp` claim is in the
    /// future. Never consults the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn is_access_token_structurally_valid(&self) -> Result<bool, StoreError> {
        Ok(self
            .access_token()
            .await?
            .is_some_and(|token| token.is_structurally_valid()))
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// The persisted customer profile.
    ///
    /// A corrupt entry is logged, removed, and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn customer(&self) -> Result<Option<CustomerProfile>, StoreError> {
        self.load(session_keys::CURRENT_CUSTOMER).await
    }

    /// The persisted admin profile.
    ///
    /// A corrupt entry is logged, removed, and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn admin(&self) -> Result<Option<AdminProfile>, StoreError> {
        self.load(session_keys::CURRENT_ADMIN).await
    }

    /// Persist the customer profile, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_customer(&self, profile: &CustomerProfile) -> Result<(), StoreError> {
        self.store(session_keys::CURRENT_CUSTOMER, profile).await
    }

    /// Persist the admin profile, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_admin(&self, profile: &AdminProfile) -> Result<(), StoreError> {
        self.store(session_keys::CURRENT_ADMIN, profile).await
    }

    /// Forget the persisted customer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn remove_customer(&self) -> Result<(), StoreError> {
        self.session
            .remove_value(session_keys::CURRENT_CUSTOMER)
            .await?;
        Ok(())
    }

    /// Forget the persisted admin profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn remove_admin(&self) -> Result<(), StoreError> {
        self.session
            .remove_value(session_keys::CURRENT_ADMIN)
            .await?;
        Ok(())
    }

    /// The display-only "logged in as" username.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn display_username(&self) -> Result<Option<String>, StoreError> {
        self.get_string(session_keys::DISPLAY_USERNAME).await
    }

    /// Remember the username shown in the page header.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_display_username(&self, username: &str) -> Result<(), StoreError> {
        self.session
            .insert(session_keys::DISPLAY_USERNAME, username)
            .await
    }

    // =========================================================================
    // Clearing
    // =========================================================================

    /// Remove every token, profile, and display value written by the auth
    /// layer. Unrelated session keys are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn clear(&self) -> Result<(), StoreError> {
        for key in session_keys::ALL {
            self.session.remove_value(key).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.load(key).await?;
        Ok(value.filter(|value| !value.is_empty()))
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.session.insert(key, value).await
    }

    /// Read and decode a key, dropping it if it no longer decodes.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.session.get_value(key).await? else {
            return Ok(None);
        };

        match serde_json::from_value(raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt session entry");
                self.session.remove_value(key).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use bookstore_core::{AdminId, CustomerId, Role};

    use super::*;
    use crate::models::token::tests::jwt_expiring_in;

    /// A token store over a fresh in-memory session.
    pub(crate) fn memory_token_store() -> TokenStore {
        let store = Arc::new(MemoryStore::default());
        TokenStore::new(Session::new(None, store, None))
    }

    pub(crate) fn sample_customer() -> CustomerProfile {
        CustomerProfile {
            id: CustomerId::new(1),
            full_name: "Ada Reader".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            mobile_number: "0771234567".to_string(),
            profile_picture: None,
            date_of_birth: None,
            bio: None,
            created_at: None,
            updated_at: None,
            roles: vec!["USER".to_string()],
        }
    }

    pub(crate) fn sample_admin() -> AdminProfile {
        AdminProfile {
            id: AdminId::new(2),
            username: "admin".to_string(),
            email: "admin@test.com".to_string(),
            role: Role::Admin,
            full_name: None,
            user_role: Some("ADMIN".to_string()),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let tokens = memory_token_store();
        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.refresh_token().await.unwrap().is_none());
        assert!(tokens.customer().await.unwrap().is_none());
        assert!(!tokens.is_access_token_structurally_valid().await.unwrap());
    }

    #[tokio::test]
    async fn test_set_tokens_keeps_refresh_when_not_reissued() {
        let tokens = memory_token_store();
        tokens
            .set_tokens(&AccessToken::new("a1"), Some(&SecretString::from("r1")))
            .await
            .unwrap();
        tokens
            .set_tokens(&AccessToken::new("a2"), None)
            .await
            .unwrap();

        assert_eq!(tokens.access_token().await.unwrap().unwrap().expose(), "a2");
        assert_eq!(
            tokens
                .refresh_token()
                .await
                .unwrap()
                .unwrap()
                .expose_secret(),
            "r1"
        );
    }

    #[tokio::test]
    async fn test_remove_tokens_keeps_profiles() {
        let tokens = memory_token_store();
        tokens
            .set_tokens(&AccessToken::new("a1"), Some(&SecretString::from("r1")))
            .await
            .unwrap();
        tokens.set_customer(&sample_customer()).await.unwrap();

        tokens.remove_tokens().await.unwrap();

        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.refresh_token().await.unwrap().is_none());
        assert!(tokens.customer().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_structural_validity_uses_stored_token() {
        let tokens = memory_token_store();
        tokens
            .set_tokens(&AccessToken::new(jwt_expiring_in(600)), None)
            .await
            .unwrap();
        assert!(tokens.is_access_token_structurally_valid().await.unwrap());

        tokens
            .set_tokens(&AccessToken::new(jwt_expiring_in(-600)), None)
            .await
            .unwrap();
        assert!(!tokens.is_access_token_structurally_valid().await.unwrap());
    }

    #[tokio::test]
    async fn test_profiles_are_stored_under_distinct_keys() {
        let tokens = memory_token_store();
        tokens.set_customer(&sample_customer()).await.unwrap();
        tokens.set_admin(&sample_admin()).await.unwrap();

        assert_eq!(tokens.customer().await.unwrap(), Some(sample_customer()));
        assert_eq!(tokens.admin().await.unwrap(), Some(sample_admin()));

        tokens.remove_customer().await.unwrap();
        assert!(tokens.customer().await.unwrap().is_none());
        assert!(tokens.admin().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_profile_is_removed() {
        let tokens = memory_token_store();
        tokens
            .session()
            .insert(session_keys::CURRENT_CUSTOMER, "{not a profile")
            .await
            .unwrap();

        assert!(tokens.customer().await.unwrap().is_none());
        assert!(
            tokens
                .session()
                .get_value(session_keys::CURRENT_CUSTOMER)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_clear_removes_only_auth_keys() {
        let tokens = memory_token_store();
        tokens
            .set_tokens(&AccessToken::new("a1"), Some(&SecretString::from("r1")))
            .await
            .unwrap();
        tokens.set_customer(&sample_customer()).await.unwrap();
        tokens.set_display_username("ada").await.unwrap();
        tokens.session().insert("cart_id", "c-1").await.unwrap();

        tokens.clear().await.unwrap();

        for key in session_keys::ALL {
            assert!(tokens.session().get_value(key).await.unwrap().is_none());
        }
        let cart: Option<String> = tokens.session().get("cart_id").await.unwrap();
        assert_eq!(cart.as_deref(), Some("c-1"));
    }
}
