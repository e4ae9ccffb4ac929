//! Authentication service.
//!
//! Every flow either succeeds and commits its effects to both the
//! persistent [`TokenStore`] and the request's [`SessionState`], or fails
//! with a single [`AuthError`] and leaves both untouched.
//!
//! Calls to public auth endpoints are sent without the token store, so a
//! rejected login does not wipe the session it was attempted from.

mod error;

pub use error::{AuthError, FALLBACK_MESSAGE, extract_message, normalize_error};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use bookstore_core::{AdminProfile, CustomerProfile, Email, Role};

use crate::api::conversions::{
    convert_admin, convert_customer, convert_identity, decode_envelope, decode_profile_user,
};
use crate::api::types::{
    Ack, ChangePasswordBody, ForgotPasswordBody, LoginBody, ProfileUpdate,
    RegisterBody, ResetPasswordBody, WireUser,
};
use crate::api::{ApiError, BackendClient, Identity, paths};
use crate::models::AccessToken;
use crate::session::{SessionState, TokenStore};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful login: the identity now in session.
pub type LoginOutcome = Identity;

/// Customer registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub mobile_number: Option<String>,
    pub password: String,
}

/// Admin registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Answer to an availability check; `None` where nothing was asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_available: Option<bool>,
}

/// Authentication service.
///
/// Borrowed for the duration of one browser request.
pub struct AuthService<'a> {
    api: &'a BackendClient,
    tokens: &'a TokenStore,
    state: &'a SessionState,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        api: &'a BackendClient,
        tokens: &'a TokenStore,
        state: &'a SessionState,
    ) -> Self {
        Self { api, tokens, state }
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Log in with a username or email and a password.
    ///
    /// The backend's role decides which slot is filled; the other slot is
    /// emptied both in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for blank input or a malformed email,
    /// `AuthError::Auth` if the backend refuses, and `AuthError::Network` if
    /// it cannot be reached.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::validation("Please enter your username or email."));
        }
        if password.is_empty() {
            return Err(AuthError::validation("Please enter your password."));
        }
        if Email::looks_like_email(identifier) {
            Email::parse(identifier)
                .map_err(|_| AuthError::validation("Please enter a valid email address."))?;
        }

        let body: Value = self
            .api
            .post_json(None, paths::LOGIN, &LoginBody { identifier, password })
            .await?;
        let envelope = decode_envelope(&body);

        let user = accepted_user(
            envelope.success,
            envelope.user,
            envelope.message.as_deref(),
            "Login failed. Please check your credentials.",
        )?;
        let identity = self
            .establish(convert_identity(user), envelope.access_token, envelope.refresh_token)
            .await?;

        tracing::info!(role = %identity.role(), username = identity.username(), "Logged in");
        Ok(identity)
    }

    /// Log out. Always succeeds.
    ///
    /// The backend is told on a best-effort basis; whatever it answers, the
    /// store and the in-memory state are cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let notify: Result<Ack, ApiError> = self
            .api
            .post_json(Some(self.tokens), paths::LOGOUT, &serde_json::json!({}))
            .await;
        if let Err(e) = notify {
            tracing::warn!(error = %e, "Backend logout failed; clearing local session anyway");
        }

        if let Err(e) = self.tokens.clear().await {
            tracing::error!(error = %e, "Failed to clear stored tokens on logout");
        }
        self.state.clear().await;
        tracing::info!("Logged out");
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a customer account.
    ///
    /// When the backend issues tokens with the new account, the customer is
    /// logged in straight away; otherwise nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for missing or malformed fields,
    /// otherwise as [`Self::login`].
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<CustomerProfile, AuthError> {
        require_field(&request.full_name, "Please enter your full name.")?;
        require_field(&request.username, "Please choose a username.")?;
        let email = parse_email(&request.email)?;
        validate_password(&request.password)?;

        let body = RegisterBody {
            full_name: Some(request.full_name.trim()),
            username: request.username.trim(),
            email: email.as_str(),
            mobile_number: request
                .mobile_number
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty()),
            password: &request.password,
        };
        let response: Value = self.api.post_json(None, paths::REGISTER, &body).await?;
        let envelope = decode_envelope(&response);

        let user = accepted_user(
            envelope.success,
            envelope.user,
            envelope.message.as_deref(),
            "Registration failed. Please try again.",
        )?;
        let profile = convert_customer(user);

        if envelope.access_token.is_some() {
            self.establish(
                Identity::Customer(profile.clone()),
                envelope.access_token,
                envelope.refresh_token,
            )
            .await?;
        }
        Ok(profile)
    }

    /// Register an admin account. Same flow as [`Self::register`], routed
    /// into the admin slot.
    ///
    /// # Errors
    ///
    /// As [`Self::register`].
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register_admin(
        &self,
        request: &AdminRegisterRequest,
    ) -> Result<AdminProfile, AuthError> {
        require_field(&request.username, "Please choose a username.")?;
        let email = parse_email(&request.email)?;
        validate_password(&request.password)?;

        let body = RegisterBody {
            full_name: request
                .full_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty()),
            username: request.username.trim(),
            email: email.as_str(),
            mobile_number: None,
            password: &request.password,
        };
        let response: Value = self
            .api
            .post_json(None, paths::ADMIN_REGISTER, &body)
            .await?;
        let envelope = decode_envelope(&response);

        let user = accepted_user(
            envelope.success,
            envelope.user,
            envelope.message.as_deref(),
            "Registration failed. Please try again.",
        )?;
        let profile = convert_admin(user);

        if envelope.access_token.is_some() {
            self.establish(
                Identity::Admin(profile.clone()),
                envelope.access_token,
                envelope.refresh_token,
            )
            .await?;
        }
        Ok(profile)
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    /// Change the logged-in customer's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Auth("Not logged in")` without calling the
    /// backend when no customer is in session, and `AuthError::Validation`
    /// if the new password is too short or equals the current one.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<String, AuthError> {
        if self.state.current_customer().await.is_none() {
            return Err(AuthError::auth("Not logged in"));
        }
        if current.is_empty() {
            return Err(AuthError::validation("Please enter your current password."));
        }
        validate_password(new)?;
        if current == new {
            return Err(AuthError::validation(
                "New password must be different from the current password.",
            ));
        }

        let ack: Ack = self
            .protected(
                self.api.post_json(
                    Some(self.tokens),
                    paths::CHANGE_PASSWORD,
                    &ChangePasswordBody {
                        current_password: current,
                        new_password: new,
                    },
                ),
            )
            .await?;

        acknowledged(ack, "Password changed successfully.")
    }

    /// Ask the backend to send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed email, otherwise
    /// whatever the backend reports.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        let email = parse_email(email)?;
        let ack: Ack = self
            .api
            .post_json(
                None,
                paths::FORGOT_PASSWORD,
                &ForgotPasswordBody {
                    email: email.as_str(),
                },
            )
            .await?;

        acknowledged(
            ack,
            "If an account exists for that email, a password reset link has been sent.",
        )
    }

    /// Set a new password using a reset token from the emailed link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a blank token or short password,
    /// otherwise whatever the backend reports.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError> {
        require_field(token, "The reset link is invalid or incomplete.")?;
        validate_password(new_password)?;

        let ack: Ack = self
            .api
            .post_json(
                None,
                paths::RESET_PASSWORD,
                &ResetPasswordBody {
                    token: token.trim(),
                    new_password,
                },
            )
            .await?;

        acknowledged(ack, "Your password has been reset. You can now log in.")
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Reload the logged-in identity from the backend and store it.
    ///
    /// A stored access token that is already past its `exp` is not sent:
    /// the session is cleared and the caller is asked to log in again.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Auth` if nobody is logged in or the session has
    /// expired, otherwise whatever the backend reports.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Identity, AuthError> {
        let Some(role) = self.state.role().await else {
            return Err(AuthError::auth("Not logged in"));
        };

        if !self.tokens.is_access_token_structurally_valid().await? {
            tracing::info!("Stored access token expired; clearing session");
            self.tokens.clear().await?;
            self.state.clear().await;
            return Err(AuthError::auth("Your session has expired. Please log in again."));
        }

        let body: Value = self
            .protected(self.api.get_json(Some(self.tokens), paths::PROFILE))
            .await?;
        let user = unwrap_user(&body)?;

        let identity = match role {
            Role::Admin => Identity::Admin(convert_admin(user)),
            Role::Customer => Identity::Customer(convert_customer(user)),
        };
        self.commit(&identity).await?;
        Ok(identity)
    }

    /// Update the logged-in customer's profile.
    ///
    /// The stored profile is replaced wholesale by what the backend returns,
    /// or by the current profile with the submitted fields applied when the
    /// backend returns no user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Auth` if no customer is logged in,
    /// `AuthError::Validation` for a blank name or malformed email, otherwise
    /// whatever the backend reports.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<CustomerProfile, AuthError> {
        let Some(current) = self.state.current_customer().await else {
            return Err(AuthError::auth("Not logged in"));
        };
        require_field(&update.full_name, "Please enter your full name.")?;
        let email = parse_email(&update.email)?;
        let update = ProfileUpdate {
            full_name: update.full_name.trim().to_string(),
            email: email.into_inner(),
            mobile_number: update.mobile_number.trim().to_string(),
            ..update
        };

        let response: Value = self
            .protected(self.api.put_json(Some(self.tokens), paths::PROFILE, &update))
            .await?;
        let envelope = decode_envelope(&response);
        if envelope.success == Some(false) {
            return Err(AuthError::auth(
                envelope
                    .message
                    .unwrap_or_else(|| "Profile update failed.".to_string()),
            ));
        }

        let profile = envelope.user.map_or_else(
            || CustomerProfile {
                full_name: update.full_name.clone(),
                email: update.email.clone(),
                mobile_number: update.mobile_number.clone(),
                date_of_birth: update
                    .date_of_birth
                    .clone()
                    .or_else(|| current.date_of_birth.clone()),
                bio: update.bio.clone().or_else(|| current.bio.clone()),
                profile_picture: update
                    .profile_picture
                    .clone()
                    .or_else(|| current.profile_picture.clone()),
                ..current.clone()
            },
            convert_customer,
        );

        self.commit(&Identity::Customer(profile.clone())).await?;
        Ok(profile)
    }

    /// Check whether a username and/or email is still free.
    ///
    /// Compares case-insensitively against the backend's public lists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if neither value is given, otherwise
    /// whatever the backend reports.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Availability, AuthError> {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if username.is_none() && email.is_none() {
            return Err(AuthError::validation("Enter a username or email to check."));
        }

        let mut availability = Availability::default();
        if let Some(username) = username {
            let taken: Value = self.api.get_json(None, paths::USERNAMES).await?;
            availability.username_available = Some(!contains_ignore_case(&taken, username));
        }
        if let Some(email) = email {
            let taken: Value = self.api.get_json(None, paths::EMAILS).await?;
            availability.email_available = Some(!contains_ignore_case(&taken, email));
        }
        Ok(availability)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Persist tokens and the identity, then update memory. Previously
    /// stored tokens are dropped even when the backend issued none.
    async fn establish(
        &self,
        identity: Identity,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Identity, AuthError> {
        // Whatever is stored belongs to the previous identity
        self.tokens.remove_tokens().await?;
        if let Some(access) = access_token.filter(|t| !t.is_empty()) {
            let refresh = refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from);
            self.tokens
                .set_tokens(&AccessToken::new(access), refresh.as_ref())
                .await?;
        } else {
            tracing::warn!("Backend accepted credentials but issued no access token");
        }

        self.commit(&identity).await?;
        Ok(identity)
    }

    /// Write the identity to its slot and empty the other, in the store and
    /// then in memory.
    async fn commit(&self, identity: &Identity) -> Result<(), AuthError> {
        match identity {
            Identity::Admin(admin) => {
                self.tokens.set_admin(admin).await?;
                self.tokens.remove_customer().await?;
                self.tokens.set_display_username(&admin.username).await?;
                self.state.set_admin(admin.clone()).await;
            }
            Identity::Customer(customer) => {
                self.tokens.set_customer(customer).await?;
                self.tokens.remove_admin().await?;
                self.tokens.set_display_username(&customer.username).await?;
                self.state.set_customer(customer.clone()).await;
            }
        }
        Ok(())
    }

    /// Await a call made with credentials. A 401 has already emptied the
    /// store; mirror that in memory.
    async fn protected<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, AuthError> {
        match call.await {
            Ok(value) => Ok(value),
            Err(err) => {
                if matches!(err, ApiError::Unauthorized { .. }) {
                    self.state.clear().await;
                }
                Err(normalize_error(err))
            }
        }
    }
}

/// The user from an envelope the backend marked as accepted.
fn accepted_user(
    success: Option<bool>,
    user: Option<WireUser>,
    message: Option<&str>,
    fallback: &str,
) -> Result<WireUser, AuthError> {
    let refused = || {
        AuthError::auth(
            message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(fallback),
        )
    };

    if success == Some(false) {
        return Err(refused());
    }
    user.ok_or_else(refused)
}

/// The user record from a profile response, enveloped or bare.
fn unwrap_user(body: &Value) -> Result<WireUser, AuthError> {
    decode_profile_user(body).ok_or_else(|| {
        tracing::error!("Profile response did not contain a user");
        AuthError::network(FALLBACK_MESSAGE)
    })
}

/// The message of an acknowledgement, unless the backend said no.
fn acknowledged(ack: Ack, default: &str) -> Result<String, AuthError> {
    let message = ack.message.filter(|m| !m.trim().is_empty());
    if ack.success == Some(false) {
        return Err(AuthError::auth(
            message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        ));
    }
    Ok(message.unwrap_or_else(|| default.to_string()))
}

/// Whether a list response (bare array or `{ data: [...] }`) contains
/// `needle`, ignoring case.
fn contains_ignore_case(list: &Value, needle: &str) -> bool {
    let items = match list {
        Value::Array(items) => items,
        Value::Object(map) => match map.values().find_map(Value::as_array) {
            Some(items) => items,
            None => return false,
        },
        _ => return false,
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .any(|item| item.trim().eq_ignore_ascii_case(needle))
}

fn require_field(value: &str, message: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::validation(message));
    }
    Ok(())
}

fn parse_email(raw: &str) -> Result<Email, AuthError> {
    if raw.trim().is_empty() {
        return Err(AuthError::validation("Please enter your email address."));
    }
    Email::parse(raw).map_err(|_| AuthError::validation("Please enter a valid email address."))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}
