//! Bearer token types.
//!
//! Tokens are opaque to the storefront except for the expiry claim, which is
//! read locally to skip obviously stale tokens before a network call. The
//! signature is never checked; the backend remains the authority.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// An access token issued by the auth service.
///
/// Wraps the raw string in a [`SecretString`] so it is redacted from
/// `Debug` output and never ends up in logs.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Wrap a raw bearer string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The raw bearer string.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }

    /// The `exp` claim, if the token is JWT-shaped and carries one.
    ///
    /// Returns `None` when the token does not have exactly three
    /// dot-separated segments, the payload is not base64url JSON, or the
    /// claim is missing or not numeric.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let mut segments = self.expose().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return None;
        };

        // Some issuers keep the padding; the no-pad engine rejects it.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.as_object()?.get("exp")?;

        #[allow(clippy::cast_possible_truncation)] // fractional seconds are dropped
        let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// Local, non-authoritative validity check against `now`.
    #[must_use]
    pub fn is_structurally_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp > now)
    }

    /// [`Self::is_structurally_valid_at`] against the current time.
    #[must_use]
    pub fn is_structurally_valid(&self) -> bool {
        self.is_structurally_valid_at(Utc::now())
    }
}

impl From<String> for AccessToken {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned JWT-shaped token with the given payload JSON.
    pub(crate) fn jwt_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{header}.{body}.signature")
    }

    /// Build a token expiring `offset_secs` from now.
    pub(crate) fn jwt_expiring_in(offset_secs: i64) -> String {
        let exp = Utc::now().timestamp() + offset_secs;
        jwt_with_payload(&format!(r#"{{"sub":"1","exp":{exp}}}"#))
    }

    #[test]
    fn test_future_exp_is_valid() {
        let token = AccessToken::new(jwt_expiring_in(3600));
        assert!(token.is_structurally_valid());
    }

    #[test]
    fn test_past_exp_is_invalid() {
        let token = AccessToken::new(jwt_expiring_in(-60));
        assert!(!token.is_structurally_valid());
    }

    #[test]
    fn test_exp_is_compared_against_given_time() {
        let token = AccessToken::new(jwt_with_payload(r#"{"exp":1700000000}"#));
        let before = DateTime::from_timestamp(1_699_999_999, 0).unwrap_or_default();
        let after = DateTime::from_timestamp(1_700_000_001, 0).unwrap_or_default();
        assert!(token.is_structurally_valid_at(before));
        assert!(!token.is_structurally_valid_at(after));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":4102444800}"#);
        let token = AccessToken::new(format!("{header}.{body}.sig"));
        assert!(token.expires_at().is_some());
    }

    #[test]
    fn test_malformed_tokens_are_invalid() {
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"not json"));
        let not_object = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"[1,2,3]"));
        for raw in [
            "",
            "t1",
            "a.b",
            "a.b.c.d",
            "header.!!!not-base64!!!.sig",
            not_json.as_str(),
            not_object.as_str(),
        ] {
            let token = AccessToken::new(raw);
            assert!(!token.is_structurally_valid(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_missing_or_non_numeric_exp_is_invalid() {
        let token = AccessToken::new(jwt_with_payload(r#"{"sub":"1"}"#));
        assert!(!token.is_structurally_valid());

        let token = AccessToken::new(jwt_with_payload(r#"{"exp":"tomorrow"}"#));
        assert!(!token.is_structurally_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("super-secret-token");
        assert!(!format!("{token:?}").contains("super-secret-token"));
        assert_eq!(token.bearer(), "Bearer super-secret-token");
    }
}
