//! Bearer-token injection for outgoing backend requests.
//!
//! Every request the storefront sends to the bookstore backend passes
//! through [`AuthInterceptor::intercept`] on the way out and
//! [`AuthInterceptor::on_response`] on the way back.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, StatusCode};

use crate::models::AccessToken;
use crate::session::TokenStore;

/// Backend paths that never receive credentials.
///
/// Matched as plain substrings of the full request URL.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/admin/register",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/users/usernames",
    "/users/emails",
];

/// Catalog browsing is public...
const CATALOG_PATH: &str = "/books";
/// ...but its admin-prefixed sibling is not.
const ADMIN_CATALOG_PATH: &str = "/admin/books";

/// The allowlist of public backend endpoints.
#[derive(Debug, Clone)]
pub struct PublicEndpoints {
    patterns: Vec<String>,
}

impl Default for PublicEndpoints {
    fn default() -> Self {
        Self::new(PUBLIC_ENDPOINTS.iter().map(|p| (*p).to_string()))
    }
}

impl PublicEndpoints {
    /// Allowlist from explicit substring patterns. The catalog rule always
    /// applies in addition to these.
    fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    /// Whether `url` targets a public endpoint.
    #[must_use]
    pub fn is_public(&self, url: &str) -> bool {
        if self.patterns.iter().any(|p| url.contains(p.as_str())) {
            return true;
        }
        url.contains(CATALOG_PATH) && !url.contains(ADMIN_CATALOG_PATH)
    }
}

/// Attaches bearer credentials to outgoing requests and purges them when
/// the backend rejects them.
#[derive(Debug, Clone, Default)]
pub struct AuthInterceptor {
    public: PublicEndpoints,
}

impl AuthInterceptor {
    /// Add `Authorization: Bearer <token>` unless the request is public or
    /// there is no token.
    ///
    /// A missing token is not an error: the request goes out unauthenticated
    /// and the backend decides.
    #[must_use]
    pub fn intercept(&self, mut request: Request, token: Option<&AccessToken>) -> Request {
        if self.public.is_public(request.url().as_str()) {
            return request;
        }
        let Some(token) = token else {
            return request;
        };

        match HeaderValue::from_str(&token.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(
                    url = %request.url(),
                    "Stored access token is not a valid header value; sending without it"
                );
            }
        }
        request
    }

    /// React to a backend response. A 401 clears every stored token and
    /// profile; nothing else happens here, the error still reaches the caller.
    pub async fn on_response(&self, status: StatusCode, tokens: Option<&TokenStore>) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }
        let Some(tokens) = tokens else {
            return;
        };

        tracing::info!("Backend rejected credentials; clearing stored tokens");
        if let Err(e) = tokens.clear().await {
            tracing::error!(error = %e, "Failed to clear stored tokens after 401");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::{Method, Url};

    use super::*;
    use crate::session::token_store::tests::{memory_token_store, sample_customer};

    fn request(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).unwrap())
    }

    fn auth_header(request: &Request) -> Option<&str> {
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_public_endpoints_never_get_credentials() {
        let interceptor = AuthInterceptor::default();
        let token = AccessToken::new("t1");

        for url in [
            "http://api.test/auth/login",
            "http://api.test/auth/register",
            "http://api.test/auth/admin/register",
            "http://api.test/auth/forgot-password",
            "http://api.test/users/usernames",
            "http://api.test/books?page=2",
            "http://api.test/books/7",
        ] {
            let out = interceptor.intercept(request(url), Some(&token));
            assert_eq!(auth_header(&out), None, "{url} carried credentials");
        }
    }

    #[test]
    fn test_admin_catalog_is_not_public() {
        let interceptor = AuthInterceptor::default();
        let token = AccessToken::new("t1");
        let out = interceptor.intercept(request("http://api.test/admin/books/7"), Some(&token));
        assert_eq!(auth_header(&out), Some("Bearer t1"));
    }

    #[test]
    fn test_protected_endpoint_gets_bearer_iff_token_present() {
        let interceptor = AuthInterceptor::default();

        let out = interceptor.intercept(
            request("http://api.test/users/profile"),
            Some(&AccessToken::new("t1")),
        );
        assert_eq!(auth_header(&out), Some("Bearer t1"));
        assert!(out.headers().get(AUTHORIZATION).unwrap().is_sensitive());

        let out = interceptor.intercept(request("http://api.test/users/profile"), None);
        assert_eq!(auth_header(&out), None);
    }

    #[test]
    fn test_logout_is_not_mistaken_for_login() {
        let endpoints = PublicEndpoints::default();
        assert!(endpoints.is_public("http://api.test/auth/login"));
        assert!(!endpoints.is_public("http://api.test/auth/logout"));
    }

    #[test]
    fn test_invalid_header_token_is_dropped() {
        let interceptor = AuthInterceptor::default();
        let out = interceptor.intercept(
            request("http://api.test/users/profile"),
            Some(&AccessToken::new("bad\ntoken")),
        );
        assert_eq!(auth_header(&out), None);
    }

    #[test]
    fn test_custom_allowlist_keeps_catalog_rule() {
        let endpoints = PublicEndpoints::new(vec!["/health".to_string()]);
        assert!(endpoints.is_public("http://api.test/health"));
        assert!(endpoints.is_public("http://api.test/books"));
        assert!(!endpoints.is_public("http://api.test/auth/login"));
    }

    #[tokio::test]
    async fn test_unauthorized_response_clears_tokens() {
        let tokens = memory_token_store();
        tokens
            .set_tokens(&AccessToken::new("t1"), None)
            .await
            .unwrap();
        tokens.set_customer(&sample_customer()).await.unwrap();

        let interceptor = AuthInterceptor::default();
        interceptor
            .on_response(StatusCode::FORBIDDEN, Some(&tokens))
            .await;
        assert!(tokens.access_token().await.unwrap().is_some());

        interceptor
            .on_response(StatusCode::UNAUTHORIZED, Some(&tokens))
            .await;
        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.customer().await.unwrap().is_none());
    }
}
