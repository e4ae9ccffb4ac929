//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (per-request hub, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions, memory or `PostgreSQL` store)
//! 6. Auth context (token store + hydrated session state per request)
//! 7. Per route group: rate limiting on credential endpoints, route guards
//!    (`require_login` / `require_admin`)

pub mod auth;
pub mod guard;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthContext, session_context_middleware};
pub use guard::{
    GuardRejection, can_enter, login_redirect_url, require_admin, require_login, safe_return_url,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
