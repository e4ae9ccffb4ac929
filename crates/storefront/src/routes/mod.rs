//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//! GET  /health/ready                 - Readiness (backend reachable)
//!
//! # Auth (credential endpoints rate limited per IP)
//! GET  /auth/login                   - Login page view model
//! POST /api/auth/login               - Login
//! POST /api/auth/register            - Customer registration
//! POST /api/auth/admin/register      - Admin registration
//! POST /api/auth/logout              - Logout
//! POST /api/auth/forgot-password     - Request reset email
//! POST /api/auth/reset-password      - Reset password
//! GET  /api/auth/session             - Current session
//! GET  /api/auth/availability        - Username/email availability
//!
//! # Catalog
//! GET  /api/books                    - Book listing
//! GET  /api/books/{id}               - Book detail
//!
//! # Account (login guard)
//! GET  /account                      - Account overview
//! GET  /api/account/profile          - Reload profile
//! PUT  /api/account/profile          - Update profile
//! POST /api/account/change-password  - Change password
//!
//! # Admin (admin guard)
//! GET  /admin                        - Admin overview
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod books;
pub mod health;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, require_admin, require_login};
use crate::state::AppState;

/// Create the auth API routes router.
///
/// Endpoints that accept credentials are rate limited per client IP.
pub fn auth_api_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/admin/register", post(auth::register_admin))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route_layer(auth_rate_limiter());

    Router::new()
        .merge(credentials)
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .route("/availability", get(auth::availability))
}

/// Create the catalog routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        .route("/{id}", get(books::show))
}

/// Create the account routes router, behind the login guard.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::index))
        .route(
            "/api/account/profile",
            get(account::profile).put(account::update_profile),
        )
        .route("/api/account/change-password", post(account::change_password))
        .route_layer(middleware::from_fn(require_login))
}

/// Create the admin routes router, behind the admin guard.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::index))
        .route_layer(middleware::from_fn(require_admin))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Login page
        .route("/auth/login", get(auth::login_page))
        // Auth API
        .nest("/api/auth", auth_api_routes())
        // Catalog
        .nest("/api/books", book_routes())
        // Guarded
        .merge(account_routes())
        .merge(admin_routes())
}
