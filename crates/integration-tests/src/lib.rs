//! Integration tests for the bookstore storefront.
//!
//! Each test gets its own [`TestContext`]: a fake bookstore backend and a
//! storefront wired to it, both listening on ephemeral local ports, plus a
//! browser-like client that keeps the session cookie between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bookstore-integration-tests
//! ```
//!
//! # Fake backend accounts
//!
//! | Identifier       | Password    | Role     |
//! |------------------|-------------|----------|
//! | `ada`            | `password1` | customer |
//! | `admin@test.com` | `password1` | admin    |
//!
//! Anything else is rejected with 401. `POST /auth/logout` always fails,
//! and `GET /users/profile` only accepts the customer's token.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bookstore_storefront::config::{BackendConfig, StorefrontConfig};
use bookstore_storefront::state::AppState;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

pub use reqwest::StatusCode as HttpStatus;

/// Password accepted for every fake account.
pub const PASSWORD: &str = "password1";

// =============================================================================
// Fake backend
// =============================================================================

/// A request the fake backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub path: String,
    /// Raw `Authorization` header, if one was sent.
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct Backend {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    customer_token: String,
    admin_token: String,
}

impl Backend {
    fn record(&self, path: &str, headers: &HeaderMap) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        self.seen
            .lock()
            .expect("seen lock poisoned")
            .push(SeenRequest {
                path: path.to_string(),
                authorization,
            });
    }
}

/// A JWT-shaped token for `subject` that expires in an hour.
///
/// Only the payload matters to the storefront; the signature is filler.
#[must_use]
pub fn jwt_for(subject: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({ "sub": subject, "exp": chrono::Utc::now().timestamp() + 3600 });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

fn customer_json() -> Value {
    json!({
        "id": 1,
        "fullName": "Ada Reader",
        "username": "ada",
        "email": "ada@example.com",
        "mobileNumber": "5550100",
        "role": "CUSTOMER"
    })
}

fn admin_json() -> Value {
    json!({
        "id": 2,
        "username": "admin",
        "email": "admin@test.com",
        "userRole": "ADMIN"
    })
}

async fn login(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record("/auth/login", &headers);

    let user = match (body["identifier"].as_str(), body["password"].as_str()) {
        (Some("ada"), Some(PASSWORD)) => Some((customer_json(), &backend.customer_token)),
        (Some("admin@test.com"), Some(PASSWORD)) => Some((admin_json(), &backend.admin_token)),
        _ => None,
    };

    match user {
        Some((user, token)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "user": user,
                "accessToken": token,
                "refreshToken": "refresh"
            })),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        ),
    }
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> StatusCode {
    backend.record("/auth/logout", &headers);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn profile(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.record("/users/profile", &headers);

    let expected = format!("Bearer {}", backend.customer_token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if authorized {
        (StatusCode::OK, Json(json!({ "data": customer_json() })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Token rejected" })),
        )
    }
}

async fn books(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.record("/books", &headers);
    Json(json!({
        "content": [
            { "id": 7, "title": "The Rust Programming Language", "author": "Klabnik", "price": "39.95" }
        ],
        "totalElements": 1,
        "number": 0,
        "size": 12
    }))
}

async fn usernames(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.record("/users/usernames", &headers);
    Json(json!(["ada", "admin"]))
}

// =============================================================================
// Test context
// =============================================================================

/// A storefront, its fake backend, and a browser pointed at the storefront.
pub struct TestContext {
    /// Keeps cookies; never follows redirects.
    pub client: reqwest::Client,
    pub storefront_url: String,
    backend: Backend,
}

impl TestContext {
    /// Start a fake backend and a storefront wired to it.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn new() -> Self {
        let backend = Backend {
            seen: Arc::default(),
            customer_token: jwt_for("ada"),
            admin_token: jwt_for("admin"),
        };

        let backend_app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/users/profile", get(profile))
            .route("/users/usernames", get(usernames))
            .route("/books", get(books))
            .with_state(backend.clone());
        let backend_url = serve(backend_app).await;

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            base_url: "http://localhost".to_string(),
            database_url: None,
            api: BackendConfig::with_base_url(&backend_url).expect("valid backend URL"),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config).expect("backend client");
        let storefront_url = serve(bookstore_storefront::app(state, MemoryStore::default())).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            client,
            storefront_url,
            backend,
        }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// The access token the fake backend issues to `ada`.
    #[must_use]
    pub fn customer_token(&self) -> &str {
        &self.backend.customer_token
    }

    /// The access token the fake backend issues to `admin@test.com`.
    #[must_use]
    pub fn admin_token(&self) -> &str {
        &self.backend.admin_token
    }

    /// Every request the backend has received so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if a backend handler panicked while recording.
    #[must_use]
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.backend.seen.lock().expect("seen lock poisoned").clone()
    }

    /// The most recent request the backend received for `path`.
    #[must_use]
    pub fn last_seen(&self, path: &str) -> Option<SeenRequest> {
        self.seen().into_iter().rev().find(|r| r.path == path)
    }

    /// Forget recorded backend requests.
    ///
    /// # Panics
    ///
    /// Panics if a backend handler panicked while recording.
    pub fn reset_seen(&self) {
        self.backend.seen.lock().expect("seen lock poisoned").clear();
    }

    /// Log in through the storefront and return its JSON answer.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be reached or answers with non-JSON.
    pub async fn login(&self, identifier: &str, password: &str) -> (HttpStatus, Value) {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await
            .expect("login request");
        let status = response.status();
        (status, response.json().await.expect("login body"))
    }

    /// The storefront's view of this browser's session.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be reached or answers with non-JSON.
    pub async fn session(&self) -> Value {
        self.client
            .get(self.url("/api/auth/session"))
            .send()
            .await
            .expect("session request")
            .json()
            .await
            .expect("session body")
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}
