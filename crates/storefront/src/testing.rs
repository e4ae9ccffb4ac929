//! In-process stand-in for the bookstore backend, shared by unit tests.
//!
//! Login identifiers select the canned response:
//!
//! - `admin@test.com`: admin with access token `t1`
//! - `root@test.com`: admin, accepted without any token
//! - `ada`: customer with a JWT access token and refresh token `r1`
//! - `dual`: customer whose envelope carries both `user` and `data`, and
//!   both `accessToken` and `token`
//! - `nobody`: refused with `success: false`
//! - anything else: 401

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::api::BackendClient;
use crate::config::BackendConfig;
use crate::models::token::tests::jwt_expiring_in;

/// Authorization headers seen by the fake backend, by path.
pub type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

fn record(seen: &Seen, path: &str, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    seen.lock().unwrap().push((path.to_string(), auth));
}

async fn login(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&seen, "/auth/login", &headers);
    let reply = match body["identifier"].as_str() {
        Some("admin@test.com") => json!({
            "success": true,
            "user": { "id": 2, "username": "admin", "email": "admin@test.com", "userRole": "ADMIN" },
            "accessToken": "t1"
        }),
        Some("root@test.com") => json!({
            "success": true,
            "user": { "id": 3, "username": "root", "email": "root@test.com", "userRole": "ADMIN" }
        }),
        Some("ada") => json!({
            "success": true,
            "user": { "id": 1, "fullName": "Ada Reader", "username": "ada", "role": "CUSTOMER" },
            "accessToken": jwt_expiring_in(600),
            "refreshToken": "r1"
        }),
        Some("dual") => json!({
            "success": true,
            "user": { "id": 4, "fullName": "Dual Reader", "name": "Shadow", "username": "dual" },
            "data": { "id": 5, "username": "shadow" },
            "accessToken": "t3",
            "token": "stale"
        }),
        Some("nobody") => json!({ "success": false, "message": "Account disabled" }),
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Invalid username or password" } })),
            );
        }
    };
    (StatusCode::OK, Json(reply))
}

async fn logout(State(seen): State<Seen>, headers: HeaderMap) -> StatusCode {
    record(&seen, "/auth/logout", &headers);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn profile(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    record(&seen, "/users/profile", &headers);
    if headers.get("authorization").is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({ "data": { "id": 1, "fullName": "Ada Lovelace", "username": "ada" } })),
    )
}

async fn update_profile(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": { "id": 1, "fullName": body["fullName"], "username": "ada", "email": body["email"] }
    }))
}

async fn change_password(State(seen): State<Seen>, headers: HeaderMap) -> StatusCode {
    record(&seen, "/users/change-password", &headers);
    StatusCode::UNAUTHORIZED
}

async fn usernames() -> Json<Value> {
    Json(json!(["Ada", "admin"]))
}

async fn emails() -> Json<Value> {
    Json(json!({ "data": ["ada@example.com"] }))
}

/// Serve the fake backend on an ephemeral port and return a client for it.
pub async fn spawn_backend() -> (BackendClient, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/users/profile", get(profile).put(update_profile))
        .route("/users/change-password", post(change_password))
        .route("/users/usernames", get(usernames))
        .route("/users/emails", get(emails))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = BackendConfig::with_base_url(&format!("http://{addr}")).unwrap();
    (BackendClient::new(&config).unwrap(), seen)
}

/// A client whose backend is never reached.
pub fn offline_client() -> BackendClient {
    let config = BackendConfig::with_base_url("http://127.0.0.1:9").unwrap();
    BackendClient::new(&config).unwrap()
}
