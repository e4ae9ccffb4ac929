//! Route guards as seen by a browser.

#![allow(clippy::unwrap_used)]

use bookstore_integration_tests::{HttpStatus, PASSWORD, TestContext};

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn return_url(location: &str) -> Option<String> {
    let query = location.split_once('?')?.1;
    url_pairs(query)
        .into_iter()
        .find(|(key, _)| key == "returnUrl")
        .map(|(_, value)| value)
}

fn url_pairs(query: &str) -> Vec<(String, String)> {
    reqwest::Url::parse(&format!("http://localhost/?{query}"))
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login_with_return_url() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .get(ctx.url("/account?tab=orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), HttpStatus::SEE_OTHER);

    let location = location(&response);
    assert!(location.starts_with("/auth/login?"));
    assert_eq!(return_url(&location).as_deref(), Some("/account?tab=orders"));
}

#[tokio::test]
async fn test_return_url_round_trips_through_login() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    let target = return_url(&location(&response)).unwrap();

    let body: serde_json::Value = ctx
        .client
        .post(ctx.url("/api/auth/login"))
        .json(&serde_json::json!({
            "identifier": "ada",
            "password": PASSWORD,
            "returnUrl": target
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["redirectTo"], "/account");

    let response = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert_eq!(response.status(), HttpStatus::OK);
}

#[tokio::test]
async fn test_guarded_api_answers_401_instead_of_redirecting() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/api/account/change-password"))
        .json(&serde_json::json!({
            "currentPassword": PASSWORD,
            "newPassword": "password2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), HttpStatus::UNAUTHORIZED);
    assert!(ctx.seen().is_empty());
}

#[tokio::test]
async fn test_customer_is_refused_admin_area() {
    let ctx = TestContext::new().await;
    ctx.login("ada", PASSWORD).await;

    let response = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(response.status(), HttpStatus::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_enters_both_areas() {
    let ctx = TestContext::new().await;
    ctx.login("admin@test.com", PASSWORD).await;

    let response = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(response.status(), HttpStatus::OK);

    let response = ctx.client.get(ctx.url("/account")).send().await.unwrap();
    assert_eq!(response.status(), HttpStatus::OK);
}
