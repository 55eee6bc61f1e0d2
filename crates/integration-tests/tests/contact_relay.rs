//! The JSON contact relay.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use okinawa_rentals_integration_tests::TestContext;

#[tokio::test]
async fn test_invalid_submission_is_rejected() {
    let ctx = TestContext::start().await;
    let resp = ctx
        .client
        .post(ctx.url("/api/contact"))
        .json(&json!({ "name": "Sam", "email": "not-an-email", "subject": "Hi", "message": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_relay_without_smtp_is_unavailable() {
    let ctx = TestContext::start().await;
    let resp = ctx
        .client
        .post(ctx.url("/api/contact"))
        .json(&json!({
            "name": "Sam",
            "email": "sam@example.com",
            "subject": "Viewing",
            "message": "Is the Araha house still available?",
            "agencyId": "chatan-homes"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}
