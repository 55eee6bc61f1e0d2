//! Role-gated pages redirect instead of rendering.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use okinawa_rentals_core::UserRole;
use okinawa_rentals_integration_tests::{TestContext, location};

#[tokio::test]
async fn test_anonymous_user_is_sent_to_login() {
    let ctx = TestContext::start().await;
    for path in ["/dashboard", "/agency", "/admin", "/list-a-rental"] {
        let resp = ctx.client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/auth/login"), "{path}");
    }
}

#[tokio::test]
async fn test_user_role_is_sent_to_dashboard() {
    let ctx = TestContext::start().await;
    ctx.register("renter@example.com").await;

    for path in ["/agency", "/admin", "/list-a-rental"] {
        let resp = ctx.client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/dashboard"), "{path}");
    }

    let resp = ctx.client.get(ctx.url("/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_role_change_applies_on_next_request() {
    let ctx = TestContext::start().await;
    ctx.register("staff@example.com").await;

    let resp = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(location(&resp), Some("/dashboard"));

    ctx.set_role("staff@example.com", UserRole::Admin, None).await;
    let resp = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::start().await;
    ctx.register("renter@example.com").await;

    let resp = ctx.client.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(location(&resp), Some("/auth/login?success=signed_out"));

    let resp = ctx.client.get(ctx.url("/dashboard")).send().await.unwrap();
    assert_eq!(location(&resp), Some("/auth/login"));
}

#[tokio::test]
async fn test_sessions_are_per_client() {
    let ctx = TestContext::start().await;
    ctx.register("renter@example.com").await;

    let resp = ctx
        .anonymous_client()
        .get(ctx.url("/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), Some("/auth/login"));
}
