//! Agency console: editing and status changes are scoped to the agency.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use okinawa_rentals_core::{AgencyId, Listing, ListingId, ListingStatus, UserRole};
use okinawa_rentals_integration_tests::{TestContext, location};

const STAFF: &str = "staff@chatanhomes.jp";

async fn agency_staff(ctx: &TestContext) -> AgencyId {
    let agency = ctx.seed_agency("chatan-homes", "Chatan Homes").await;
    ctx.register(STAFF).await;
    ctx.set_role(STAFF, UserRole::Agency, Some(&agency)).await;
    agency
}

fn owned(id: &str, title: &str, agency: Option<&AgencyId>) -> Listing {
    Listing {
        id: ListingId::new(id),
        title: title.to_string(),
        city: "chatan".to_string(),
        listing_type: Some("house".into()),
        price: 200_000,
        agency_id: agency.cloned(),
        ..Listing::default()
    }
}

#[tokio::test]
async fn test_edit_round_trip() {
    let ctx = TestContext::start().await;
    let agency = agency_staff(&ctx).await;
    let seeded = ctx
        .seed_listing(owned("araha", "Araha Beach House", Some(&agency)))
        .await;
    let created_at = ctx.listing(&seeded).await.created_at;

    let resp = ctx
        .client
        .get(ctx.url("/agency/listings/araha/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Araha Beach House"));

    let resp = ctx
        .client
        .post(ctx.url("/agency/listings/araha/edit"))
        .form(&[
            ("title", "Araha Ocean House"),
            ("price", "¥210,000"),
            ("listing_type", "house"),
            ("status", "active"),
            ("city", "Chatan"),
            ("bedrooms", "3"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(
        location(&resp),
        Some("/agency/listings?success=listing_updated")
    );

    let stored = ctx.listing(&seeded).await;
    assert_eq!(stored.title, "Araha Ocean House");
    assert_eq!(stored.price, 210_000);
    assert_eq!(stored.city, "chatan");
    assert_eq!(stored.bedrooms, 3);
    assert_eq!(stored.agency_id, Some(agency));
    assert_eq!(stored.created_at, created_at);
    assert!(stored.updated_at >= created_at);
}

#[tokio::test]
async fn test_invalid_edit_rerenders_form() {
    let ctx = TestContext::start().await;
    let agency = agency_staff(&ctx).await;
    let seeded = ctx
        .seed_listing(owned("araha", "Araha Beach House", Some(&agency)))
        .await;

    let resp = ctx
        .client
        .post(ctx.url("/agency/listings/araha/edit"))
        .form(&[("title", ""), ("price", "lots")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Title is required."));
    assert!(body.contains("Monthly rent must be a number."));

    assert_eq!(ctx.listing(&seeded).await.title, "Araha Beach House");
}

#[tokio::test]
async fn test_other_agency_listing_is_refused() {
    let ctx = TestContext::start().await;
    agency_staff(&ctx).await;
    let rival = ctx.seed_agency("ryukyu-realty", "Ryukyu Realty").await;
    let theirs = ctx
        .seed_listing(owned("goya", "Goya Condo", Some(&rival)))
        .await;

    let resp = ctx
        .client
        .get(ctx.url("/agency/listings/goya/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), Some("/agency/listings?error=not_owner"));

    let resp = ctx
        .client
        .post(ctx.url("/agency/listings/goya/status"))
        .form(&[("status", "rented")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(ctx.listing(&theirs).await.status, ListingStatus::Active);
}

#[tokio::test]
async fn test_status_change() {
    let ctx = TestContext::start().await;
    let agency = agency_staff(&ctx).await;
    let seeded = ctx
        .seed_listing(owned("araha", "Araha Beach House", Some(&agency)))
        .await;

    let resp = ctx
        .client
        .post(ctx.url("/agency/listings/araha/status"))
        .form(&[("status", "rented"), ("back", "/agency")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), Some("/agency?success=status_updated"));
    assert_eq!(ctx.listing(&seeded).await.status, ListingStatus::Rented);

    let resp = ctx
        .client
        .get(ctx.url("/agency/listings"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Araha Beach House"));
}
