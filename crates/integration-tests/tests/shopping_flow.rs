//! Integration tests for the signed-in shopping flow.
//!
//! These tests require everything `public_api` needs, plus
//! `MARKET_TEST_ACCESS_TOKEN` holding an auth provider access token for a
//! customer account. Without it they return early.
//!
//! Run with: cargo test -p sammys-market-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use sammys_market_core::UserRole;
use sammys_market_integration_tests::{TestContext, json_body};

/// First in-stock product from the catalog.
async fn in_stock_product(ctx: &TestContext) -> Value {
    let body = json_body(ctx.get("/products?per_page=50").await).await;
    body["products"]
        .as_array()
        .expect("products array")
        .iter()
        .find(|p| p["stock"].as_i64().unwrap_or(0) > 0)
        .cloned()
        .expect("seeded catalog has an in-stock product")
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_ACCESS_TOKEN"]
async fn test_session_user() {
    let Some(ctx) = TestContext::signed_in().await else {
        return;
    };

    let body = json_body(ctx.get("/auth/me").await).await;
    let role: UserRole = serde_json::from_value(body["role"].clone()).expect("role");
    assert_ne!(role, UserRole::Admin);

    let resp = ctx.delete("/auth/session").await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx.get("/auth/me").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_ACCESS_TOKEN"]
async fn test_cart_merges_and_totals() {
    let Some(ctx) = TestContext::signed_in().await else {
        return;
    };
    ctx.delete("/cart").await;

    let product = in_stock_product(&ctx).await;
    let add = json!({ "product_id": product["id"], "quantity": 1 });
    ctx.post("/cart/items", &add).await;
    let resp = ctx.post("/cart/items", &add).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cart = json_body(resp).await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["item_count"], 2);

    let resp = ctx.delete("/cart").await;
    assert_eq!(json_body(resp).await["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_ACCESS_TOKEN"]
async fn test_checkout_places_order() {
    let Some(ctx) = TestContext::signed_in().await else {
        return;
    };
    ctx.delete("/cart").await;

    let resp = ctx
        .post("/checkout", &json!({ "shipping": shipping() }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "empty cart");

    let product = in_stock_product(&ctx).await;
    ctx.post(
        "/cart/items",
        &json!({ "product_id": product["id"], "quantity": 1 }),
    )
    .await;

    let resp = ctx
        .post("/checkout", &json!({ "shipping": shipping() }))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let confirmation = json_body(resp).await;
    let order_id = confirmation["order_id"].as_str().expect("order id");

    let resp = ctx.get(&format!("/orders/{order_id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "pending");

    let cart = json_body(ctx.get("/cart").await).await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_ACCESS_TOKEN"]
async fn test_pending_items_cannot_be_reviewed() {
    let Some(ctx) = TestContext::signed_in().await else {
        return;
    };

    let product = in_stock_product(&ctx).await;
    ctx.post(
        "/cart/items",
        &json!({ "product_id": product["id"], "quantity": 1 }),
    )
    .await;
    let confirmation = json_body(
        ctx.post("/checkout", &json!({ "shipping": shipping() }))
            .await,
    )
    .await;

    let resp = ctx
        .post(
            "/reviews",
            &json!({
                "order_id": confirmation["order_id"],
                "product_id": product["id"],
                "rating": 5,
                "comment": "Beautiful work"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn shipping() -> Value {
    json!({
        "full_name": "Tendai Moyo",
        "address": "14 Samora Machel Ave",
        "city": "Harare",
        "state": "Harare",
        "zip": "00263",
        "country": "Zimbabwe"
    })
}
