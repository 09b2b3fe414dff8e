//! Integration tests for the seller dashboard.
//!
//! These tests need two seller accounts (`MARKET_TEST_SELLER_TOKEN` and
//! `MARKET_TEST_OTHER_SELLER_TOKEN`). The fulfilment test also needs the
//! customer token `MARKET_TEST_ACCESS_TOKEN` to place an order.
//!
//! Run with: cargo test -p sammys-market-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use sammys_market_integration_tests::{TestContext, json_body};

const SELLER_TOKEN: &str = "MARKET_TEST_SELLER_TOKEN";
const OTHER_SELLER_TOKEN: &str = "MARKET_TEST_OTHER_SELLER_TOKEN";

fn listing(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Hand-carved serpentine",
        "price": "35.00",
        "stock": 5
    })
}

/// Create a listing as `ctx` and return its id.
async fn create_listing(ctx: &TestContext, name: &str) -> String {
    let resp = ctx.post("/seller/products", &listing(name)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["id"]
        .as_str()
        .expect("product id")
        .to_string()
}

#[tokio::test]
#[ignore = "Requires running server and two seller tokens"]
async fn test_other_sellers_products_are_not_found() {
    let Some(seller) = TestContext::signed_in_as(SELLER_TOKEN).await else {
        return;
    };
    let Some(other) = TestContext::signed_in_as(OTHER_SELLER_TOKEN).await else {
        return;
    };

    let id = create_listing(&seller, &format!("Stone Owl {}", Uuid::new_v4())).await;
    let path = format!("/seller/products/{id}");

    let resp = other.put(&path, &listing("Borrowed Owl")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "Product not found");

    let resp = other.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = seller.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_SELLER_TOKEN"]
async fn test_unknown_category_is_rejected() {
    let Some(seller) = TestContext::signed_in_as(SELLER_TOKEN).await else {
        return;
    };

    let mut body = listing("Stone Heron");
    body["category_id"] = json!(Uuid::new_v4());
    let resp = seller.post("/seller/products", &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "Unknown category");
}

#[tokio::test]
#[ignore = "Requires running server and MARKET_TEST_SELLER_TOKEN"]
async fn test_price_above_column_limit_is_rejected() {
    let Some(seller) = TestContext::signed_in_as(SELLER_TOKEN).await else {
        return;
    };

    let mut body = listing("Gold Leopard");
    body["price"] = json!("100000000.00");
    let resp = seller.post("/seller/products", &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server, MARKET_TEST_SELLER_TOKEN and MARKET_TEST_ACCESS_TOKEN"]
async fn test_fulfilment_moves_forward_only() {
    let Some(seller) = TestContext::signed_in_as(SELLER_TOKEN).await else {
        return;
    };
    let Some(buyer) = TestContext::signed_in().await else {
        return;
    };

    let product_id = create_listing(&seller, &format!("Stone Kudu {}", Uuid::new_v4())).await;
    buyer.delete("/cart").await;
    buyer
        .post(
            "/cart/items",
            &json!({ "product_id": product_id, "quantity": 1 }),
        )
        .await;
    let resp = buyer
        .post(
            "/checkout",
            &json!({
                "shipping": {
                    "full_name": "Rudo Ncube",
                    "address": "3 Jason Moyo St",
                    "city": "Bulawayo",
                    "state": "Bulawayo",
                    "zip": "00263",
                    "country": "Zimbabwe"
                }
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let orders = json_body(seller.get("/seller/orders").await).await;
    let item_id = orders
        .as_array()
        .expect("orders array")
        .iter()
        .flat_map(|order| order["items"].as_array().cloned().unwrap_or_default())
        .find(|item| item["product_id"] == product_id.as_str())
        .and_then(|item| item["id"].as_str().map(String::from))
        .expect("seller sees the new order item");
    let path = format!("/seller/order-items/{item_id}/status");

    let resp = seller.put(&path, &json!({ "status": "shipped" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let change = json_body(resp).await;
    assert_eq!(change["status"], "shipped");
    assert!(change["shipped_at"].is_string(), "shipped_at is stamped");

    let resp = seller.put(&path, &json!({ "status": "shipped" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "same status");

    let resp = seller.put(&path, &json!({ "status": "processing" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "backward move");
}
