//! Seller dashboard handlers: inventory, fulfilment and sales analytics.
//!
//! Every handler requires a seller or admin. Listings are scoped to the
//! caller; another seller's product is reported as missing.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use sammys_market_core::{OrderItemId, ProductId};

use crate::db::{
    AnalyticsRepository, CategoryRepository, OrderRepository, ProductRepository, RepositoryError,
};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireSeller;
use crate::models::Product;
use crate::models::analytics::SellerAnalytics;
use crate::models::order::{SellerOrder, StatusChange, StatusUpdate};
use crate::models::product::{ProductInput, ValidProduct};
use crate::state::AppState;

/// Validate listing input, including that the category exists.
async fn validate_listing(state: &AppState, input: &ProductInput) -> Result<ValidProduct> {
    let listing = input.validate().map_err(AppError::BadRequest)?;
    if let Some(category_id) = listing.category_id
        && !CategoryRepository::new(state.pool())
            .exists(category_id)
            .await?
    {
        return Err(AppError::BadRequest("Unknown category".to_string()));
    }
    Ok(listing)
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// The caller's listings, newest first.
///
/// GET /seller/products
pub async fn products(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_by_seller(user.id)
        .await?;
    Ok(Json(products))
}

/// Create a listing.
///
/// POST /seller/products
#[instrument(skip(state, user, body), fields(seller_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let listing = validate_listing(&state, &body).await?;
    let product = ProductRepository::new(state.pool())
        .create(user.id, &listing)
        .await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a listing's fields.
///
/// PUT /seller/products/{id}
#[instrument(skip(state, user, body), fields(seller_id = %user.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>> {
    let listing = validate_listing(&state, &body).await?;
    let product = ProductRepository::new(state.pool())
        .update(user.id, id, &listing)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    Ok(Json(product))
}

/// Delete a listing.
///
/// DELETE /seller/products/{id}
#[instrument(skip(state, user), fields(seller_id = %user.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(user.id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Orders containing the caller's products.
///
/// GET /seller/orders
pub async fn orders(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<Json<Vec<SellerOrder>>> {
    let orders = OrderRepository::new(state.pool())
        .seller_orders(user.id)
        .await?;
    Ok(Json(orders))
}

/// Move one of the caller's order items forward.
///
/// PUT /seller/order-items/{id}/status
#[instrument(skip(state, user), fields(seller_id = %user.id))]
pub async fn update_item_status(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderItemId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<StatusChange>> {
    let change = OrderRepository::new(state.pool())
        .update_item_status(user.id, id, body.status)
        .await?;
    tracing::info!(
        item_id = %change.item_id,
        status = %change.status,
        order_status = %change.order_status,
        "Order item status changed"
    );
    Ok(Json(change))
}

/// Sales figures for the caller's products.
///
/// GET /seller/analytics
pub async fn analytics(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<Json<SellerAnalytics>> {
    let products = ProductRepository::new(state.pool())
        .list_by_seller(user.id)
        .await?;
    let sales = AnalyticsRepository::new(state.pool())
        .seller_sales(user.id)
        .await?;
    let categories = state.categories().await?;

    Ok(Json(SellerAnalytics::compute(
        &products,
        &categories,
        &sales,
    )))
}
