//! Product catalog handlers.

use axum::extract::State;
use tracing::instrument;

use sammys_market_core::ProductId;

use crate::db::{ProductRepository, ProfileRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::product::ProductQuery;
use crate::models::{Product, ProductDetail, ProductPage, ReviewSummary};
use crate::state::AppState;

/// Products shown under "You may also like".
const RELATED_LIMIT: i64 = 4;

/// Filtered, paginated product listing, newest first.
///
/// GET /products?q=&category=&price=&min_price=&max_price=&page=&per_page=
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let filter = query.filter().map_err(AppError::BadRequest)?;
    let pagination = query.pagination();

    let (products, total) = ProductRepository::new(state.pool())
        .search(&filter, pagination)
        .await?;

    Ok(Json(ProductPage::new(products, pagination, total)))
}

/// Product page: product, seller, reviews and their summary.
///
/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let seller = ProfileRepository::new(state.pool())
        .seller_summary(product.seller_id)
        .await?;
    let reviews = ReviewRepository::new(state.pool()).for_product(id).await?;

    Ok(Json(ProductDetail {
        product,
        seller,
        review_summary: ReviewSummary::from_reviews(&reviews),
        reviews,
    }))
}

/// Other products to suggest: same category first, then newest.
///
/// GET /products/{id}/related
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool());
    let product = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(products.related(&product, RELATED_LIMIT).await?))
}
