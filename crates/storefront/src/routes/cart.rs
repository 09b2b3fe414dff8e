//! Cart handlers.
//!
//! The cart lives in the session and requires a signed-in user. Every
//! handler answers with the full cart summary so clients can re-render in
//! one round trip.

use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use sammys_market_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::{RequireAuth, load_cart, save_cart};
use crate::models::cart::{AddToCart, QuantityUpdate, UpdateQuantity};
use crate::models::{CartItem, CartSummary};
use crate::state::AppState;

/// Current cart with totals.
///
/// GET /cart
pub async fn show(_user: RequireAuth, session: Session) -> Result<Json<CartSummary>> {
    Ok(Json(load_cart(&session).await?.summary()))
}

/// Add a product, merging with an existing line.
///
/// POST /cart/items
#[instrument(skip(state, session, _user))]
pub async fn add(
    State(state): State<AppState>,
    _user: RequireAuth,
    session: Session,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartSummary>> {
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.in_stock() {
        return Err(AppError::Conflict(format!("{} is out of stock", product.name)));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(CartItem::from_product(&product, quantity));
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.to_string().as_str())]),
    );
    Ok(Json(cart.summary()))
}

/// Change a line's quantity. Quantities below one leave the cart unchanged.
///
/// PUT /cart/items/{product_id}
#[instrument(skip(session, _user))]
pub async fn update(
    _user: RequireAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    match cart.set_quantity(product_id, body.quantity) {
        QuantityUpdate::Updated => save_cart(&session, &cart).await?,
        QuantityUpdate::Ignored => {}
        QuantityUpdate::NotInCart => {
            return Err(AppError::NotFound("Item is not in the cart".to_string()));
        }
    }
    Ok(Json(cart.summary()))
}

/// Remove a line (no-op when absent).
///
/// DELETE /cart/items/{product_id}
#[instrument(skip(session, _user))]
pub async fn remove(
    _user: RequireAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(cart.summary()))
}

/// Empty the cart.
///
/// DELETE /cart
pub async fn clear(_user: RequireAuth, session: Session) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(cart.summary()))
}
