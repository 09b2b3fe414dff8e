//! Checkout handler.
//!
//! Payment is simulated: card details are sanity-checked when present and
//! never stored or charged.

use axum::{extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::{RequireAuth, load_cart, save_cart};
use crate::models::order::{CheckoutRequest, OrderConfirmation};
use crate::state::AppState;

/// Place an order for the cart.
///
/// POST /checkout
#[instrument(skip(state, session, user, body), fields(buyer_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let mut cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }

    let shipping = body.shipping.validate().map_err(AppError::BadRequest)?;
    if let Some(payment) = &body.payment {
        payment.validate().map_err(AppError::BadRequest)?;
    }

    let confirmation = OrderRepository::new(state.pool())
        .place_order(user.id, cart.items(), &shipping)
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", confirmation.order_id.to_string().as_str())]),
    );
    tracing::info!(
        order_id = %confirmation.order_id,
        total = %confirmation.total,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(confirmation)))
}
