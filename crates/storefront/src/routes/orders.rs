//! Purchase history handlers.

use axum::extract::State;

use sammys_market_core::OrderId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::order::{OrderDetail, PurchasedItem};
use crate::state::AppState;

/// Everything the caller has bought, shipped items first.
///
/// GET /orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<PurchasedItem>>> {
    let items = OrderRepository::new(state.pool())
        .purchased_items(user.id)
        .await?;
    Ok(Json(items))
}

/// One of the caller's orders. Other buyers' orders are reported as missing.
///
/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get_for_buyer(user.id, id)
        .await?;
    Ok(Json(order))
}
