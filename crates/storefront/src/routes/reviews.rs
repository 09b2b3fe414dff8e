//! Review handlers.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::Review;
use crate::models::review::NewReview;
use crate::state::AppState;

/// Review a purchased product once its line has shipped.
///
/// POST /reviews
#[instrument(skip(state, user), fields(buyer_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = body.validate().map_err(AppError::BadRequest)?;
    let reviews = ReviewRepository::new(state.pool());

    let line = reviews
        .purchased_line(user.id, review.order_id, review.product_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("You can only review products you have purchased".to_string())
        })?;
    if !line.status.is_reviewable() {
        return Err(AppError::BadRequest(
            "You can review this product once it has shipped".to_string(),
        ));
    }

    let created = reviews.create(user.id, line.seller_id, &review).await?;
    tracing::info!(review_id = %created.id, rating = created.rating, "Review created");

    Ok((StatusCode::CREATED, Json(created)))
}
