//! Category handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::Category;
use crate::state::AppState;

/// All categories by name.
///
/// GET /categories
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.categories().await?;
    Ok(Json(categories.as_ref().clone()))
}
