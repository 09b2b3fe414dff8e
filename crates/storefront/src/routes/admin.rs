//! Admin handlers: user management and marketplace analytics.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use sammys_market_core::{Email, ProfileId, UserRole};

use crate::db::{AnalyticsRepository, ProfileRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::Profile;
use crate::models::analytics::{Rankings, UserAnalytics};
use crate::state::AppState;

/// Entries per ranking table.
const RANKING_LIMIT: i64 = 10;

/// Body of `POST /admin/admins`.
#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub email: String,
}

/// Admins cannot delete their own account.
fn ensure_not_self(admin_id: ProfileId, target_id: ProfileId) -> Result<()> {
    if admin_id == target_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    Ok(())
}

/// Admin accounts are protected from deletion.
fn ensure_deletable(target: &Profile) -> Result<()> {
    if target.role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

fn ensure_promotable(target: &Profile) -> Result<()> {
    if target.role == UserRole::Admin {
        return Err(AppError::Conflict("User is already an admin".to_string()));
    }
    Ok(())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Every profile, newest first.
///
/// GET /admin/users
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Profile>>> {
    let profiles = ProfileRepository::new(state.pool()).list().await?;
    Ok(Json(profiles))
}

/// Delete a non-admin profile and everything it owns.
///
/// DELETE /admin/users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProfileId>,
) -> Result<StatusCode> {
    ensure_not_self(admin.id, id)?;

    let profiles = ProfileRepository::new(state.pool());
    let target = profiles.get(id).await?.ok_or_else(user_not_found)?;
    ensure_deletable(&target)?;

    profiles.delete(id).await.map_err(|e| match e {
        RepositoryError::NotFound => user_not_found(),
        other => other.into(),
    })?;

    add_breadcrumb(
        "admin",
        "User deleted",
        Some(&[("user_id", id.to_string().as_str())]),
    );
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Promote an existing profile to admin.
///
/// POST /admin/admins
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn promote(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<PromoteRequest>,
) -> Result<Json<Profile>> {
    let email = Email::parse(body.email.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let profiles = ProfileRepository::new(state.pool());
    let target = profiles
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No user with that email".to_string()))?;
    ensure_promotable(&target)?;

    let promoted = profiles.set_role(target.id, UserRole::Admin).await?;
    tracing::info!(user_id = %promoted.id, "User promoted to admin");
    Ok(Json(promoted))
}

/// Profile counts per role.
///
/// GET /admin/analytics
pub async fn analytics(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<UserAnalytics>> {
    let counts = AnalyticsRepository::new(state.pool()).role_counts().await?;
    Ok(Json(UserAnalytics::from_counts(counts)))
}

/// Top sellers, buyers, products and categories.
///
/// GET /admin/rankings
pub async fn rankings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Rankings>> {
    let analytics = AnalyticsRepository::new(state.pool());
    let (sellers, buyers, products, categories) = tokio::try_join!(
        analytics.top_sellers(RANKING_LIMIT),
        analytics.top_buyers(RANKING_LIMIT),
        analytics.top_products(RANKING_LIMIT),
        analytics.top_categories(RANKING_LIMIT),
    )?;

    Ok(Json(Rankings {
        sellers,
        buyers,
        products,
        categories,
    }))
}
