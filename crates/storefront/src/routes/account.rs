//! Account profile handlers.

use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::profile::ProfileUpdate;
use crate::models::{CurrentUser, Profile, session_keys};
use crate::state::AppState;

/// The caller's profile.
///
/// GET /account/profile
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// Update name and email. The session snapshot follows the change.
///
/// PUT /account/profile
#[instrument(skip(state, session, user, body), fields(profile_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = body.validate().map_err(AppError::BadRequest)?;

    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update.name, &update.email)
        .await?;

    // Keep the role from the session snapshot; role changes apply on next sign-in.
    let snapshot = CurrentUser {
        role: user.role,
        ..CurrentUser::from(&profile)
    };
    session.insert(session_keys::CURRENT_USER, &snapshot).await?;

    Ok(Json(profile))
}
