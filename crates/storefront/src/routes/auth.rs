//! Sign-in session handlers.
//!
//! Clients authenticate with the auth provider themselves and exchange the
//! provider's access token for a server session here.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Body of `POST /auth/session`.
#[derive(Debug, Deserialize)]
pub struct TokenExchange {
    pub access_token: String,
}

/// Exchange a provider access token for a session.
///
/// POST /auth/session
#[instrument(skip(state, session, body))]
pub async fn create_session(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<TokenExchange>,
) -> Result<Json<Profile>> {
    let token = body.access_token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("access_token is required".to_string()));
    }

    let profile = AuthService::new(state.pool(), state.auth())
        .sign_in(token)
        .await?;

    set_current_user(&session, &CurrentUser::from(&profile)).await?;
    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    let role = profile.role.to_string();
    add_breadcrumb("auth", "Signed in", Some(&[("role", role.as_str())]));
    tracing::info!(profile_id = %profile.id, "Signed in");

    Ok(Json(profile))
}

/// Sign out: drop the user and cart from the session.
///
/// DELETE /auth/session
#[instrument(skip(session))]
pub async fn destroy_session(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user.
///
/// GET /auth/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
