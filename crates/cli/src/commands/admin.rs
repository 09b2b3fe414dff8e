//! Admin management commands.
//!
//! # Usage
//!
//! ```bash
//! # Promote an existing profile to admin
//! market-cli admin promote -e admin@sammys.market
//! ```
//!
//! The profile must exist already: users sign in through the auth provider
//! once before they can be promoted.

use sammys_market_core::{Email, UserRole};
use sammys_market_storefront::db::{self, ProfileRepository, RepositoryError};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: MARKET_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Query error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No profile has the email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// The profile is an admin already.
    #[error("User is already an admin: {0}")]
    AlreadyAdmin(String),
}

/// Promote the profile with `email` to admin.
///
/// # Errors
///
/// Returns an error if the email is invalid, no profile has it, the profile
/// is already an admin, or the database fails.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email =
        Email::parse(email.trim()).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let profiles = ProfileRepository::new(&pool);
    let profile = profiles
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    if profile.role == UserRole::Admin {
        return Err(AdminError::AlreadyAdmin(email.to_string()));
    }

    let promoted = profiles.set_role(profile.id, UserRole::Admin).await?;
    tracing::info!(
        "Promoted {} ({}) from {} to admin",
        promoted.name,
        promoted.email,
        profile.role
    );
    Ok(())
}
