//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use sammys_market_core::{Email, ProfileId, UserRole};

use super::profile::Profile;

/// Session-stored user identity.
///
/// A snapshot of the profile taken at sign-in. Role changes made elsewhere
/// (e.g. promotion to admin) apply on the next sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Profile ID (same as the auth provider's user ID).
    pub id: ProfileId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Marketplace role.
    pub role: UserRole,
}

impl From<&Profile> for CurrentUser {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the shopping cart.
    pub const CART: &str = "cart";
}
