//! Profile domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sammys_market_core::{Email, ProfileId, UserRole};

/// Minimum length of a display name, after trimming.
pub const MIN_NAME_LENGTH: usize = 2;

/// A marketplace profile.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /account/profile`.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// A validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfileUpdate {
    pub name: String,
    pub email: Email,
}

impl ProfileUpdate {
    /// Trim and check the submitted fields.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message when the name is too short or the
    /// email is malformed.
    pub fn validate(&self) -> Result<ValidProfileUpdate, String> {
        let name = self.name.trim();
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(format!(
                "Name must be at least {MIN_NAME_LENGTH} characters"
            ));
        }
        let email = Email::parse(&self.email).map_err(|e| format!("Invalid email: {e}"))?;

        Ok(ValidProfileUpdate {
            name: name.to_string(),
            email,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn update(name: &str, email: &str) -> ProfileUpdate {
        ProfileUpdate {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_validate_trims() {
        let valid = update("  Chipo Dube ", "Chipo@Example.com").validate().unwrap();
        assert_eq!(valid.name, "Chipo Dube");
        assert_eq!(valid.email.as_str(), "chipo@example.com");
    }

    #[test]
    fn test_validate_short_name() {
        assert!(update(" A ", "a@example.com").validate().is_err());
        assert!(update("Al", "a@example.com").validate().is_ok());
    }

    #[test]
    fn test_validate_bad_email() {
        let err = update("Tariro", "tariro").validate().unwrap_err();
        assert!(err.starts_with("Invalid email"));
    }
}
