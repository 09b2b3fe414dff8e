//! Authentication service.
//!
//! Credentials never reach this server. Clients sign in with the external
//! auth provider and hand us the provider-issued access token; we verify it
//! against the provider's `/user` endpoint and mirror the identity into a
//! marketplace profile.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sammys_market_core::{Email, ProfileId, UserRole};

use crate::config::AuthProviderConfig;
use crate::db::ProfileRepository;
use crate::models::Profile;

/// User record returned by the provider's `/user` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Sign-up metadata the client attached to the provider account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl ProviderUser {
    /// Display name for a new profile: the metadata name, else the email's
    /// local part.
    #[must_use]
    pub fn display_name(&self, email: &Email) -> String {
        self.user_metadata
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(
                || {
                    email
                        .as_str()
                        .split('@')
                        .next()
                        .unwrap_or_default()
                        .to_string()
                },
                str::to_string,
            )
    }

    /// Role requested at sign-up. Only customer and seller may be chosen;
    /// anything else falls back to customer.
    #[must_use]
    pub fn requested_role(&self) -> UserRole {
        self.user_metadata
            .role
            .as_deref()
            .and_then(|role| role.trim().parse::<UserRole>().ok())
            .filter(|role| role.is_self_assignable())
            .unwrap_or_default()
    }
}

/// HTTP client for the auth provider.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    user_url: String,
}

impl AuthClient {
    /// Create a new provider client. The anon key is sent on every request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if the anon key is not a valid header
    /// value, or `AuthError::Http` if the client cannot be built.
    pub fn new(config: &AuthProviderConfig) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e: InvalidHeaderValue| AuthError::Provider(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AuthClientInner {
                client,
                user_url: format!("{}/user", config.url),
            }),
        })
    }

    /// Resolve an access token to the provider user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the provider rejects the token.
    /// Returns `AuthError::Provider` for any other non-success status.
    #[instrument(skip(self, access_token))]
    pub async fn verify(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| AuthError::InvalidToken)?;

        let response = self
            .inner
            .client
            .get(&self.inner.user_url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("{status}: {body}")));
        }

        Ok(response.json().await?)
    }
}

/// Signs provider users into the marketplace.
pub struct AuthService<'a> {
    profiles: ProfileRepository<'a>,
    client: &'a AuthClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, client: &'a AuthClient) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
            client,
        }
    }

    /// Verify an access token and load the caller's profile, creating it on
    /// first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is rejected.
    /// Returns `AuthError::MissingEmail` / `AuthError::InvalidEmail` if a new
    /// profile cannot be created from the provider record.
    #[instrument(skip(self, access_token))]
    pub async fn sign_in(&self, access_token: &str) -> Result<Profile, AuthError> {
        let user = self.client.verify(access_token).await?;
        let id = ProfileId::new(user.id);

        if let Some(profile) = self.profiles.get(id).await? {
            return Ok(profile);
        }

        let email = Email::parse(user.email.as_deref().ok_or(AuthError::MissingEmail)?)?;
        let name = user.display_name(&email);
        let role = user.requested_role();

        let profile = self.profiles.create(id, &name, &email, role).await?;
        tracing::info!(profile_id = %profile.id, role = %profile.role, "Created profile on first sign-in");
        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider_user(json: &str) -> ProviderUser {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_provider_user_minimal_payload() {
        let user = provider_user(r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60"}"#);
        assert!(user.email.is_none());
        assert!(user.user_metadata.name.is_none());
        assert_eq!(user.requested_role(), UserRole::Customer);
    }

    #[test]
    fn test_display_name_prefers_metadata() {
        let user = provider_user(
            r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60",
                "email": "rudo@example.com",
                "user_metadata": {"name": "  Rudo Moyo "}}"#,
        );
        let email = Email::parse("rudo@example.com").unwrap();
        assert_eq!(user.display_name(&email), "Rudo Moyo");
    }

    #[test]
    fn test_display_name_falls_back_to_local_part() {
        let user = provider_user(
            r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60",
                "user_metadata": {"name": "   "}}"#,
        );
        let email = Email::parse("tatenda@example.com").unwrap();
        assert_eq!(user.display_name(&email), "tatenda");
    }

    #[test]
    fn test_requested_role_never_grants_admin() {
        let seller = provider_user(
            r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60",
                "user_metadata": {"role": "seller"}}"#,
        );
        assert_eq!(seller.requested_role(), UserRole::Seller);

        let admin = provider_user(
            r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60",
                "user_metadata": {"role": "admin"}}"#,
        );
        assert_eq!(admin.requested_role(), UserRole::Customer);

        let junk = provider_user(
            r#"{"id": "6f1c2a7e-3b9d-4f61-9c1e-2b7d8a4e5f60",
                "user_metadata": {"role": "wizard"}}"#,
        );
        assert_eq!(junk.requested_role(), UserRole::Customer);
    }

    #[tokio::test]
    async fn test_verify_unreachable_provider_is_http_error() {
        let config = crate::config::StorefrontConfig::for_tests();
        let client = AuthClient::new(&config.auth).unwrap();
        let err = client.verify("token").await.unwrap_err();
        assert!(matches!(err, AuthError::Http(_)));
    }
}
