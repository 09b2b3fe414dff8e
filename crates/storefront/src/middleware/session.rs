//! Session middleware configuration and session-held cart.
//!
//! Sessions are stored in `PostgreSQL` via tower-sessions. Besides the
//! signed-in user, the session holds the shopper's cart.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;
use crate::models::{Cart, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "market_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by migration.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    configure(PostgresStore::new(pool.clone()), config)
}

/// Apply the cookie settings to a session layer over any store.
pub fn configure<S: tower_sessions::SessionStore>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Load the cart from the session; a missing cart is empty.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let cart = load_cart(&session).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_cart_survives_round_trip_through_session() {
        use chrono::Utc;
        use rust_decimal::Decimal;
        use sammys_market_core::{Price, ProductId, ProfileId};

        use crate::models::{CartItem, Product};

        let product = Product {
            id: ProductId::generate(),
            seller_id: ProfileId::generate(),
            category_id: None,
            category_name: None,
            name: "Ilala Basket".to_string(),
            description: None,
            price: Price::new(Decimal::new(2500, 2)).unwrap(),
            stock: 4,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = load_cart(&session).await.unwrap();
        cart.add(CartItem::from_product(&product, 2));
        save_cart(&session, &cart).await.unwrap();

        let stored = load_cart(&session).await.unwrap();
        assert_eq!(stored.item_count(), 2);
        assert_eq!(stored, cart);
    }
}
