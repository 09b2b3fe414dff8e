//! Database operations for the market `PostgreSQL` schema.
//!
//! # Schema: `market`
//!
//! ## Tables
//!
//! - `profiles` - Marketplace users, keyed by the auth provider's user ID
//! - `categories` - Product categories
//! - `products` - Seller listings with price and stock
//! - `orders` - Buyer orders with totals
//! - `order_items` - Lines of an order, each with its own fulfilment status
//! - `shipping_addresses` - One address per order
//! - `reviews` - One review per (order, product)
//!
//! ## Views
//!
//! - `user_analytics`, `seller_rankings`, `buyer_rankings`,
//!   `product_rankings`, `category_rankings`
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p sammys-market-cli -- migrate
//! ```

pub mod analytics;
pub mod categories;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod reviews;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use reviews::ReviewRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a row count from the database into a `u32` quantity.
pub(crate) fn to_quantity(value: i32, what: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {what} in database: {value}")))
}

/// Convert a `u32` quantity into the `INTEGER` the schema stores.
pub(crate) fn from_quantity(value: u32, what: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{what} out of range: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_conversions() {
        assert_eq!(to_quantity(5, "stock").unwrap(), 5);
        assert!(matches!(
            to_quantity(-1, "stock"),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert_eq!(from_quantity(7, "quantity").unwrap(), 7);
        assert!(from_quantity(u32::MAX, "quantity").is_err());
    }

    #[test]
    fn test_non_unique_error_is_database() {
        let err = RepositoryError::unique_violation(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
