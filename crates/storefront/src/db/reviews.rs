//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sammys_market_core::{OrderId, OrderStatus, ProductId, ProfileId, ReviewId};

use super::RepositoryError;
use crate::models::review::{Review, ValidReview};

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.order_id, r.product_id, r.buyer_id, b.name AS buyer_name,
           r.seller_id, r.rating, r.comment, r.created_at
    FROM market.reviews r
    LEFT JOIN market.profiles b ON b.id = r.buyer_id
";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    order_id: OrderId,
    product_id: ProductId,
    buyer_id: ProfileId,
    buyer_name: Option<String>,
    seller_id: ProfileId,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {}", row.rating))
        })?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            buyer_id: row.buyer_id,
            buyer_name: row.buyer_name,
            seller_id: row.seller_id,
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// A purchased line the buyer might review.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct PurchasedLine {
    pub status: OrderStatus,
    pub seller_id: ProfileId,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// The buyer's line for `product_id` in one of their own orders, with the
    /// product's seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purchased_line(
        &self,
        buyer_id: ProfileId,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<PurchasedLine>, RepositoryError> {
        let line = sqlx::query_as::<_, PurchasedLine>(
            r"
            SELECT oi.status, pr.seller_id
            FROM market.order_items oi
            JOIN market.orders o ON o.id = oi.order_id
            JOIN market.products pr ON pr.id = oi.product_id
            WHERE o.id = $1 AND o.buyer_id = $2 AND oi.product_id = $3
            ORDER BY oi.status DESC
            LIMIT 1
            ",
        )
        .bind(order_id)
        .bind(buyer_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(line)
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if this order's product was already reviewed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        buyer_id: ProfileId,
        seller_id: ProfileId,
        review: &ValidReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH r AS (
                INSERT INTO market.reviews
                    (order_id, product_id, buyer_id, seller_id, rating, comment)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT r.id, r.order_id, r.product_id, r.buyer_id, b.name AS buyer_name,
                   r.seller_id, r.rating, r.comment, r.created_at
            FROM r
            LEFT JOIN market.profiles b ON b.id = r.buyer_id
            ",
        )
        .bind(review.order_id)
        .bind(review.product_id)
        .bind(buyer_id)
        .bind(seller_id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::unique_violation(e, "You have already reviewed this product")
        })?;

        row.try_into()
    }
}
