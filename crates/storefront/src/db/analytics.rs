//! Read-only analytics queries.
//!
//! Marketplace-wide figures come from the `market.*_rankings` and
//! `market.user_analytics` views.

use sqlx::PgPool;

use sammys_market_core::{CategoryId, OrderId, Price, ProductId, ProfileId, UserRole};

use super::{RepositoryError, to_quantity};
use crate::models::analytics::{
    BuyerRanking, CategoryRanking, ProductRanking, RoleCount, SaleLine, SellerRanking,
};

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct RoleCountRow {
    role: String,
    count: i64,
}

impl TryFrom<RoleCountRow> for RoleCount {
    type Error = RepositoryError;

    fn try_from(row: RoleCountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::DataCorruption)?;
        Ok(Self {
            role,
            count: row.count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SellerRankingRow {
    seller_id: ProfileId,
    seller_name: String,
    total_orders: i64,
    total_revenue: Price,
    total_items_sold: i64,
}

impl From<SellerRankingRow> for SellerRanking {
    fn from(row: SellerRankingRow) -> Self {
        Self {
            seller_id: row.seller_id,
            seller_name: row.seller_name,
            total_orders: row.total_orders,
            total_revenue: row.total_revenue,
            total_items_sold: row.total_items_sold,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BuyerRankingRow {
    buyer_id: ProfileId,
    buyer_name: String,
    total_orders: i64,
    total_spent: Price,
    total_items_bought: i64,
}

impl From<BuyerRankingRow> for BuyerRanking {
    fn from(row: BuyerRankingRow) -> Self {
        Self {
            buyer_id: row.buyer_id,
            buyer_name: row.buyer_name,
            total_orders: row.total_orders,
            total_spent: row.total_spent,
            total_items_bought: row.total_items_bought,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRankingRow {
    product_id: ProductId,
    product_name: String,
    category_name: String,
    times_sold: i64,
    total_quantity_sold: i64,
    total_revenue: Price,
}

impl From<ProductRankingRow> for ProductRanking {
    fn from(row: ProductRankingRow) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row.product_name,
            category_name: row.category_name,
            times_sold: row.times_sold,
            total_quantity_sold: row.total_quantity_sold,
            total_revenue: row.total_revenue,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRankingRow {
    category_id: CategoryId,
    category_name: String,
    total_products: i64,
    times_sold: i64,
    total_quantity_sold: i64,
    total_revenue: Price,
}

impl From<CategoryRankingRow> for CategoryRanking {
    fn from(row: CategoryRankingRow) -> Self {
        Self {
            category_id: row.category_id,
            category_name: row.category_name,
            total_products: row.total_products,
            times_sold: row.times_sold,
            total_quantity_sold: row.total_quantity_sold,
            total_revenue: row.total_revenue,
        }
    }
}

/// Repository for analytics queries.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every sold line of the seller's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seller_sales(
        &self,
        seller_id: ProfileId,
    ) -> Result<Vec<SaleLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r"
            SELECT oi.order_id, oi.product_id, oi.quantity, oi.price
            FROM market.order_items oi
            JOIN market.products pr ON pr.id = oi.product_id
            WHERE pr.seller_id = $1
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SaleLine {
                    order_id: row.order_id,
                    product_id: row.product_id,
                    quantity: to_quantity(row.quantity, "quantity")?,
                    price: row.price,
                })
            })
            .collect()
    }

    /// Profile counts per role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for an unknown role.
    pub async fn role_counts(&self) -> Result<Vec<RoleCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, RoleCountRow>(
            "SELECT role, count FROM market.user_analytics ORDER BY role",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RoleCount::try_from).collect()
    }

    /// Top sellers by revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_sellers(&self, limit: i64) -> Result<Vec<SellerRanking>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerRankingRow>(
            r"
            SELECT seller_id, seller_name, total_orders, total_revenue, total_items_sold
            FROM market.seller_rankings
            ORDER BY total_revenue DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(SellerRanking::from).collect())
    }

    /// Top buyers by amount spent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_buyers(&self, limit: i64) -> Result<Vec<BuyerRanking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BuyerRankingRow>(
            r"
            SELECT buyer_id, buyer_name, total_orders, total_spent, total_items_bought
            FROM market.buyer_rankings
            ORDER BY total_spent DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BuyerRanking::from).collect())
    }

    /// Top products by revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<ProductRanking>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRankingRow>(
            r"
            SELECT product_id, product_name, category_name, times_sold,
                   total_quantity_sold, total_revenue
            FROM market.product_rankings
            ORDER BY total_revenue DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRanking::from).collect())
    }

    /// Top categories by revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_categories(
        &self,
        limit: i64,
    ) -> Result<Vec<CategoryRanking>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRankingRow>(
            r"
            SELECT category_id, category_name, total_products, times_sold,
                   total_quantity_sold, total_revenue
            FROM market.category_rankings
            ORDER BY total_revenue DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CategoryRanking::from).collect())
    }
}
