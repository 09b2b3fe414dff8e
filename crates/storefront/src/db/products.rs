//! Product repository.
//!
//! Listing queries are assembled with `QueryBuilder` because the filter
//! combination varies per request.

use std::ops::Bound;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use sammys_market_core::{CategoryId, Price, ProductId, ProfileId};

use super::{RepositoryError, from_quantity, to_quantity};
use crate::models::product::{CategoryFilter, Pagination, Product, ProductFilter, ValidProduct};

/// Product columns joined with the category name. Expects aliases `p` and `c`.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.seller_id, p.category_id, c.name AS category_name,
           p.name, p.description, p.price, p.stock, p.image_url,
           p.created_at, p.updated_at
";

const PRODUCT_FROM: &str =
    " FROM market.products p LEFT JOIN market.categories c ON c.id = p.category_id";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    seller_id: ProfileId,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    name: String,
    description: Option<String>,
    price: Price,
    stock: i32,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            seller_id: row.seller_id,
            category_id: row.category_id,
            category_name: row.category_name,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: to_quantity(row.stock, "stock")?,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the `WHERE` clause for a listing filter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    match &filter.category {
        CategoryFilter::Any => {}
        CategoryFilter::Id(id) => {
            builder.push(" AND p.category_id = ").push_bind(*id);
        }
        CategoryFilter::Name(name) => {
            builder
                .push(" AND LOWER(c.name) = LOWER(")
                .push_bind(name.clone())
                .push(")");
        }
    }

    match filter.price.min {
        Bound::Included(min) => {
            builder.push(" AND p.price >= ").push_bind(min);
        }
        Bound::Excluded(min) => {
            builder.push(" AND p.price > ").push_bind(min);
        }
        Bound::Unbounded => {}
    }
    match filter.price.max {
        Bound::Included(max) => {
            builder.push(" AND p.price <= ").push_bind(max);
        }
        Bound::Excluded(max) => {
            builder.push(" AND p.price < ").push_bind(max);
        }
        Bound::Unbounded => {}
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching a filter, newest first, plus the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(PRODUCT_FROM);
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut listing = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        listing.push(PRODUCT_FROM);
        push_filter(&mut listing, filter);
        listing
            .push(" ORDER BY p.created_at DESC, p.id LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let rows: Vec<ProductRow> = listing.build_query_as().fetch_all(self.pool).await?;

        Ok((into_products(rows)?, total))
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} {PRODUCT_FROM} ORDER BY p.created_at DESC, p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// A seller's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(
        &self,
        seller_id: ProfileId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            {PRODUCT_SELECT} {PRODUCT_FROM}
            WHERE p.seller_id = $1
            ORDER BY p.created_at DESC, p.id
            "
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} {PRODUCT_FROM} WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Other products to show next to `product`: same category first, then
    /// newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            {PRODUCT_SELECT} {PRODUCT_FROM}
            WHERE p.id <> $1
            ORDER BY COALESCE(p.category_id = $2, FALSE) DESC, p.created_at DESC, p.id
            LIMIT $3
            "
        ))
        .bind(product.id)
        .bind(product.category_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Create a listing owned by `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        seller_id: ProfileId,
        input: &ValidProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                INSERT INTO market.products
                    (seller_id, category_id, name, description, price, stock, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            {PRODUCT_SELECT}
            FROM p LEFT JOIN market.categories c ON c.id = p.category_id
            "
        ))
        .bind(seller_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(from_quantity(input.stock, "stock")?)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Update a listing, only if `seller_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product belongs to the seller.
    pub async fn update(
        &self,
        seller_id: ProfileId,
        id: ProductId,
        input: &ValidProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                UPDATE market.products
                SET category_id = $3, name = $4, description = $5, price = $6,
                    stock = $7, image_url = $8, updated_at = NOW()
                WHERE id = $1 AND seller_id = $2
                RETURNING *
            )
            {PRODUCT_SELECT}
            FROM p LEFT JOIN market.categories c ON c.id = p.category_id
            "
        ))
        .bind(id)
        .bind(seller_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(from_quantity(input.stock, "stock")?)
        .bind(&input.image_url)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a listing, only if `seller_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product belongs to the seller.
    pub async fn delete(&self, seller_id: ProfileId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM market.products WHERE id = $1 AND seller_id = $2")
            .bind(id)
            .bind(seller_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::product::{PriceBucket, PriceRange};

    fn sql_for(filter: &ProductFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        builder.push(PRODUCT_FROM);
        push_filter(&mut builder, filter);
        builder.sql().to_owned()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_cotton\\"), "100\\%\\_cotton\\\\");
        assert_eq!(escape_like("basket"), "basket");
    }

    #[test]
    fn test_filter_without_conditions() {
        let filter = ProductFilter {
            search: None,
            category: CategoryFilter::Any,
            price: PriceRange::ANY,
        };
        assert!(sql_for(&filter).ends_with("WHERE TRUE"));
    }

    #[test]
    fn test_filter_with_every_condition() {
        let filter = ProductFilter {
            search: Some("bowl".to_string()),
            category: CategoryFilter::Name("Crafts".to_string()),
            price: PriceBucket::Under50.bounds(),
        };
        let sql = sql_for(&filter);
        assert!(sql.contains("p.name ILIKE $1 OR p.description ILIKE $2"));
        assert!(sql.contains("LOWER(c.name) = LOWER($3)"));
        assert!(sql.contains("p.price < $4"));
        assert!(!sql.contains(">="));
    }

    #[test]
    fn test_filter_inclusive_bounds() {
        let filter = ProductFilter {
            search: None,
            category: CategoryFilter::Id(CategoryId::generate()),
            price: PriceRange::inclusive(Some(Decimal::from(10)), Some(Decimal::from(20))),
        };
        let sql = sql_for(&filter);
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("p.price >= $2"));
        assert!(sql.contains("p.price <= $3"));
    }
}
