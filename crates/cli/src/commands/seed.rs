//! Seed the catalog from a YAML file.
//!
//! The file declares a seed seller profile, categories and products. The
//! command validates the whole file before connecting, then upserts
//! everything in one transaction: the seller by ID, categories by name,
//! products by (seller, name).

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};
use uuid::Uuid;

use sammys_market_core::{Email, UserRole};
use sammys_market_storefront::db;

/// Seed seller that owns every seeded product.
#[derive(Debug, Deserialize)]
pub struct SeedSeller {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    /// Category name; must be declared in the same file.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Top-level shape of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub seller: SeedSeller,
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// Counts reported after seeding.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub categories: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Check a seed file for mistakes. Returns every problem found.
#[must_use]
pub fn validate_catalog(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    if seed.seller.name.trim().is_empty() {
        errors.push("seller: name is empty".to_string());
    }
    if let Err(e) = Email::parse(&seed.seller.email) {
        errors.push(format!("seller: {e}"));
    }

    let mut categories = HashSet::new();
    for category in &seed.categories {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push("category: name is empty".to_string());
        } else if !categories.insert(name) {
            errors.push(format!("category {name}: declared twice"));
        }
    }

    let mut products = HashSet::new();
    for product in &seed.products {
        let name = product.name.trim();
        if name.is_empty() {
            errors.push("product: name is empty".to_string());
            continue;
        }
        if !products.insert(name) {
            errors.push(format!("product {name}: declared twice"));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("product {name}: price is negative"));
        }
        if product.stock < 0 {
            errors.push(format!("product {name}: stock is negative"));
        }
        if let Some(category) = &product.category
            && !categories.contains(category.trim())
        {
            errors.push(format!("product {name}: unknown category {category}"));
        }
    }

    errors
}

async fn upsert_seller(
    tx: &mut Transaction<'_, Postgres>,
    seller: &SeedSeller,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO market.profiles (id, name, email, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, email = EXCLUDED.email, role = EXCLUDED.role,
            updated_at = NOW()
        ",
    )
    .bind(seller.id)
    .bind(seller.name.trim())
    .bind(seller.email.trim().to_lowercase())
    .bind(UserRole::Seller)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_category(
    tx: &mut Transaction<'_, Postgres>,
    category: &SeedCategory,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO market.categories (name, description)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
        RETURNING id
        ",
    )
    .bind(category.name.trim())
    .bind(category.description.as_deref())
    .fetch_one(&mut **tx)
    .await
}

/// Returns `true` if the product was inserted, `false` if it was updated.
async fn upsert_product(
    tx: &mut Transaction<'_, Postgres>,
    seller_id: Uuid,
    category_id: Option<Uuid>,
    product: &SeedProduct,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        r"
        UPDATE market.products
        SET description = $3, price = $4, stock = $5, category_id = $6,
            image_url = $7, updated_at = NOW()
        WHERE seller_id = $1 AND name = $2
        ",
    )
    .bind(seller_id)
    .bind(product.name.trim())
    .bind(product.description.as_deref())
    .bind(product.price)
    .bind(product.stock)
    .bind(category_id)
    .bind(product.image_url.as_deref())
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(false);
    }

    sqlx::query(
        r"
        INSERT INTO market.products
            (seller_id, name, description, price, stock, category_id, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(seller_id)
    .bind(product.name.trim())
    .bind(product.description.as_deref())
    .bind(product.price)
    .bind(product.stock)
    .bind(category_id)
    .bind(product.image_url.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(true)
}

/// Upsert a validated catalog in a single transaction.
///
/// # Errors
///
/// Returns `sqlx::Error` if any statement fails; nothing is written then.
pub async fn seed_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedResult, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut result = SeedResult::default();

    upsert_seller(&mut tx, &seed.seller).await?;

    let mut category_ids = std::collections::HashMap::new();
    for category in &seed.categories {
        let id = upsert_category(&mut tx, category).await?;
        category_ids.insert(category.name.trim().to_string(), id);
        result.categories += 1;
    }

    for product in &seed.products {
        let category_id = product
            .category
            .as_deref()
            .and_then(|name| category_ids.get(name.trim()).copied());
        if upsert_product(&mut tx, seed.seller.id, category_id, product).await? {
            result.inserted += 1;
        } else {
            result.updated += 1;
        }
    }

    tx.commit().await?;
    Ok(result)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be read
/// or fails validation, or database operations fail.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Catalog validated"
    );

    let database_url = super::database_url().ok_or("MARKET_DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let result = seed_catalog(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories upserted: {}", result.categories);
    info!("  Products inserted: {}", result.inserted);
    info!("  Products updated: {}", result.updated);

    Ok(())
}
