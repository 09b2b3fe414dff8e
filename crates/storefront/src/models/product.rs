//! Product and catalog domain types.
//!
//! Includes the listing filter parsed from query parameters and the input
//! validation used when sellers create or edit listings.

use std::ops::Bound;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sammys_market_core::{CategoryId, Price, ProductId, ProfileId};

use super::review::{Review, ReviewSummary};

/// Default number of products per listing page.
pub const DEFAULT_PER_PAGE: u32 = 9;

/// Upper bound on `per_page`.
pub const MAX_PER_PAGE: u32 = 48;

/// Maximum length of a product name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Largest listing price in cents. Prices are stored as `NUMERIC(10, 2)`.
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Category label meaning "no category filter".
const ALL_PRODUCTS: &str = "All Products";

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// A product listing, joined with its category name.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: ProfileId,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether at least one unit can be bought.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Seller shown on a product page.
#[derive(Debug, Clone, Serialize)]
pub struct SellerSummary {
    pub id: ProfileId,
    pub name: String,
    /// Year the seller joined.
    pub member_since: i32,
}

/// Everything the product page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub seller: Option<SellerSummary>,
    pub review_summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub has_more: bool,
}

impl ProductPage {
    /// Assemble a page, working out whether more results follow.
    #[must_use]
    pub fn new(products: Vec<Product>, pagination: Pagination, total: i64) -> Self {
        let shown = pagination.offset() + i64::try_from(products.len()).unwrap_or(i64::MAX);
        Self {
            has_more: shown < total,
            products,
            page: pagination.page,
            per_page: pagination.per_page,
            total,
        }
    }
}

// =============================================================================
// Listing Filters
// =============================================================================

/// Fixed price ranges offered by the catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBucket {
    /// Below $50.
    Under50,
    /// $50 to $100 inclusive.
    From50To100,
    /// $100 to $200 inclusive.
    From100To200,
    /// Above $200.
    Over200,
}

impl PriceBucket {
    /// Lower and upper bounds of the bucket.
    #[must_use]
    pub fn bounds(self) -> PriceRange {
        let dollars = |n: i64| Decimal::new(n, 0);
        match self {
            Self::Under50 => PriceRange {
                min: Bound::Unbounded,
                max: Bound::Excluded(dollars(50)),
            },
            Self::From50To100 => PriceRange {
                min: Bound::Included(dollars(50)),
                max: Bound::Included(dollars(100)),
            },
            Self::From100To200 => PriceRange {
                min: Bound::Included(dollars(100)),
                max: Bound::Included(dollars(200)),
            },
            Self::Over200 => PriceRange {
                min: Bound::Excluded(dollars(200)),
                max: Bound::Unbounded,
            },
        }
    }
}

impl std::str::FromStr for PriceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under-50" => Ok(Self::Under50),
            "50-100" => Ok(Self::From50To100),
            "100-200" => Ok(Self::From100To200),
            "over-200" => Ok(Self::Over200),
            _ => Err(format!("unknown price range: {s}")),
        }
    }
}

/// A price interval with open or closed ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Bound<Decimal>,
    pub max: Bound<Decimal>,
}

impl PriceRange {
    /// No price restriction.
    pub const ANY: Self = Self {
        min: Bound::Unbounded,
        max: Bound::Unbounded,
    };

    /// Inclusive range from optional explicit bounds.
    #[must_use]
    pub fn inclusive(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self {
            min: min.map_or(Bound::Unbounded, Bound::Included),
            max: max.map_or(Bound::Unbounded, Bound::Included),
        }
    }
}

/// How the listing is narrowed by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Any,
    Id(CategoryId),
    /// Case-insensitive category name.
    Name(String),
}

/// Parsed, validated listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub category: CategoryFilter,
    pub price: PriceRange,
}

/// Page selection for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Rows to return.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Query parameters of `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductQuery {
    /// Build the listing filter. A price bucket wins over explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for an unknown price bucket.
    pub fn filter(&self) -> Result<ProductFilter, String> {
        let search = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(String::from);

        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => CategoryFilter::Any,
            Some(name) if name.eq_ignore_ascii_case(ALL_PRODUCTS) || name == "all" => {
                CategoryFilter::Any
            }
            Some(raw) => raw
                .parse::<CategoryId>()
                .map_or_else(|_| CategoryFilter::Name(raw.to_string()), CategoryFilter::Id),
        };

        let price = match self.price.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() && bucket != "all" => {
                bucket.parse::<PriceBucket>()?.bounds()
            }
            _ => PriceRange::inclusive(self.min_price, self.max_price),
        };

        Ok(ProductFilter {
            search,
            category,
            price,
        })
    }

    /// Page selection with defaults applied and `per_page` clamped.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

// =============================================================================
// Seller Input
// =============================================================================

/// Body of `POST /seller/products` and `PUT /seller/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// A validated listing, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductInput {
    /// Trim and check the submitted fields.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first invalid field.
    pub fn validate(&self) -> Result<ValidProduct, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!(
                "Product name must be at most {MAX_NAME_LENGTH} characters"
            ));
        }

        let price = Price::new(self.price)
            .map_err(|_| "Price cannot be negative".to_string())?
            .rounded();
        if price.amount() > Decimal::new(MAX_PRICE_CENTS, 2) {
            return Err("Price must be at most 99999999.99".to_string());
        }

        if self.stock < 0 {
            return Err("Stock cannot be negative".to_string());
        }
        let stock = u32::try_from(self.stock)
            .ok()
            .filter(|s| i32::try_from(*s).is_ok())
            .ok_or_else(|| "Stock is too large".to_string())?;

        Ok(ValidProduct {
            name: name.to_string(),
            description: non_blank(self.description.as_deref()),
            price,
            stock,
            image_url: non_blank(self.image_url.as_deref()),
            category_id: self.category_id,
        })
    }
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_bucket_bounds() {
        let dollars = |n: i64| Decimal::new(n, 0);

        let under: PriceBucket = "under-50".parse().unwrap();
        assert_eq!(under.bounds().min, Bound::Unbounded);
        assert_eq!(under.bounds().max, Bound::Excluded(dollars(50)));

        let mid: PriceBucket = "50-100".parse().unwrap();
        assert_eq!(
            mid.bounds(),
            PriceRange::inclusive(Some(dollars(50)), Some(dollars(100)))
        );

        let over: PriceBucket = "over-200".parse().unwrap();
        assert_eq!(over.bounds().min, Bound::Excluded(dollars(200)));
        assert_eq!(over.bounds().max, Bound::Unbounded);
    }

    #[test]
    fn test_filter_defaults() {
        let filter = ProductQuery::default().filter().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.category, CategoryFilter::Any);
        assert_eq!(filter.price, PriceRange::ANY);
    }

    #[test]
    fn test_filter_category_forms() {
        let query = ProductQuery {
            category: Some("All Products".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().category, CategoryFilter::Any);

        let query = ProductQuery {
            category: Some("Jewelry".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.filter().unwrap().category,
            CategoryFilter::Name("Jewelry".to_string())
        );

        let id = CategoryId::generate();
        let query = ProductQuery {
            category: Some(id.to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().category, CategoryFilter::Id(id));
    }

    #[test]
    fn test_bucket_wins_over_explicit_bounds() {
        let query = ProductQuery {
            price: Some("over-200".to_string()),
            min_price: Some(Decimal::from(1)),
            max_price: Some(Decimal::from(5)),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().price, PriceBucket::Over200.bounds());

        let query = ProductQuery {
            min_price: Some(Decimal::from(10)),
            ..Default::default()
        };
        let range = query.filter().unwrap().price;
        assert_eq!(range.min, Bound::Included(Decimal::from(10)));
        assert_eq!(range.max, Bound::Unbounded);
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let query = ProductQuery {
            price: Some("cheap".to_string()),
            ..Default::default()
        };
        assert!(query.filter().is_err());
    }

    #[test]
    fn test_pagination_defaults_and_clamp() {
        let p = ProductQuery::default().pagination();
        assert_eq!((p.page, p.per_page, p.offset()), (1, DEFAULT_PER_PAGE, 0));

        let query = ProductQuery {
            page: Some(0),
            per_page: Some(500),
            ..Default::default()
        };
        let p = query.pagination();
        assert_eq!((p.page, p.per_page), (1, MAX_PER_PAGE));

        let query = ProductQuery {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(query.pagination().offset(), 18);
    }

    #[test]
    fn test_page_has_more() {
        let pagination = Pagination {
            page: 1,
            per_page: 2,
        };
        let page = ProductPage::new(Vec::new(), pagination, 0);
        assert!(!page.has_more);
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_validate_product_input() {
        let input = ProductInput {
            name: "  Soapstone Bird ".to_string(),
            description: Some("   ".to_string()),
            price: "45.005".parse().unwrap(),
            stock: 3,
            image_url: None,
            category_id: None,
        };
        let valid = input.validate().unwrap();
        assert_eq!(valid.name, "Soapstone Bird");
        assert_eq!(valid.description, None);
        assert_eq!(valid.price, price("45.01"));
        assert_eq!(valid.stock, 3);
    }

    #[test]
    fn test_validate_product_rejections() {
        let base = || ProductInput {
            name: "Basket".to_string(),
            description: None,
            price: Decimal::from(10),
            stock: 1,
            image_url: None,
            category_id: None,
        };

        let mut input = base();
        input.name = " ".to_string();
        assert!(input.validate().is_err());

        let mut input = base();
        input.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(input.validate().is_err());

        let mut input = base();
        input.price = Decimal::from(-1);
        assert_eq!(input.validate().unwrap_err(), "Price cannot be negative");

        let mut input = base();
        input.price = "100000000.00".parse().unwrap();
        assert_eq!(
            input.validate().unwrap_err(),
            "Price must be at most 99999999.99"
        );

        let mut input = base();
        input.price = "99999999.99".parse().unwrap();
        assert!(input.validate().is_ok());

        let mut input = base();
        input.stock = -2;
        assert_eq!(input.validate().unwrap_err(), "Stock cannot be negative");
    }
}
