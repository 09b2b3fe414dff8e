//! Seller and marketplace analytics.
//!
//! Seller figures are computed in memory from the seller's products and sold
//! lines. Marketplace rankings come straight from the database views.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use sammys_market_core::{CategoryId, OrderId, Price, ProductId, ProfileId, UserRole};

use super::product::{Category, Product};

/// Number of products in the seller's top list.
pub const TOP_PRODUCTS: usize = 5;

/// Product names in the top list are cut to this many characters.
const TOP_NAME_CHARS: usize = 20;

/// One sold line of a seller's product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at purchase.
    pub price: Price,
}

impl SaleLine {
    fn revenue(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Revenue for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub name: String,
    pub sales: Price,
    /// Number of the seller's products in this category.
    pub products: usize,
}

/// One entry of the top-products list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub name: String,
    pub sold: u32,
    pub revenue: Price,
}

/// Response of `GET /seller/analytics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerAnalytics {
    pub sales_by_category: Vec<CategorySales>,
    pub top_products: Vec<ProductSales>,
    pub total_revenue: Price,
    pub total_items_sold: u32,
    pub average_order_value: Price,
    pub product_count: usize,
}

impl SellerAnalytics {
    /// Summarize a seller's sales.
    ///
    /// Categories without sales are left out; so are products that never sold.
    #[must_use]
    pub fn compute(products: &[Product], categories: &[Category], sales: &[SaleLine]) -> Self {
        let mut revenue_by_product: HashMap<ProductId, (u32, Price)> = HashMap::new();
        for line in sales {
            let entry = revenue_by_product
                .entry(line.product_id)
                .or_insert((0, Price::ZERO));
            entry.0 = entry.0.saturating_add(line.quantity);
            entry.1 = entry.1 + line.revenue();
        }

        let sales_by_category = categories
            .iter()
            .map(|category| {
                let in_category: Vec<&Product> = products
                    .iter()
                    .filter(|p| p.category_id == Some(category.id))
                    .collect();
                let sales = in_category
                    .iter()
                    .filter_map(|p| revenue_by_product.get(&p.id))
                    .map(|(_, revenue)| *revenue)
                    .sum();
                CategorySales {
                    name: category.name.clone(),
                    sales,
                    products: in_category.len(),
                }
            })
            .filter(|c| c.sales > Price::ZERO)
            .collect();

        let mut top_products: Vec<ProductSales> = products
            .iter()
            .filter_map(|p| {
                let (sold, revenue) = revenue_by_product.get(&p.id)?;
                (*sold > 0).then(|| ProductSales {
                    name: truncate_name(&p.name),
                    sold: *sold,
                    revenue: *revenue,
                })
            })
            .collect();
        top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        top_products.truncate(TOP_PRODUCTS);

        let total_revenue: Price = sales.iter().map(SaleLine::revenue).sum();
        let total_items_sold = sales
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity));
        let order_count = sales
            .iter()
            .map(|line| line.order_id)
            .collect::<HashSet<_>>()
            .len();
        let average_order_value =
            total_revenue.split(u64::try_from(order_count).unwrap_or(u64::MAX));

        Self {
            sales_by_category,
            top_products,
            total_revenue,
            total_items_sold,
            average_order_value,
            product_count: products.len(),
        }
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > TOP_NAME_CHARS {
        let head: String = name.chars().take(TOP_NAME_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

// =============================================================================
// Marketplace Analytics
// =============================================================================

/// Number of profiles with a given role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: i64,
}

/// Response of `GET /admin/analytics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAnalytics {
    pub users: Vec<RoleCount>,
    pub total_users: i64,
    pub sellers: i64,
    pub customers: i64,
}

impl UserAnalytics {
    /// Derive the headline counts from per-role counts.
    #[must_use]
    pub fn from_counts(users: Vec<RoleCount>) -> Self {
        let count_of = |role: UserRole| {
            users
                .iter()
                .filter(|c| c.role == role)
                .map(|c| c.count)
                .sum::<i64>()
        };
        let sellers = count_of(UserRole::Seller);
        let customers = count_of(UserRole::Customer);
        let total_users = users.iter().map(|c| c.count).sum();

        Self {
            users,
            total_users,
            sellers,
            customers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerRanking {
    pub seller_id: ProfileId,
    pub seller_name: String,
    pub total_orders: i64,
    pub total_revenue: Price,
    pub total_items_sold: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyerRanking {
    pub buyer_id: ProfileId,
    pub buyer_name: String,
    pub total_orders: i64,
    pub total_spent: Price,
    pub total_items_bought: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRanking {
    pub product_id: ProductId,
    pub product_name: String,
    pub category_name: String,
    pub times_sold: i64,
    pub total_quantity_sold: i64,
    pub total_revenue: Price,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRanking {
    pub category_id: CategoryId,
    pub category_name: String,
    pub total_products: i64,
    pub times_sold: i64,
    pub total_quantity_sold: i64,
    pub total_revenue: Price,
}

/// Response of `GET /admin/rankings`.
#[derive(Debug, Clone, Serialize)]
pub struct Rankings {
    pub sellers: Vec<SellerRanking>,
    pub buyers: Vec<BuyerRanking>,
    pub products: Vec<ProductRanking>,
    pub categories: Vec<CategoryRanking>,
}
