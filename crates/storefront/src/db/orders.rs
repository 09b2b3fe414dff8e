//! Order repository: checkout, purchase history and fulfilment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use sammys_market_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, ProfileId, short_ref};

use super::{RepositoryError, from_quantity, to_quantity};
use crate::models::CartItem;
use crate::models::cart::Totals;
use crate::models::order::{
    OrderConfirmation, OrderDetail, OrderItem, OrderLine, PurchasedItem, PurchasedProduct,
    SellerOrder, ShippingAddress, StatusChange,
};

/// Errors from changing an item's fulfilment status.
#[derive(Debug, Error)]
pub enum FulfilmentError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Statuses only move forward.
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<sqlx::Error> for FulfilmentError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Locked product row read during checkout.
#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: ProductId,
    name: String,
    price: Price,
    stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CreatedOrderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PurchasedItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    image_url: Option<String>,
    seller_id: ProfileId,
    quantity: i32,
    price: Price,
    status: OrderStatus,
    shipped_at: Option<DateTime<Utc>>,
    ordered_at: DateTime<Utc>,
    has_review: bool,
}

impl TryFrom<PurchasedItemRow> for PurchasedItem {
    type Error = RepositoryError;

    fn try_from(row: PurchasedItemRow) -> Result<Self, Self::Error> {
        let quantity = to_quantity(row.quantity, "quantity")?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product: PurchasedProduct {
                id: row.product_id,
                name: row.product_name,
                image_url: row.image_url,
                seller_id: row.seller_id,
            },
            quantity,
            price: row.price,
            line_total: row.price.times(quantity),
            status: row.status,
            shipped_at: row.shipped_at,
            ordered_at: row.ordered_at,
            has_review: row.has_review,
            can_review: row.status.is_reviewable() && !row.has_review,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    status: OrderStatus,
    subtotal: Price,
    tax: Price,
    total: Price,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    image_url: Option<String>,
    quantity: i32,
    price: Price,
    status: OrderStatus,
    shipped_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = to_quantity(row.quantity, "quantity")?;
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            image_url: row.image_url,
            quantity,
            price: row.price,
            line_total: row.price.times(quantity),
            status: row.status,
            shipped_at: row.shipped_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    order_id: OrderId,
    full_name: String,
    address: String,
    city: String,
    state: String,
    zip: String,
    country: String,
}

impl From<AddressRow> for ShippingAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            full_name: row.full_name,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
            country: row.country,
        }
    }
}

/// A seller's item together with its order header.
#[derive(Debug, sqlx::FromRow)]
struct SellerItemRow {
    order_status: OrderStatus,
    ordered_at: DateTime<Utc>,
    buyer_name: Option<String>,
    #[sqlx(flatten)]
    item: OrderItemRow,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedItemRow {
    order_id: OrderId,
    status: OrderStatus,
}

const ITEM_SELECT: &str = r"
    SELECT oi.id, oi.order_id, oi.product_id, pr.name AS product_name, pr.image_url,
           oi.quantity, oi.price, oi.status, oi.shipped_at
";

const ADDRESS_COLUMNS: &str = "order_id, full_name, address, city, state, zip, country";

/// Price cart lines from locked product rows.
///
/// Every line must still exist and have enough stock.
fn price_lines(
    items: &[CartItem],
    products: &[StockRow],
) -> Result<Vec<OrderLine>, RepositoryError> {
    items
        .iter()
        .map(|item| {
            let product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or_else(|| {
                    RepositoryError::Conflict(format!("{} is no longer available", item.name))
                })?;

            let stock = to_quantity(product.stock, "stock")?;
            if stock < item.quantity {
                return Err(RepositoryError::Conflict(format!(
                    "Only {stock} of {} left in stock",
                    product.name
                )));
            }

            Ok(OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity: item.quantity,
                price: product.price,
                line_total: product.price.times(item.quantity),
            })
        })
        .collect()
}

/// Group a seller's item rows (ordered by order) into orders.
fn group_seller_orders(
    rows: Vec<SellerItemRow>,
    mut addresses: HashMap<OrderId, ShippingAddress>,
) -> Result<Vec<SellerOrder>, RepositoryError> {
    let mut orders: Vec<SellerOrder> = Vec::new();

    for row in rows {
        let order_id = row.item.order_id;
        let item = OrderItem::try_from(row.item)?;

        match orders.last_mut() {
            Some(order) if order.id == order_id => {
                order.total = order.total + item.line_total;
                order.items.push(item);
            }
            _ => orders.push(SellerOrder {
                id: order_id,
                reference: short_ref(order_id.as_uuid()),
                buyer_name: row.buyer_name,
                status: row.order_status,
                created_at: row.ordered_at,
                total: item.line_total,
                shipping_address: addresses.remove(&order_id),
                items: vec![item],
            }),
        }
    }

    Ok(orders)
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for the cart's contents.
    ///
    /// Runs in one transaction: locks the products, re-prices every line,
    /// decrements stock, and writes the order, its items and the address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product vanished or is short on stock.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place_order(
        &self,
        buyer_id: ProfileId,
        items: &[CartItem],
        shipping: &ShippingAddress,
    ) -> Result<OrderConfirmation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
        let products = sqlx::query_as::<_, StockRow>(
            r"
            SELECT id, name, price, stock
            FROM market.products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let lines = price_lines(items, &products)?;
        let totals = Totals::from_subtotal(lines.iter().map(|l| l.line_total).sum());

        let order = sqlx::query_as::<_, CreatedOrderRow>(
            r"
            INSERT INTO market.orders (buyer_id, status, subtotal, tax, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            ",
        )
        .bind(buyer_id)
        .bind(OrderStatus::Pending)
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.total)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            let quantity = from_quantity(line.quantity, "quantity")?;

            sqlx::query(
                r"
                INSERT INTO market.order_items (order_id, product_id, quantity, price, status)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(quantity)
            .bind(line.price)
            .bind(OrderStatus::Pending)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE market.products SET stock = stock - $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            INSERT INTO market.shipping_addresses
                (order_id, full_name, address, city, state, zip, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(order.id)
        .bind(&shipping.full_name)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.zip)
        .bind(&shipping.country)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderConfirmation {
            order_id: order.id,
            reference: short_ref(order.id.as_uuid()),
            items: lines,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            created_at: order.created_at,
        })
    }

    /// Every item the buyer has purchased, shipped items first (most recent
    /// shipment first), then newest orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purchased_items(
        &self,
        buyer_id: ProfileId,
    ) -> Result<Vec<PurchasedItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, PurchasedItemRow>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, pr.name AS product_name,
                   pr.image_url, pr.seller_id, oi.quantity, oi.price, oi.status,
                   oi.shipped_at, o.created_at AS ordered_at,
                   EXISTS (
                       SELECT 1 FROM market.reviews r
                       WHERE r.order_id = oi.order_id AND r.product_id = oi.product_id
                   ) AS has_review
            FROM market.order_items oi
            JOIN market.orders o ON o.id = oi.order_id
            JOIN market.products pr ON pr.id = oi.product_id
            WHERE o.buyer_id = $1
            ORDER BY oi.shipped_at DESC NULLS LAST, o.created_at DESC, oi.id
            ",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PurchasedItem::try_from).collect()
    }

    /// One of the buyer's orders with its items and address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not belong to the buyer.
    pub async fn get_for_buyer(
        &self,
        buyer_id: ProfileId,
        order_id: OrderId,
    ) -> Result<OrderDetail, RepositoryError> {
        let order = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, status, subtotal, tax, total, created_at
            FROM market.orders
            WHERE id = $1 AND buyer_id = $2
            ",
        )
        .bind(order_id)
        .bind(buyer_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            {ITEM_SELECT}
            FROM market.order_items oi
            JOIN market.products pr ON pr.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.created_at, oi.id
            "
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let shipping_address = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM market.shipping_addresses WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?
        .map(ShippingAddress::from);

        Ok(OrderDetail {
            id: order.id,
            reference: short_ref(order.id.as_uuid()),
            status: order.status,
            subtotal: order.subtotal,
            tax: order.tax,
            total: order.total,
            created_at: order.created_at,
            items,
            shipping_address,
        })
    }

    /// Orders containing the seller's products, newest first, each holding
    /// only that seller's items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn seller_orders(
        &self,
        seller_id: ProfileId,
    ) -> Result<Vec<SellerOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerItemRow>(&format!(
            r"
            {ITEM_SELECT},
                   o.status AS order_status, o.created_at AS ordered_at,
                   b.name AS buyer_name
            FROM market.order_items oi
            JOIN market.products pr ON pr.id = oi.product_id
            JOIN market.orders o ON o.id = oi.order_id
            LEFT JOIN market.profiles b ON b.id = o.buyer_id
            WHERE pr.seller_id = $1
            ORDER BY o.created_at DESC, o.id, oi.created_at, oi.id
            "
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        let mut order_ids: Vec<OrderId> = rows.iter().map(|r| r.item.order_id).collect();
        order_ids.dedup();

        let addresses = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM market.shipping_addresses WHERE order_id = ANY($1)"
        ))
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| (row.order_id, ShippingAddress::from(row)))
        .collect();

        group_seller_orders(rows, addresses)
    }

    /// Move one of the seller's items to a later status.
    ///
    /// Reaching `shipped` (or beyond) stamps `shipped_at`. The order's status
    /// becomes the least advanced status among its items.
    ///
    /// # Errors
    ///
    /// Returns `FulfilmentError::InvalidTransition` if the status would not move forward.
    /// Returns `RepositoryError::NotFound` if the item is not the seller's.
    pub async fn update_item_status(
        &self,
        seller_id: ProfileId,
        item_id: OrderItemId,
        next: OrderStatus,
    ) -> Result<StatusChange, FulfilmentError> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, LockedItemRow>(
            r"
            SELECT oi.order_id, oi.status
            FROM market.order_items oi
            JOIN market.products pr ON pr.id = oi.product_id
            WHERE oi.id = $1 AND pr.seller_id = $2
            FOR UPDATE OF oi
            ",
        )
        .bind(item_id)
        .bind(seller_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !item.status.can_transition_to(next) {
            return Err(FulfilmentError::InvalidTransition {
                from: item.status,
                to: next,
            });
        }

        let shipped_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r"
            UPDATE market.order_items
            SET status = $2,
                shipped_at = CASE WHEN $3 THEN COALESCE(shipped_at, NOW()) ELSE shipped_at END
            WHERE id = $1
            RETURNING shipped_at
            ",
        )
        .bind(item_id)
        .bind(next)
        .bind(next >= OrderStatus::Shipped)
        .fetch_one(&mut *tx)
        .await?;

        let statuses: Vec<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM market.order_items WHERE order_id = $1")
                .bind(item.order_id)
                .fetch_all(&mut *tx)
                .await?;
        let order_status = OrderStatus::aggregate(statuses);

        sqlx::query("UPDATE market.orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(item.order_id)
            .bind(order_status)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(StatusChange {
            item_id,
            order_id: item.order_id,
            status: next,
            shipped_at,
            order_status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap()).unwrap()
    }

    fn cart_item(id: ProductId, quantity: u32) -> CartItem {
        CartItem {
            product_id: id,
            name: "Cart Name".to_string(),
            price: price("1.00"),
            image_url: None,
            quantity,
        }
    }

    fn stock(id: ProductId, unit: &str, stock: i32) -> StockRow {
        StockRow {
            id,
            name: "Mbira".to_string(),
            price: price(unit),
            stock,
        }
    }

    fn seller_row(order_id: OrderId, unit: &str, quantity: i32) -> SellerItemRow {
        SellerItemRow {
            order_status: OrderStatus::Pending,
            ordered_at: Utc::now(),
            buyer_name: Some("Farai".to_string()),
            item: OrderItemRow {
                id: OrderItemId::generate(),
                order_id,
                product_id: ProductId::generate(),
                product_name: "Mbira".to_string(),
                image_url: None,
                quantity,
                price: price(unit),
                status: OrderStatus::Pending,
                shipped_at: None,
            },
        }
    }

    #[test]
    fn test_price_lines_uses_database_price() {
        let id = ProductId::generate();
        let lines = price_lines(&[cart_item(id, 2)], &[stock(id, "80.00", 5)]).unwrap();
        assert_eq!(lines[0].price, price("80.00"));
        assert_eq!(lines[0].line_total, price("160.00"));
        assert_eq!(lines[0].name, "Mbira");
    }

    #[test]
    fn test_price_lines_rejects_missing_product() {
        let err = price_lines(&[cart_item(ProductId::generate(), 1)], &[]).unwrap_err();
        match err {
            RepositoryError::Conflict(msg) => assert_eq!(msg, "Cart Name is no longer available"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_price_lines_rejects_short_stock() {
        let id = ProductId::generate();
        let err = price_lines(&[cart_item(id, 3)], &[stock(id, "10.00", 2)]).unwrap_err();
        match err {
            RepositoryError::Conflict(msg) => assert_eq!(msg, "Only 2 of Mbira left in stock"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_group_seller_orders() {
        let first = OrderId::generate();
        let second = OrderId::generate();
        let rows = vec![
            seller_row(first, "10.00", 1),
            seller_row(first, "5.00", 2),
            seller_row(second, "7.50", 1),
        ];
        let mut addresses = HashMap::new();
        addresses.insert(
            first,
            ShippingAddress {
                full_name: "Farai Ncube".to_string(),
                address: "4 Main St".to_string(),
                city: "Bulawayo".to_string(),
                state: "Bulawayo".to_string(),
                zip: "0000".to_string(),
                country: "Zimbabwe".to_string(),
            },
        );

        let orders = group_seller_orders(rows, addresses).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].total, price("20.00"));
        assert!(orders[0].shipping_address.is_some());
        assert_eq!(orders[1].total, price("7.50"));
        assert!(orders[1].shipping_address.is_none());
    }
}
