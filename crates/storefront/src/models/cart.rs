//! Session cart.
//!
//! The cart is a list of product snapshots kept in the session. Prices here
//! are for display only; checkout re-prices every line from the database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sammys_market_core::{Price, ProductId};

use super::product::Product;

/// Sales tax applied to the cart subtotal (15%).
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// Snapshot a product for the cart.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            quantity,
        }
    }

    /// Price of this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Outcome of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated,
    /// Quantities below one are ignored.
    Ignored,
    NotInCart,
}

/// Shopping cart stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Lines in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, merging with an existing line for the same product.
    pub fn add(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Set the quantity of a line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> QuantityUpdate {
        let Ok(quantity) = u32::try_from(quantity) else {
            return QuantityUpdate::Ignored;
        };
        if quantity < 1 {
            return QuantityUpdate::Ignored;
        }

        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity;
                QuantityUpdate::Updated
            }
            None => QuantityUpdate::NotInCart,
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of the line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Totals as shown to the shopper.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let totals = Totals::from_subtotal(self.subtotal());
        CartSummary {
            items: self
                .items
                .iter()
                .map(|item| CartLineView {
                    line_total: item.line_total(),
                    item: item.clone(),
                })
                .collect(),
            item_count: self.item_count(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
        }
    }
}

/// Subtotal, tax and total of an order or cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Price,
    pub tax: Price,
    pub total: Price,
}

impl Totals {
    /// Apply the sales tax to a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Price) -> Self {
        let tax = subtotal.percentage(TAX_RATE);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// A cart line with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    pub line_total: Price,
}

/// Response body of the cart endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Price,
    pub tax: Price,
    pub total: Price,
}

/// Body of `POST /cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Body of `PUT /cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}
