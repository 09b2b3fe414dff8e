//! Order, checkout and fulfilment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sammys_market_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, ProfileId};

/// Accepted length of a card number, in digits.
const CARD_DIGITS: std::ops::RangeInclusive<usize> = 12..=19;

// =============================================================================
// Checkout Input
// =============================================================================

/// Shipping details submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingInput {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Simulated payment details. Nothing is charged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvv: Option<String>,
}

/// Body of `POST /checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: ShippingInput,
    #[serde(default)]
    pub payment: Option<PaymentInput>,
}

/// A validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl ShippingInput {
    /// Trim every field and require all of them.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first missing field.
    pub fn validate(&self) -> Result<ShippingAddress, String> {
        fn required(value: &str, label: &str) -> Result<String, String> {
            let value = value.trim();
            if value.is_empty() {
                return Err(format!("{label} is required"));
            }
            Ok(value.to_string())
        }

        Ok(ShippingAddress {
            full_name: required(&self.full_name, "Full name")?,
            address: required(&self.address, "Address")?,
            city: required(&self.city, "City")?,
            state: required(&self.state, "State")?,
            zip: required(&self.zip, "ZIP code")?,
            country: required(&self.country, "Country")?,
        })
    }
}

impl PaymentInput {
    /// Sanity-check the card number when one is given.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message when the card number is malformed.
    pub fn validate(&self) -> Result<(), String> {
        let Some(number) = self.card_number.as_deref() else {
            return Ok(());
        };

        let digits: String = number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if digits.is_empty() {
            return Ok(());
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) || !CARD_DIGITS.contains(&digits.len()) {
            return Err("Card number is invalid".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Checkout Output
// =============================================================================

/// A line that will be written to `order_items`, priced from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub line_total: Price,
}

/// Response of `POST /checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    /// Short human-facing order reference.
    pub reference: String,
    pub items: Vec<OrderLine>,
    pub subtotal: Price,
    pub tax: Price,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Buyer Views
// =============================================================================

/// Product fields shown next to a purchased item.
#[derive(Debug, Clone, Serialize)]
pub struct PurchasedProduct {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub seller_id: ProfileId,
}

/// One line of the buyer's purchase history.
#[derive(Debug, Clone, Serialize)]
pub struct PurchasedItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product: PurchasedProduct,
    pub quantity: u32,
    pub price: Price,
    pub line_total: Price,
    pub status: OrderStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub ordered_at: DateTime<Utc>,
    pub has_review: bool,
    pub can_review: bool,
}

/// An item inside an order detail view.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub price: Price,
    pub line_total: Price,
    pub status: OrderStatus,
    pub shipped_at: Option<DateTime<Utc>>,
}

/// A buyer's order with items and shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub reference: String,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub tax: Price,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
}

// =============================================================================
// Seller Views
// =============================================================================

/// An order as one seller sees it: only that seller's items.
#[derive(Debug, Clone, Serialize)]
pub struct SellerOrder {
    pub id: OrderId,
    pub reference: String,
    pub buyer_name: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Sum of this seller's lines only.
    pub total: Price,
    pub shipping_address: Option<ShippingAddress>,
    pub items: Vec<OrderItem>,
}

/// Body of `PUT /seller/order-items/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Result of a fulfilment status change.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusChange {
    pub item_id: OrderItemId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    /// The order's status after the change.
    pub order_status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInput {
        ShippingInput {
            full_name: " Nyasha Moyo ".to_string(),
            address: "12 Samora Machel Ave".to_string(),
            city: "Harare".to_string(),
            state: "Harare".to_string(),
            zip: "0000".to_string(),
            country: "Zimbabwe".to_string(),
        }
    }

    fn card(number: &str) -> PaymentInput {
        PaymentInput {
            card_number: Some(number.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_shipping_trims() {
        let address = shipping().validate().unwrap();
        assert_eq!(address.full_name, "Nyasha Moyo");
        assert_eq!(address.country, "Zimbabwe");
    }

    #[test]
    fn test_shipping_requires_every_field() {
        let mut input = shipping();
        input.city = "  ".to_string();
        assert_eq!(input.validate().unwrap_err(), "City is required");

        let mut input = shipping();
        input.zip = String::new();
        assert_eq!(input.validate().unwrap_err(), "ZIP code is required");
    }

    #[test]
    fn test_card_number_check() {
        assert!(PaymentInput::default().validate().is_ok());
        assert!(card("4242 4242 4242 4242").validate().is_ok());
        assert!(card("4242-4242-4242").validate().is_ok());
        assert!(card("4242").validate().is_err());
        assert!(card("4242 4242 4242 abcd").validate().is_err());
        assert!(card(&"4".repeat(20)).validate().is_err());
    }

    #[test]
    fn test_checkout_payment_is_optional() {
        let body = serde_json::json!({
            "shipping": {
                "full_name": "Nyasha Moyo",
                "address": "12 Samora Machel Ave",
                "city": "Harare",
                "state": "Harare",
                "zip": "0000",
                "country": "Zimbabwe"
            }
        });
        let request: CheckoutRequest = serde_json::from_value(body).unwrap();
        assert!(request.payment.is_none());
    }
}
