//! Role and status enums shared by the API and the CLI.

use serde::{Deserialize, Serialize};

/// Role of a marketplace profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shops and reviews purchases.
    #[default]
    Customer,
    /// Lists products and fulfils order items.
    Seller,
    /// Manages users and views marketplace analytics.
    Admin,
}

impl UserRole {
    /// Whether this role may manage inventory and fulfil orders.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }

    /// Whether this role may manage users and view analytics.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Roles a user may pick for themselves at sign-up.
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        matches!(self, Self::Customer | Self::Seller)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Seller => write!(f, "seller"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Fulfilment status of an order and of each of its items.
///
/// Variants are declared in lifecycle order, so `Ord` follows the lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "market.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Whether a seller may move an item from `self` to `next`.
    ///
    /// Statuses only move forward; skipping ahead is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next > self
    }

    /// Whether an item in this status can be reviewed by its buyer.
    #[must_use]
    pub const fn is_reviewable(self) -> bool {
        matches!(self, Self::Shipped)
    }

    /// Status of an order derived from its items: the least advanced item.
    #[must_use]
    pub fn aggregate<I: IntoIterator<Item = Self>>(items: I) -> Self {
        items.into_iter().min().unwrap_or_default()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}
