//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types, plus the request bodies that validate into them.

pub mod analytics;
pub mod cart;
pub mod order;
pub mod product;
pub mod profile;
pub mod review;
pub mod session;

pub use cart::{Cart, CartItem, CartSummary, Totals};
pub use product::{Category, Product, ProductDetail, ProductPage};
pub use profile::Profile;
pub use review::{Review, ReviewSummary};
pub use session::{CurrentUser, keys as session_keys};
