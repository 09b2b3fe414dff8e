//! HTTP route handlers for the market API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Database ping
//!
//! # Auth
//! POST   /auth/session                    - Exchange a provider token for a session (rate limited)
//! DELETE /auth/session                    - Sign out
//! GET    /auth/me                         - Current session user
//!
//! # Catalog
//! GET    /categories                      - All categories
//! GET    /products                        - Filtered, sorted, paginated listing
//! GET    /products/{id}                   - Product detail with seller and reviews
//! GET    /products/{id}/related           - Same-category products
//!
//! # Cart and checkout (requires auth)
//! GET    /cart                            - Cart with totals
//! DELETE /cart                            - Empty the cart
//! POST   /cart/items                      - Add a product
//! PUT    /cart/items/{product_id}         - Set quantity
//! DELETE /cart/items/{product_id}         - Remove a line
//! POST   /checkout                        - Place an order
//!
//! # Buyer (requires auth)
//! GET    /orders                          - Purchased items
//! GET    /orders/{id}                     - Order detail
//! POST   /reviews                         - Review a shipped purchase
//! GET    /account/profile                 - Profile
//! PUT    /account/profile                 - Update name and email
//!
//! # Seller (requires seller or admin)
//! GET    /seller/products                 - Own listings
//! POST   /seller/products                 - Create a listing
//! PUT    /seller/products/{id}            - Update a listing
//! DELETE /seller/products/{id}            - Delete a listing
//! GET    /seller/orders                   - Orders containing own products
//! PUT    /seller/order-items/{id}/status  - Advance fulfilment
//! GET    /seller/analytics                - Sales figures
//!
//! # Admin (requires admin)
//! GET    /admin/users                     - All profiles
//! DELETE /admin/users/{id}                - Delete a non-admin profile
//! POST   /admin/admins                    - Promote by email
//! GET    /admin/analytics                 - Profile counts per role
//! GET    /admin/rankings                  - Top sellers, buyers, products, categories
//!
//! # Assistant
//! POST   /api/product-search              - Natural-language product search (rate limited)
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod search;
pub mod seller;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{auth_rate_limiter, search_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/session",
            post(auth::create_session)
                .layer(auth_rate_limiter())
                .delete(auth::destroy_session),
        )
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/related", get(products::related))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the buyer order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the seller dashboard routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(seller::products).post(seller::create_product),
        )
        .route(
            "/products/{id}",
            put(seller::update_product).delete(seller::delete_product),
        )
        .route("/orders", get(seller::orders))
        .route("/order-items/{id}/status", put(seller::update_item_status))
        .route("/analytics", get(seller::analytics))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/admins", post(admin::promote))
        .route("/analytics", get(admin::analytics))
        .route("/rankings", get(admin::rankings))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .route("/categories", get(categories::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .route("/reviews", post(reviews::create))
        .route(
            "/account/profile",
            get(account::show).put(account::update),
        )
        .nest("/seller", seller_routes())
        .nest("/admin", admin_routes())
        .route(
            "/api/product-search",
            post(search::product_search).layer(search_rate_limiter()),
        )
}
