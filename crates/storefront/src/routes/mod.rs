//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Shop index (paginated)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Database readiness check
//!
//! # Products
//! GET  /products?page=         - Product listing (paginated)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart                   - Add product (form `product_id`)
//! POST /cart/delete-item       - Remove product (form `product_id`)
//! POST /cart/clear             - Empty the cart
//!
//! # Orders (requires auth)
//! POST /create-order           - Place an order from the cart
//! GET  /orders                 - Order history
//! GET  /orders/{id}/invoice    - Invoice PDF
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Open a payment session
//! GET  /checkout/success       - Place the order after payment
//! GET  /checkout/cancel        - Show the checkout page again
//!
//! # Auth
//! GET  /login, POST /login     - Login form / login
//! GET  /signup, POST /signup   - Signup form / signup
//! POST /logout                 - Logout
//! GET  /reset, POST /reset     - Reset request form / request
//! GET  /reset/{token}          - New password form
//! POST /new-password           - Set new password
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod shop;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router. The form endpoints are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/reset", get(auth::reset_page).post(auth::reset))
        .route("/reset/{token}", get(auth::new_password_page))
        .route("/new-password", post(auth::new_password))
        .route_layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::products))
        .route("/{id}", get(shop::product_detail))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/delete-item", post(cart::delete_item))
        .route("/clear", post(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::checkout))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/create-order", post(orders::create_order))
        .nest("/orders", order_routes())
        .nest("/checkout", checkout_routes())
        .merge(auth_routes())
}
