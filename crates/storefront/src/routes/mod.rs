//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Menu listing (?search=&category=)
//! GET  /items/{id}               - Item detail
//!
//! # Cart (session-scoped, in memory)
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add an item
//! POST /cart/update              - Set a line's quantity (0 removes)
//! POST /cart/remove              - Remove a line
//! POST /cart/clear               - Empty the cart
//! GET  /cart/count               - Cart count badge (fragment)
//!
//! # Ordering (requires login)
//! GET  /checkout                 - Checkout form with totals
//! POST /checkout                 - Submit the order
//! GET  /orders                   - Order history
//!
//! # Catalog management (requires admin)
//! GET  /admin                    - Dashboard
//! GET  /admin/items              - Item manager
//! POST /admin/items              - Create item
//! GET  /admin/items/{id}/edit    - Edit form
//! POST /admin/items/{id}         - Update item
//! POST /admin/items/{id}/delete  - Delete item
//! POST /admin/items/{id}/toggle  - Toggle active
//! GET  /admin/categories         - Category list
//! POST /admin/categories         - Create category
//!
//! # Auth
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action
//! GET  /auth/register            - Register page
//! POST /auth/register            - Register action
//! POST /auth/logout              - Logout action
//!
//! # Health
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (store ping)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{auth_rate_limiter, cart_token};
use crate::models::CurrentAccount;
use crate::state::AppState;

use menuboard_core::Role;

/// Header data every page shows.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub account_name: Option<String>,
    pub is_admin: bool,
    pub cart_count: u64,
}

impl PageContext {
    /// Build the header for `account`, reading the cart badge without
    /// creating a cart.
    pub async fn load(state: &AppState, session: &Session, account: Option<&CurrentAccount>) -> Self {
        let token = match cart_token(session).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not read cart token");
                None
            }
        };
        Self {
            account_name: account.map(|a| a.name.clone()),
            is_admin: account.is_some_and(|a| a.role.satisfies(Role::Admin)),
            cart_count: state.carts().item_count(token).await,
        }
    }
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/items/{id}", get(catalog::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the ordering routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/orders", get(orders::index))
}

/// Create the catalog management routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/items", get(admin::items).post(admin::create_item))
        .route("/items/{id}", post(admin::update_item))
        .route("/items/{id}/edit", get(admin::edit_item))
        .route("/items/{id}/delete", post(admin::delete_item))
        .route("/items/{id}/toggle", post(admin::toggle_item))
        .route(
            "/categories",
            get(admin::categories).post(admin::create_category),
        )
}

/// Create the auth routes router.
///
/// Login and registration are rate limited per client IP when
/// `rate_limited` is set.
pub fn auth_routes(rate_limited: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout));

    match auth_rate_limiter().filter(|_| rate_limited) {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all storefront routes.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(order_routes())
        .nest("/cart", cart_routes())
        .nest("/admin", admin_routes())
        .nest("/auth", auth_routes(rate_limit_auth))
        .nest("/health", health_routes())
}
