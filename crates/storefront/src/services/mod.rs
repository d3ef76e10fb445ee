//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `identity` - login, registration and session restore
//! - `orders` - order submission, history and status changes
//! - `catalog` - menu browsing and catalog management
//! - `carts` - in-memory carts keyed by session token
//!
//! Services borrow a store port and are built per request from
//! [`crate::state::AppState`].

pub mod carts;
pub mod catalog;
pub mod identity;
pub mod orders;

pub use carts::{CartHandle, CartRegistry, CartToken};
pub use catalog::{CatalogError, CatalogService};
pub use identity::{AuthError, IdentityService, Registration};
pub use orders::{OrderError, OrderService, OrderSettings};
