//! Domain models for the storefront.
//!
//! Rows as the stores return them, plus the insert shapes the services hand
//! to the stores. Pure rules (cart, totals, filters) live in
//! `menuboard-core`.

pub mod account;
pub mod catalog;
pub mod order;
pub mod session;

pub use account::{Account, NewAccount};
pub use catalog::{CatalogItem, Category, ItemDraft, NewCategory};
pub use order::{NewOrder, NewOrderLine, Order, OrderCounts, OrderLine};
pub use session::{CurrentAccount, keys as session_keys};
