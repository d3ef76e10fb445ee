//! Storage ports and their adapters.
//!
//! Services talk to the traits in this module, never to a database type
//! directly. Two adapters implement them:
//!
//! - [`PgStore`] - `PostgreSQL`, schema `menuboard`
//! - [`MemoryStore`] - in-process maps, for tests and demo mode
//!
//! # Tables
//!
//! - `account` - customers and admins, with argon2 password hashes
//! - `category` - menu sections
//! - `item` - menu items
//! - `customer_order` - order headers
//! - `order_line` - purchased items, priced at purchase time
//! - `tower_sessions.session` - session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p menuboard-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use menuboard_core::{AccountId, CategoryId, Email, ItemId, OrderId, OrderStatus, Role};

use crate::models::{
    Account, CatalogItem, Category, ItemDraft, NewAccount, NewCategory, NewOrder, NewOrderLine,
    Order, OrderCounts,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from any store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row not found.
    #[error("not found")]
    NotFound,

    /// Data in the store is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl StoreError {
    /// Whether retrying later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_)
                | Self::Database(
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
        )
    }
}

/// Accounts and credentials.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// The account and its password hash.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError>;

    /// Insert a customer account.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the email is taken.
    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError>;

    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        Ok(self.find_credentials(email).await?.map(|(account, _)| account))
    }
}

/// Categories and menu items.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories, by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the name is taken.
    async fn create_category(&self, new: NewCategory) -> Result<Category, StoreError>;

    /// Every item, active or not, by name.
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError>;

    /// Active items only, by name.
    async fn list_active_items(&self) -> Result<Vec<CatalogItem>, StoreError>;

    async fn find_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError>;

    async fn create_item(&self, draft: &ItemDraft) -> Result<CatalogItem, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    async fn update_item(&self, id: ItemId, draft: &ItemDraft) -> Result<CatalogItem, StoreError>;

    /// Returns whether a row was deleted.
    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    async fn set_item_active(&self, id: ItemId, active: bool) -> Result<(), StoreError>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .list_categories()
            .await?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError> {
        Ok(self.list_categories().await?.iter().any(|c| c.id == id))
    }
}

/// Order headers and lines.
///
/// The header and the lines are separate writes on purpose: callers see
/// each step succeed or fail and handle a header without lines themselves.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a pending header with no lines.
    async fn insert_order(&self, new: &NewOrder) -> Result<Order, StoreError>;

    /// Insert every line of an order in one batch.
    async fn insert_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError>;

    /// Delete a header and any lines. Returns whether it existed.
    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// An account's orders with lines, newest first.
    async fn orders_for_account(&self, account: AccountId) -> Result<Vec<Order>, StoreError>;

    /// Overwrite an order's status. Transition rules are checked by callers.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError>;

    /// Headers left without lines by a failed submission, created before
    /// `created_before`. A header still being written by a live checkout is
    /// younger than any sensible cutoff.
    async fn orders_without_lines(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError>;

    async fn order_counts(&self) -> Result<OrderCounts, StoreError>;
}

/// Everything the storefront needs from storage.
#[async_trait]
pub trait Store: AccountStore + CatalogStore + OrderStore {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}
