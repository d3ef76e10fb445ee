//! Order management commands.
//!
//! # Usage
//!
//! ```bash
//! # Complete or cancel a pending order
//! menuboard orders set-status <id> completed
//!
//! # List order headers whose lines were never saved
//! menuboard orders orphans
//!
//! # Delete them, leaving anything younger than 30 minutes alone
//! menuboard orders purge-orphans --older-than 30
//! ```

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use menuboard_core::{OrderId, OrderStatus};
use menuboard_storefront::db::{OrderStore, StoreError};
use menuboard_storefront::services::{OrderError, OrderService, OrderSettings};

use super::ConnectError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrdersCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Minutes a line-less header must age before it counts as orphaned.
/// Younger headers may belong to a checkout that is still writing lines.
pub const DEFAULT_GRACE_MINUTES: u32 = 5;

fn cutoff(older_than_minutes: u32) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(i64::from(older_than_minutes))
}

/// Move an order to `status`, enforcing the order lifecycle.
///
/// # Errors
///
/// Returns an error for an unknown order, a disallowed transition, or a
/// store failure.
pub async fn set_status(id: OrderId, status: OrderStatus) -> Result<(), OrdersCommandError> {
    let store = super::store().await?;
    OrderService::new(&store, OrderSettings::default())
        .transition(id, status)
        .await?;
    tracing::info!("Order {} is now {}", id, status);
    Ok(())
}

/// List order headers that have no lines and are older than
/// `older_than_minutes`.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn orphans(older_than_minutes: u32) -> Result<(), OrdersCommandError> {
    let store = super::store().await?;
    let orphans = store
        .orders_without_lines(cutoff(older_than_minutes))
        .await?;

    if orphans.is_empty() {
        tracing::info!("No orphaned orders");
        return Ok(());
    }

    tracing::info!("{} orphaned order(s):", orphans.len());
    for order in &orphans {
        tracing::info!(
            "  {}  {}  {}  total {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status,
            order.total
        );
    }
    Ok(())
}

/// Delete every order header that has no lines and is older than
/// `older_than_minutes`.
///
/// # Errors
///
/// Returns an error if the store fails. Orders deleted before the failure
/// stay deleted.
pub async fn purge_orphans(older_than_minutes: u32) -> Result<(), OrdersCommandError> {
    let store = super::store().await?;
    let orphans = store
        .orders_without_lines(cutoff(older_than_minutes))
        .await?;

    let mut deleted = 0_usize;
    for order in &orphans {
        if store.delete_order(order.id).await? {
            tracing::info!("Deleted orphaned order {}", order.id);
            deleted += 1;
        }
    }

    tracing::info!("Purged {} orphaned order(s)", deleted);
    Ok(())
}
