//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! menuboard accounts set-role ana@example.com admin
//! ```
//!
//! Accounts are created through the storefront's registration page. This
//! is the only way to grant `staff` or `admin`.

use thiserror::Error;

use menuboard_core::{Email, Role};
use menuboard_storefront::db::{AccountStore, StoreError};

use super::ConnectError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No account with email: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Change the role of the account registered under `email`.
///
/// Takes effect on the account's next request; no re-login is needed.
///
/// # Errors
///
/// Returns an error for a malformed or unknown email, or a store failure.
pub async fn set_role(email: &str, role: Role) -> Result<(), AccountError> {
    let email = Email::parse(email).map_err(|_| AccountError::InvalidEmail(email.to_owned()))?;

    let store = super::store().await?;
    let account = store
        .find_account_by_email(&email)
        .await?
        .ok_or_else(|| AccountError::NotFound(email.to_string()))?;

    if account.role == role {
        tracing::info!("{} is already {}", email, role);
        return Ok(());
    }

    store.set_role(account.id, role).await?;
    tracing::info!("{} is now {} (was {})", email, role, account.role);
    Ok(())
}
