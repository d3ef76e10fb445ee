//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use menuboard_core::{AccountId, Email, Role};

use super::Account;

/// Session-stored account identity.
///
/// A cached copy; it is revalidated against the account store on every
/// request that reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub address: Option<String>,
}

impl From<&Account> for CurrentAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            address: account.address.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Key for the token of this visitor's in-memory cart.
    pub const CART_TOKEN: &str = "cart_token";
}
