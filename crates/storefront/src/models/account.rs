//! Customer and staff accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use menuboard_core::{AccountId, Email, Role};

/// A registered account. The password hash never leaves the store layer
/// except through `AccountStore::find_credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    /// Default delivery address, pre-filled at checkout.
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for registration. New accounts are always customers.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
}
