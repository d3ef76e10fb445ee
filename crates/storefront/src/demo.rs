//! Demo mode: an in-memory store with the bundled menu.
//!
//! Nothing survives a restart. When an admin password is configured an
//! admin account is created so the catalog manager can be tried out.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use menuboard_core::Role;

use crate::config::DEMO_ADMIN_EMAIL;
use crate::db::{AccountStore, MemoryStore, StoreError};
use crate::seed::{DEMO_MENU, SeedError, SeedMenu};
use crate::services::{AuthError, IdentityService, Registration};

/// Errors while preparing the demo store.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("demo menu: {0}")]
    Seed(#[from] SeedError),

    #[error("demo admin: {0}")]
    Admin(#[from] AuthError),

    #[error("demo admin role: {0}")]
    Role(#[from] StoreError),
}

/// Build a seeded in-memory store.
///
/// # Errors
///
/// Returns `DemoError` if the bundled menu is invalid or the admin account
/// cannot be created (for example, a password shorter than 8 characters).
pub async fn demo_store(admin_password: Option<&SecretString>) -> Result<Arc<MemoryStore>, DemoError> {
    let store = Arc::new(MemoryStore::new());
    let seeded = SeedMenu::from_yaml(DEMO_MENU)?.apply(store.as_ref()).await?;
    tracing::info!(items = seeded.items_created, "demo menu loaded");

    if let Some(password) = admin_password {
        let admin = IdentityService::new(store.as_ref())
            .register(Registration {
                email: DEMO_ADMIN_EMAIL.to_owned(),
                password: password.expose_secret().to_owned(),
                name: "Demo admin".to_owned(),
                ..Registration::default()
            })
            .await?;
        store.set_role(admin.id, Role::Admin).await?;
        tracing::info!(email = DEMO_ADMIN_EMAIL, "demo admin account created");
    }

    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menuboard_core::Email;

    use crate::db::CatalogStore;

    use super::*;

    #[tokio::test]
    async fn test_demo_store_has_menu_and_admin() {
        let password = SecretString::from("demo-admin-pass");
        let store = demo_store(Some(&password)).await.unwrap();

        assert!(!store.list_active_items().await.unwrap().is_empty());
        let admin = store
            .find_account_by_email(&Email::parse(DEMO_ADMIN_EMAIL).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_short_admin_password_is_rejected() {
        let password = SecretString::from("short");
        assert!(matches!(
            demo_store(Some(&password)).await,
            Err(DemoError::Admin(AuthError::WeakPassword(_)))
        ));
    }
}
