//! Identity store.
//!
//! Resolves credentials to accounts, registers new customers and re-checks
//! a session's cached account against the store. Passwords are stored as
//! salted Argon2id hashes.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use menuboard_core::{Email, ValidationError};

use crate::db::{AccountStore, StoreError};
use crate::models::{Account, CurrentAccount, NewAccount};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Verified against when the email is unknown so both failure paths cost
/// one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("menuboard-timing-guard").ok());

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Identity service over any account store.
pub struct IdentityService<'a, S: AccountStore + ?Sized> {
    accounts: &'a S,
}

impl<'a, S: AccountStore + ?Sized> IdentityService<'a, S> {
    #[must_use]
    pub const fn new(accounts: &'a S) -> Self {
        Self { accounts }
    }

    /// Resolve an email and password to exactly one account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed,
    /// `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, and `AuthError::Store` if the store fails.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = Email::parse(email)?;

        let Some((account, password_hash)) = self.accounts.find_credentials(&email).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;
        tracing::info!(account_id = %account.id, "login succeeded");
        Ok(account)
    }

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email,
    /// `AuthError::WeakPassword` for a short password,
    /// `AuthError::Validation` for a blank name, and
    /// `AuthError::DuplicateAccount` if the email is already registered.
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> Result<Account, AuthError> {
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }

        let password_hash = hash_password(&input.password)?;

        let account = self
            .accounts
            .create_account(NewAccount {
                email,
                name: name.to_owned(),
                phone: non_blank(input.phone),
                address: non_blank(input.address),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::DuplicateAccount,
                other => AuthError::Store(other),
            })?;

        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Re-resolve a session's cached account.
    ///
    /// Returns `None` when nothing was cached or the account no longer
    /// exists; otherwise a fresh copy so role and name changes take effect
    /// on the next request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the store fails.
    pub async fn restore(
        &self,
        cached: Option<&CurrentAccount>,
    ) -> Result<Option<CurrentAccount>, AuthError> {
        let Some(cached) = cached else {
            return Ok(None);
        };
        let account = self.accounts.find_account(cached.id).await?;
        if account.is_none() {
            tracing::info!(account_id = %cached.id, "cached account no longer exists");
        }
        Ok(account.as_ref().map(CurrentAccount::from))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menuboard_core::Role;

    use super::*;
    use crate::db::MemoryStore;

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_owned(),
            password: "correct horse".to_owned(),
            name: "Bia".to_owned(),
            phone: Some("  ".to_owned()),
            address: Some(" Rua das Flores, 12 ".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let identity = IdentityService::new(&store);

        let account = identity.register(registration("bia@example.com")).await.unwrap();
        assert_eq!(account.role, Role::Customer);
        assert_eq!(account.phone, None);
        assert_eq!(account.address.as_deref(), Some("Rua das Flores, 12"));

        let logged_in = identity
            .login(" BIA@example.com ", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, account.id);
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plaintext() {
        let store = MemoryStore::new();
        IdentityService::new(&store)
            .register(registration("bia@example.com"))
            .await
            .unwrap();
        let (_, hash) = store
            .find_credentials(&Email::parse("bia@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("correct horse"));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = MemoryStore::new();
        let identity = IdentityService::new(&store);
        identity.register(registration("bia@example.com")).await.unwrap();

        let wrong = identity.login("bia@example.com", "nope nope").await;
        let unknown = identity.login("ghost@example.com", "correct horse").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = MemoryStore::new();
        let identity = IdentityService::new(&store);
        identity.register(registration("bia@example.com")).await.unwrap();
        let again = identity.register(registration("Bia@Example.com")).await;
        assert!(matches!(again, Err(AuthError::DuplicateAccount)));
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let store = MemoryStore::new();
        let identity = IdentityService::new(&store);

        let mut short = registration("a@b.co");
        short.password = "short".to_owned();
        assert!(matches!(
            identity.register(short).await,
            Err(AuthError::WeakPassword(_))
        ));

        let mut nameless = registration("a@b.co");
        nameless.name = "   ".to_owned();
        assert!(matches!(
            identity.register(nameless).await,
            Err(AuthError::Validation(ValidationError::EmptyField("name")))
        ));

        assert!(matches!(
            identity.register(registration("not-an-email")).await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_refreshes_role_and_discards_missing() {
        let store = MemoryStore::new();
        let identity = IdentityService::new(&store);
        let account = identity.register(registration("bia@example.com")).await.unwrap();
        let cached = CurrentAccount::from(&account);

        store.set_role(account.id, Role::Admin).await.unwrap();
        let restored = identity.restore(Some(&cached)).await.unwrap().unwrap();
        assert_eq!(restored.role, Role::Admin);

        let mut stale = cached;
        stale.id = menuboard_core::AccountId::new();
        assert_eq!(identity.restore(Some(&stale)).await.unwrap(), None);
        assert_eq!(identity.restore(None).await.unwrap(), None);
    }
}
