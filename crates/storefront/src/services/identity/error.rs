//! Identity error types.

use thiserror::Error;

use menuboard_core::{EmailError, ValidationError};

use crate::db::StoreError;

/// Errors from login, registration and session restore.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    DuplicateAccount,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// A required registration field is missing.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message safe to show on the login or registration form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => format!("Invalid email: {e}"),
            Self::InvalidCredentials => "Incorrect email or password.".to_owned(),
            Self::DuplicateAccount => "An account with this email already exists.".to_owned(),
            Self::WeakPassword(reason) => format!("Password {reason}."),
            Self::Validation(e) => {
                let mut msg = e.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("{msg}.")
            }
            Self::Store(_) | Self::PasswordHash => {
                "Something went wrong. Please try again in a moment.".to_owned()
            }
        }
    }
}
