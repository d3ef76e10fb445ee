//! Subcommand implementations.

pub mod accounts;
pub mod migrate;
pub mod orders;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use menuboard_storefront::db::{PgStore, create_pool};

/// Errors shared by every command that touches the database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Database URL from `MENUBOARD_DATABASE_URL`, else `DATABASE_URL`.
fn database_url() -> Result<SecretString, ConnectError> {
    dotenvy::dotenv().ok();

    std::env::var("MENUBOARD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("MENUBOARD_DATABASE_URL"))
}

/// Connect to the database.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(create_pool(&url).await?)
}

/// Connect and wrap the pool in the storefront's store adapter.
pub async fn store() -> Result<PgStore, ConnectError> {
    Ok(PgStore::new(connect().await?))
}
