//! Integration tests for Menuboard.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! menuboard migrate
//! menuboard seed crates/storefront/seed/menu.yaml
//!
//! # Start the storefront
//! cargo run -p menuboard-storefront
//!
//! # Run the ignored tests
//! cargo test -p menuboard-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_*` - HTTP tests against a running storefront
//! - `pg_store` - `PostgreSQL` adapter tests (needs `MENUBOARD_DATABASE_URL`)
//!
//! The storefront under test must run with `MENUBOARD_RATE_LIMIT_AUTH=false`
//! or the registration helpers will be throttled.

use reqwest::{Client, StatusCode, redirect::Policy};
use secrecy::SecretString;

/// Password used for every account these tests register.
pub const TEST_PASSWORD: &str = "integration-pass";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("MENUBOARD_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// Database URL for adapter tests.
///
/// # Panics
///
/// Panics if neither `MENUBOARD_DATABASE_URL` nor `DATABASE_URL` is set.
#[must_use]
#[allow(clippy::expect_used)]
pub fn database_url() -> SecretString {
    std::env::var("MENUBOARD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("MENUBOARD_DATABASE_URL must be set for database tests")
}

/// A fresh email so tests can run repeatedly against the same database.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a customer and leave `client` logged in.
///
/// # Panics
///
/// Panics if the request fails or registration is rejected.
#[allow(clippy::expect_used)]
pub async fn register(client: &Client, email: &str) {
    let resp = client
        .post(format!("{}/auth/register", storefront_base_url()))
        .form(&[
            ("email", email),
            ("password", TEST_PASSWORD),
            ("password_confirm", TEST_PASSWORD),
            ("name", "Integration"),
            ("address", "Rua dos Testes, 1"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "registration rejected");
}

/// Item ids in the order the menu page lists them.
///
/// # Panics
///
/// Panics if the menu page cannot be fetched.
#[allow(clippy::expect_used)]
pub async fn menu_item_ids(client: &Client) -> Vec<String> {
    let body = client
        .get(format!("{}/", storefront_base_url()))
        .send()
        .await
        .expect("Failed to fetch menu")
        .text()
        .await
        .expect("Failed to read menu");
    item_ids_in(&body)
}

fn item_ids_in(html: &str) -> Vec<String> {
    const MARKER: &str = r#"name="item_id" value=""#;
    html.match_indices(MARKER)
        .filter_map(|(start, _)| {
            let rest = html.get(start + MARKER.len()..)?;
            rest.split('"').next().map(str::to_owned)
        })
        .collect()
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
