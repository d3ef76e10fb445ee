//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MENUBOARD_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; not needed in demo mode)
//! - `MENUBOARD_BASE_URL` - Public URL for the storefront
//! - `MENUBOARD_SESSION_SECRET` - Cookie signing key (min 64 chars, high entropy)
//!
//! ## Optional
//! - `MENUBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `MENUBOARD_PORT` - Listen port (default: 3000)
//! - `MENUBOARD_DELIVERY_FEE` - Flat delivery fee (default: 15.00)
//! - `MENUBOARD_COMPENSATE_PARTIAL_ORDERS` - Delete order headers whose lines
//!   failed to save (default: true)
//! - `MENUBOARD_DEMO` - Run on the in-memory store with a sample menu (default: false)
//! - `MENUBOARD_DEMO_ADMIN_PASSWORD` - Password for the demo admin account
//! - `MENUBOARD_RATE_LIMIT_AUTH` - Throttle login and registration per client
//!   IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use menuboard_core::Price;
use menuboard_core::order::DEFAULT_DELIVERY_FEE_CENTS;

use crate::services::OrderSettings;

/// Signed cookies need a 512-bit key.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Email of the account created in demo mode.
pub const DEMO_ADMIN_EMAIL: &str = "admin@menuboard.local";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where accounts, catalog and orders live.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` at the given URL.
    Postgres { database_url: SecretString },
    /// In-memory store seeded with a sample menu. Nothing is persisted.
    Demo {
        admin_password: Option<SecretString>,
    },
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Storage backend
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session cookie signing key
    pub session_secret: SecretString,
    /// Flat fee for delivery orders
    pub delivery_fee: Price,
    /// Delete order headers whose lines failed to save
    pub compensate_partial_orders: bool,
    /// Apply the login/registration rate limiter. Needs peer addresses.
    pub rate_limit_auth: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let demo = get_bool_env("MENUBOARD_DEMO", false)?;
        let store = if demo {
            StoreBackend::Demo {
                admin_password: get_optional_env("MENUBOARD_DEMO_ADMIN_PASSWORD")
                    .map(SecretString::from),
            }
        } else {
            StoreBackend::Postgres {
                database_url: get_database_url("MENUBOARD_DATABASE_URL")?,
            }
        };

        let host = get_env_or_default("MENUBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MENUBOARD_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("MENUBOARD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MENUBOARD_PORT".to_owned(), e.to_string()))?;
        let base_url = get_required_env("MENUBOARD_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MENUBOARD_BASE_URL".to_owned(), e.to_string())
        })?;

        let session_secret = get_validated_secret("MENUBOARD_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "MENUBOARD_SESSION_SECRET")?;

        let delivery_fee = match get_optional_env("MENUBOARD_DELIVERY_FEE") {
            Some(raw) => Price::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("MENUBOARD_DELIVERY_FEE".to_owned(), e.to_string())
            })?,
            None => default_delivery_fee(),
        };

        Ok(Self {
            store,
            host,
            port,
            base_url,
            session_secret,
            delivery_fee,
            compensate_partial_orders: get_bool_env("MENUBOARD_COMPENSATE_PARTIAL_ORDERS", true)?,
            rate_limit_auth: get_bool_env("MENUBOARD_RATE_LIMIT_AUTH", true)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self.store, StoreBackend::Demo { .. })
    }

    #[must_use]
    pub const fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            delivery_fee: self.delivery_fee,
            compensate_partial_orders: self.compensate_partial_orders,
        }
    }
}

/// The delivery fee used when none is configured.
#[must_use]
pub fn default_delivery_fee() -> Price {
    Price::from_cents(DEFAULT_DELIVERY_FEE_CENTS).unwrap_or(Price::ZERO)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable. Blank counts as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_bool(&raw, key))
}

fn parse_bool(raw: &str, key: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}

/// Validate that a session secret is long enough to be a signing key.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let err = validate_secret_strength("changeme-changeme-changeme", "MENUBOARD_SESSION_SECRET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(var, _) if var == "MENUBOARD_SESSION_SECRET"));
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        assert!(validate_secret_strength(&"ab".repeat(40), "K").is_err());
    }

    #[test]
    fn test_random_secret_accepted() {
        let secret = "q7G$v2Lm9!Xc4Rt8#Wb1Zp6&Hn3Kd5@Jf0Ys2Ue7*Ta9Mo4^Vg1Ni8%Lr3Ch6QeBw";
        assert!(secret.len() >= MIN_SESSION_SECRET_LENGTH);
        assert!(validate_secret_strength(secret, "K").is_ok());
        assert!(validate_session_secret(&SecretString::from(secret), "K").is_ok());
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let secret = SecretString::from("q7G$v2Lm9!Xc4Rt8#Wb1Zp6&Hn3Kd5@");
        assert!(validate_session_secret(&secret, "K").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(" TRUE ", "K").unwrap());
        assert!(!parse_bool("off", "K").unwrap());
        assert!(matches!(
            parse_bool("maybe", "K"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_default_fee_is_fifteen() {
        assert_eq!(default_delivery_fee().to_string(), "15.00");
    }
}
