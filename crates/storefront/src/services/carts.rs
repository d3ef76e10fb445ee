//! Per-visitor carts held in process memory.
//!
//! Each browsing session gets a random [`CartToken`] stored in its session;
//! the token keys a cart in a `moka` cache. Carts idle for two hours are
//! evicted and nothing survives a restart.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use menuboard_core::Cart;

/// Idle time after which a cart is dropped.
pub const CART_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Opaque key for one visitor's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartToken(Uuid);

impl CartToken {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CartToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Shared handle to one cart. Lock it for the duration of a request.
pub type CartHandle = Arc<Mutex<Cart>>;

/// All live carts.
#[derive(Clone)]
pub struct CartRegistry {
    carts: Cache<CartToken, CartHandle>,
}

impl CartRegistry {
    #[must_use]
    pub fn new(max_carts: u64, idle_timeout: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(max_carts)
            .time_to_idle(idle_timeout)
            .build();
        Self { carts }
    }

    /// The cart for `token`, created empty on first use.
    pub async fn cart(&self, token: CartToken) -> CartHandle {
        self.carts
            .get_with(token, async { Arc::new(Mutex::new(Cart::new())) })
            .await
    }

    /// The cart for `token` only if one exists.
    pub async fn existing(&self, token: CartToken) -> Option<CartHandle> {
        self.carts.get(&token).await
    }

    /// Badge count without creating a cart.
    pub async fn item_count(&self, token: Option<CartToken>) -> u64 {
        let Some(token) = token else {
            return 0;
        };
        match self.existing(token).await {
            Some(cart) => cart.lock().await.item_count(),
            None => 0,
        }
    }

    pub async fn discard(&self, token: CartToken) {
        self.carts.invalidate(&token).await;
    }
}

impl Default for CartRegistry {
    fn default() -> Self {
        Self::new(100_000, CART_IDLE_TIMEOUT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menuboard_core::{ItemId, ItemSnapshot, Price};

    use super::*;

    fn snapshot() -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId::new(),
            name: "Tapioca".to_owned(),
            unit_price: Price::from_cents(900).unwrap(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_same_token_same_cart() {
        let registry = CartRegistry::default();
        let token = CartToken::generate();

        registry.cart(token).await.lock().await.add(snapshot(), 2);
        assert_eq!(registry.item_count(Some(token)).await, 2);

        let other = CartToken::generate();
        assert_eq!(registry.item_count(Some(other)).await, 0);
        assert!(registry.existing(other).await.is_none());
    }

    #[tokio::test]
    async fn test_discard() {
        let registry = CartRegistry::default();
        let token = CartToken::generate();
        registry.cart(token).await.lock().await.add(snapshot(), 1);
        registry.discard(token).await;
        assert_eq!(registry.item_count(Some(token)).await, 0);
        assert_eq!(registry.item_count(None).await, 0);
    }
}
