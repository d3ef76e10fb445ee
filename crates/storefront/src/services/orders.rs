//! Order submission and history.
//!
//! Submission turns the caller's cart into one order header plus one line
//! per cart line. The steps run strictly in sequence:
//!
//! 1. the subject must be logged in
//! 2. the cart must not be empty
//! 3. a delivery order must carry an address
//! 4. totals are recomputed from the cart
//! 5. the header is written, and only after it succeeds, the lines
//! 6. the cart is cleared
//!
//! A failure at step 5b leaves a header with no lines. That case is
//! reported as [`OrderError::PartialOrder`], never as a clean failure.

use thiserror::Error;
use tracing::instrument;

use menuboard_core::access::{self, Capability, Denial};
use menuboard_core::order::{DeliverySelection, DraftError, OrderDraft, OrderTotals};
use menuboard_core::{Cart, DeliveryMode, OrderId, OrderStatus, Price, ValidationError};

use crate::db::{OrderStore, StoreError};
use crate::models::{CurrentAccount, NewOrder, Order, OrderLine};

/// Tunables for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSettings {
    /// Flat fee added to delivery orders.
    pub delivery_fee: Price,
    /// Delete the header when its lines could not be written.
    pub compensate_partial_orders: bool,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            delivery_fee: crate::config::default_delivery_fee(),
            compensate_partial_orders: true,
        }
    }
}

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No logged-in account. The cart is left untouched.
    #[error("not logged in")]
    Unauthenticated,

    /// The account may not place orders.
    #[error("not allowed to place orders")]
    Forbidden,

    /// Nothing to order. No store writes were made.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout form problem.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The header was written but its lines were not.
    #[error("order {order_id} was saved without its lines")]
    PartialOrder {
        order_id: OrderId,
        /// Whether the orphaned header was deleted again.
        compensated: bool,
        #[source]
        source: StoreError,
    },

    /// The store failed before anything was written, or on a read.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("order not found")]
    NotFound,

    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<DraftError> for OrderError {
    fn from(e: DraftError) -> Self {
        match e {
            DraftError::EmptyCart => Self::EmptyCart,
            DraftError::Validation(v) => Self::Validation(v),
        }
    }
}

impl From<Denial> for OrderError {
    fn from(d: Denial) -> Self {
        match d {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

/// Order service over any order store.
pub struct OrderService<'a, S: OrderStore + ?Sized> {
    orders: &'a S,
    settings: OrderSettings,
}

impl<'a, S: OrderStore + ?Sized> OrderService<'a, S> {
    #[must_use]
    pub const fn new(orders: &'a S, settings: OrderSettings) -> Self {
        Self { orders, settings }
    }

    /// Totals the checkout page shows for `mode`.
    #[must_use]
    pub fn quote(&self, cart: &Cart, mode: DeliveryMode) -> OrderTotals {
        OrderTotals::compute(cart, mode, self.settings.delivery_fee)
    }

    /// Place an order for the cart and clear it.
    ///
    /// The cart is only cleared on success.
    ///
    /// # Errors
    ///
    /// See [`OrderError`]. `Unauthenticated`, `EmptyCart` and `Validation`
    /// are detected before any write.
    #[instrument(skip_all, fields(mode = %selection.mode, lines = cart.line_count()))]
    pub async fn submit(
        &self,
        cart: &mut Cart,
        subject: Option<&CurrentAccount>,
        selection: &DeliverySelection,
    ) -> Result<Order, OrderError> {
        access::authorize(subject.map(|s| s.role), Capability::Checkout)?;
        let account = subject.ok_or(OrderError::Unauthenticated)?;

        let draft = OrderDraft::from_cart(cart, account.id, selection, self.settings.delivery_fee)?;
        let (header, lines) = NewOrder::from_draft(&draft);

        let mut order = self
            .orders
            .insert_order(&header)
            .await
            .map_err(OrderError::StoreUnavailable)?;

        if let Err(source) = self.orders.insert_order_lines(order.id, &lines).await {
            let compensated = self.compensate(order.id).await;
            tracing::error!(
                order_id = %order.id,
                account_id = %account.id,
                compensated,
                error = %source,
                "order lines failed after header was written"
            );
            return Err(OrderError::PartialOrder {
                order_id: order.id,
                compensated,
                source,
            });
        }

        order.lines = lines
            .into_iter()
            .map(|line| OrderLine {
                id: line.id,
                order_id: order.id,
                item_id: Some(line.item_id),
                item_name: line.item_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        cart.clear();

        tracing::info!(
            order_id = %order.id,
            account_id = %account.id,
            total = %order.total,
            "order placed"
        );
        Ok(order)
    }

    async fn compensate(&self, order_id: OrderId) -> bool {
        if !self.settings.compensate_partial_orders {
            return false;
        }
        match self.orders.delete_order(order_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "compensating delete failed");
                false
            }
        }
    }

    /// The subject's orders, newest first.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a subject, `StoreUnavailable` if the
    /// store fails.
    pub async fn history(&self, subject: Option<&CurrentAccount>) -> Result<Vec<Order>, OrderError> {
        access::authorize(subject.map(|s| s.role), Capability::ViewOwnOrders)?;
        let account = subject.ok_or(OrderError::Unauthenticated)?;
        self.orders
            .orders_for_account(account.id)
            .await
            .map_err(OrderError::StoreUnavailable)
    }

    /// Move an order to a new status, enforcing the lifecycle.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown order, `InvalidTransition` if the current
    /// status cannot move to `next`.
    #[instrument(skip(self))]
    pub async fn transition(&self, order_id: OrderId, next: OrderStatus) -> Result<(), OrderError> {
        let order = self
            .orders
            .find_order(order_id)
            .await
            .map_err(OrderError::StoreUnavailable)?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }
        self.orders
            .set_order_status(order_id, next)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => OrderError::NotFound,
                other => OrderError::StoreUnavailable(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use menuboard_core::{Email, ItemId, ItemSnapshot};

    use super::*;
    use crate::db::{AccountStore, MemoryStore};
    use crate::models::NewAccount;

    fn just_after_now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now() + chrono::Duration::seconds(1)
    }

    fn settings() -> OrderSettings {
        OrderSettings {
            delivery_fee: Price::from_cents(1500).unwrap(),
            compensate_partial_orders: true,
        }
    }

    async fn customer(store: &MemoryStore) -> CurrentAccount {
        let account = store
            .create_account(NewAccount {
                email: Email::parse("cliente@example.com").unwrap(),
                name: "Cliente".to_owned(),
                phone: None,
                address: Some("Rua A, 1".to_owned()),
                password_hash: "x".to_owned(),
            })
            .await
            .unwrap();
        CurrentAccount::from(&account)
    }

    fn cart_of(cents: i64, quantity: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add(
            ItemSnapshot {
                id: ItemId::new(),
                name: "Feijoada".to_owned(),
                unit_price: Price::from_cents(cents).unwrap(),
                image_url: None,
            },
            quantity,
        );
        cart
    }

    #[tokio::test]
    async fn test_delivery_order_total_includes_fee() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        let service = OrderService::new(&store, settings());
        let mut cart = cart_of(4250, 1);

        let order = service
            .submit(&mut cart, Some(&subject), &DeliverySelection::delivery("Rua A, 1"))
            .await
            .unwrap();

        assert_eq!(order.total.to_string(), "57.50");
        assert_eq!(order.delivery_fee.to_string(), "15.00");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.delivery_address.as_deref(), Some("Rua A, 1"));
        assert_eq!(cart.item_count(), 0);

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total.to_string(), "57.50");
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].unit_price.to_string(), "42.50");
    }

    #[tokio::test]
    async fn test_one_line_per_cart_line_with_captured_prices() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        let mut cart = cart_of(1000, 2);
        cart.add(
            ItemSnapshot {
                id: ItemId::new(),
                name: "Guarana".to_owned(),
                unit_price: Price::from_cents(650).unwrap(),
                image_url: None,
            },
            3,
        );

        let order = OrderService::new(&store, settings())
            .submit(&mut cart, Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap();

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.total.to_string(), "39.50");
        assert_eq!(stored.lines_subtotal(), stored.total);
        assert!(stored.delivery_fee.is_zero());
        assert_eq!(stored.delivery_address, None);
    }

    #[tokio::test]
    async fn test_unauthenticated_keeps_cart() {
        let store = MemoryStore::new();
        let mut cart = cart_of(1000, 2);
        let err = OrderService::new(&store, settings())
            .submit(&mut cart, None, &DeliverySelection::in_venue())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthenticated));
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        // An armed fault would fire if a header write were attempted.
        store.fail_next_order_insert();

        let err = OrderService::new(&store, settings())
            .submit(&mut Cart::new(), Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
        assert_eq!(store.order_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_missing_address_is_validation_error() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        let mut cart = cart_of(1000, 1);
        let err = OrderService::new(&store, settings())
            .submit(&mut cart, Some(&subject), &DeliverySelection::delivery(" "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Validation(ValidationError::MissingDeliveryAddress)
        ));
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn test_header_failure_is_clean() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        store.fail_next_order_insert();
        let mut cart = cart_of(1000, 1);

        let err = OrderService::new(&store, settings())
            .submit(&mut cart, Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::StoreUnavailable(_)));
        assert_eq!(cart.line_count(), 1);
        assert_eq!(store.order_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_line_failure_reports_partial_and_compensates() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        store.fail_next_line_insert();
        let mut cart = cart_of(1000, 1);

        let err = OrderService::new(&store, settings())
            .submit(&mut cart, Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap_err();

        let OrderError::PartialOrder {
            order_id,
            compensated,
            ..
        } = err
        else {
            panic!("expected PartialOrder, got {err:?}");
        };
        assert!(compensated);
        assert!(store.find_order(order_id).await.unwrap().is_none());
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_order_left_for_reconciliation() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        store.fail_next_line_insert();
        let mut cart = cart_of(1000, 1);
        let no_compensation = OrderSettings {
            compensate_partial_orders: false,
            ..settings()
        };

        let err = OrderService::new(&store, no_compensation)
            .submit(&mut cart, Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::PartialOrder {
                compensated: false,
                ..
            }
        ));

        let orphans = store.orders_without_lines(just_after_now()).await.unwrap();
        assert_eq!(orphans.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_compensation_still_partial() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        store.fail_next_line_insert();
        store.fail_next_order_delete();
        let mut cart = cart_of(1000, 1);

        let err = OrderService::new(&store, settings())
            .submit(&mut cart, Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::PartialOrder {
                compensated: false,
                ..
            }
        ));
        assert_eq!(store.orders_without_lines(just_after_now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_own_orders_newest_first() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        let service = OrderService::new(&store, settings());

        let first = service
            .submit(&mut cart_of(100, 1), Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap();
        let second = service
            .submit(&mut cart_of(200, 1), Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap();

        let history = service.history(Some(&subject)).await.unwrap();
        let ids: Vec<OrderId> = history.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
        assert!(history[0].created_at >= history[1].created_at);

        assert!(matches!(
            service.history(None).await,
            Err(OrderError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let store = MemoryStore::new();
        let subject = customer(&store).await;
        let service = OrderService::new(&store, settings());
        let order = service
            .submit(&mut cart_of(100, 1), Some(&subject), &DeliverySelection::in_venue())
            .await
            .unwrap();

        service
            .transition(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        let err = service
            .transition(order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Cancelled
            }
        ));
        assert!(matches!(
            service.transition(OrderId::new(), OrderStatus::Completed).await,
            Err(OrderError::NotFound)
        ));
    }
}
