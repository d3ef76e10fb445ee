//! Order totals and the write-ready form of a submitted cart.
//!
//! [`OrderDraft::from_cart`] is the pure half of order submission: it checks
//! the cart and delivery selection and fixes every number that will be
//! stored. The storefront's order service performs the writes.

use crate::cart::Cart;
use crate::types::{AccountId, DeliveryMode, ItemId, Price, ValidationError};

/// Delivery fee in the observed configuration.
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 1500;

/// Customer's choice on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySelection {
    pub mode: DeliveryMode,
    /// Address typed on the form. Ignored for in-venue orders.
    pub address: Option<String>,
}

impl DeliverySelection {
    #[must_use]
    pub const fn in_venue() -> Self {
        Self {
            mode: DeliveryMode::InVenue,
            address: None,
        }
    }

    #[must_use]
    pub fn delivery(address: impl Into<String>) -> Self {
        Self {
            mode: DeliveryMode::Delivery,
            address: Some(address.into()),
        }
    }

    /// The address to persist: trimmed and required for delivery, always
    /// `None` in venue.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingDeliveryAddress`] for a delivery order with
    /// a blank or missing address.
    pub fn resolved_address(&self) -> Result<Option<String>, ValidationError> {
        match self.mode {
            DeliveryMode::InVenue => Ok(None),
            DeliveryMode::Delivery => self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| Some(a.to_owned()))
                .ok_or(ValidationError::MissingDeliveryAddress),
        }
    }
}

/// Fee charged for a mode.
#[must_use]
pub const fn delivery_fee(mode: DeliveryMode, configured_fee: Price) -> Price {
    match mode {
        DeliveryMode::InVenue => Price::ZERO,
        DeliveryMode::Delivery => configured_fee,
    }
}

/// Amounts shown at checkout and written on the order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    #[must_use]
    pub fn compute(cart: &Cart, mode: DeliveryMode, configured_fee: Price) -> Self {
        let subtotal = cart.total();
        let fee = delivery_fee(mode, configured_fee);
        Self {
            subtotal,
            delivery_fee: fee,
            total: subtotal + fee,
        }
    }
}

/// One line to write, with the price captured now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub item_id: ItemId,
    /// Name at the time of purchase, kept on the stored line.
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

/// Why a cart could not become a draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("cart is empty")]
    EmptyCart,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Everything the order header and lines will contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub account_id: AccountId,
    pub mode: DeliveryMode,
    pub delivery_address: Option<String>,
    pub totals: OrderTotals,
    pub lines: Vec<DraftLine>,
}

impl OrderDraft {
    /// Build a draft from a cart snapshot.
    ///
    /// The total is recomputed here from line prices; nothing the client
    /// sent is trusted.
    ///
    /// # Errors
    ///
    /// [`DraftError::EmptyCart`] if the cart has no lines, checked before the
    /// selection; [`DraftError::Validation`] for a delivery order without an
    /// address.
    pub fn from_cart(
        cart: &Cart,
        account_id: AccountId,
        selection: &DeliverySelection,
        configured_fee: Price,
    ) -> Result<Self, DraftError> {
        if cart.is_empty() {
            return Err(DraftError::EmptyCart);
        }
        let delivery_address = selection.resolved_address()?;

        let lines = cart
            .lines()
            .iter()
            .map(|line| DraftLine {
                item_id: line.item().id,
                item_name: line.item().name.clone(),
                quantity: line.quantity(),
                unit_price: line.item().unit_price,
            })
            .collect();

        Ok(Self {
            account_id,
            mode: selection.mode,
            delivery_address,
            totals: OrderTotals::compute(cart, selection.mode, configured_fee),
            lines,
        })
    }
}
