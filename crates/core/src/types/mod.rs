//! Core types for Menuboard.
//!
//! This module provides type-safe wrappers for the ordering domain.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::{DeliveryMode, OrderStatus, ParseEnumError, Role};

/// Malformed user input caught before it reaches a store.
///
/// These are recovered locally: the form is shown again with the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid price")]
    InvalidPrice(String),
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("quantity must be a whole number between 1 and {max}")]
    InvalidQuantity { max: u32 },
    #[error("{0} is required")]
    EmptyField(&'static str),
    #[error("a delivery address is required for delivery orders")]
    MissingDeliveryAddress,
}
