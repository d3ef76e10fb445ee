//! Menuboard Core - domain library.
//!
//! This crate provides the pieces of the ordering system that hold no I/O:
//! - `storefront` - the web server and persistent store adapters
//! - `cli` - operator tooling for migrations, seeding and reconciliation
//!
//! # Architecture
//!
//! The core crate contains types, the in-memory cart engine, and the role
//! gate. No database access, no HTTP. Everything here is synchronous and
//! deterministic, so the invariants can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, email, price, and role/status enums
//! - [`cart`] - Session-scoped cart engine
//! - [`access`] - Capability table over role tiers
//! - [`catalog`] - Listing filter for the menu
//! - [`order`] - Order totals and submission inputs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod types;

pub use access::{Capability, Denial, authorize};
pub use cart::{Cart, CartLine, ItemSnapshot};
pub use types::*;
