//! Session-scoped cart engine.
//!
//! A [`Cart`] is an ordered list of lines, one per distinct item. It is the
//! single source of truth for the cart subtotal and the badge count; pages
//! only read [`Cart::total`] and [`Cart::item_count`].
//!
//! No operation here fails. Quantities are clamped at the boundary and
//! unknown item ids are ignored.

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, Price};

/// Upper bound for a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// The fields of a catalog item a cart needs, captured when it is added.
///
/// The cart never goes back to the catalog to refresh these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: Option<String>,
}

/// One item in the cart with its quantity. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    item: ItemSnapshot,
    quantity: u32,
}

impl CartLine {
    #[must_use]
    pub const fn item(&self) -> &ItemSnapshot {
        &self.item
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.unit_price.times(self.quantity)
    }
}

/// Ordered collection of cart lines, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` of `item`.
    ///
    /// An existing line for the same id is incremented in place and keeps
    /// its original snapshot and position; otherwise a new line is appended.
    /// A non-positive quantity does nothing.
    pub fn add(&mut self, item: ItemSnapshot, quantity: i64) {
        let Some(quantity) = clamp_quantity(quantity) else {
            return;
        };

        if let Some(line) = self.line_mut(item.id) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
        } else {
            self.lines.push(CartLine { item, quantity });
        }
    }

    /// Delete the line for `item_id`, if any.
    pub fn remove(&mut self, item_id: ItemId) {
        self.lines.retain(|line| line.item.id != item_id);
    }

    /// Replace a line's quantity without moving it.
    ///
    /// Zero or below removes the line. Unknown ids are ignored.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: i64) {
        match clamp_quantity(quantity) {
            None => self.remove(item_id),
            Some(quantity) => {
                if let Some(line) = self.line_mut(item_id) {
                    line.quantity = quantity;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `unit_price × quantity` over every line. Zero when empty.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of line quantities (not the number of lines).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, item_id: ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item.id == item_id)
    }

    fn line_mut(&mut self, item_id: ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.item.id == item_id)
    }
}

fn clamp_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        return None;
    }
    let capped = quantity.min(i64::from(MAX_LINE_QUANTITY));
    u32::try_from(capped).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn item(name: &str, cents: i64) -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId::new(),
            name: name.to_owned(),
            unit_price: Price::from_cents(cents).unwrap(),
            image_url: None,
        }
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_merges_same_item() {
        let burger = item("X-Burger", 1800);
        let mut cart = Cart::new();
        cart.add(burger.clone(), 1);
        cart.add(burger.clone(), 2);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.get(burger.id).unwrap().quantity(), 3);
    }

    #[test]
    fn test_add_non_positive_is_noop() {
        let mut cart = Cart::new();
        cart.add(item("Suco", 700), 0);
        cart.add(item("Suco", 700), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_keeps_first_snapshot_and_order() {
        let soda = item("Soda", 500);
        let fries = item("Fries", 1200);
        let mut cart = Cart::new();
        cart.add(soda.clone(), 1);
        cart.add(fries.clone(), 1);

        let mut repriced = soda.clone();
        repriced.unit_price = Price::from_cents(900).unwrap();
        cart.add(repriced, 1);

        let ids: Vec<ItemId> = cart.lines().iter().map(|l| l.item().id).collect();
        assert_eq!(ids, vec![soda.id, fries.id]);
        assert_eq!(cart.lines()[0].item().unit_price, soda.unit_price);
    }

    #[test]
    fn test_set_quantity_in_place() {
        let a = item("A", 100);
        let b = item("B", 200);
        let mut cart = Cart::new();
        cart.add(a.clone(), 1);
        cart.add(b.clone(), 1);
        cart.set_quantity(a.id, 5);

        assert_eq!(cart.lines()[0].item().id, a.id);
        assert_eq!(cart.lines()[0].quantity(), 5);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let a = item("A", 100);
        let mut cart = Cart::new();
        cart.add(a.clone(), 3);
        cart.set_quantity(a.id, 0);
        assert!(cart.get(a.id).is_none());

        cart.add(a.clone(), 3);
        cart.set_quantity(a.id, -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut cart = Cart::new();
        cart.add(item("A", 100), 1);
        let before = cart.clone();
        cart.remove(ItemId::new());
        cart.set_quantity(ItemId::new(), 4);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_quantity_is_capped() {
        let a = item("A", 100);
        let mut cart = Cart::new();
        cart.add(a.clone(), i64::MAX);
        cart.add(a.clone(), 10);
        assert_eq!(cart.get(a.id).unwrap().quantity(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_item_count_vs_total() {
        let a = item("A", 1250);
        let b = item("B", 300);
        let mut cart = Cart::new();
        cart.add(a.clone(), 2);
        cart.add(b.clone(), 3);

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.line_count(), 2);
        assert_eq!(
            cart.total(),
            a.unit_price.times(2) + b.unit_price.times(3)
        );
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item("A", 100), 2);
        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_empty());
    }

    /// Drive a long pseudo-random mix of operations and check the line
    /// invariants after every step.
    #[test]
    fn test_invariants_hold_over_random_sequences() {
        let items: Vec<ItemSnapshot> = (0..5)
            .map(|i| item(&format!("item-{i}"), 100 * (i + 1)))
            .collect();

        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            seed >> 33
        };

        let mut cart = Cart::new();
        for _ in 0..2_000 {
            let pick = &items[usize::try_from(next() % 5).unwrap()];
            let qty = i64::try_from(next() % 9).unwrap() - 3;
            match next() % 4 {
                0 | 1 => cart.add(pick.clone(), qty),
                2 => cart.set_quantity(pick.id, qty),
                _ => cart.remove(pick.id),
            }

            let mut seen = HashSet::new();
            for line in cart.lines() {
                assert!(seen.insert(line.item().id), "duplicate line");
                assert!(line.quantity() >= 1);
                assert!(line.quantity() <= MAX_LINE_QUANTITY);
            }
            let expected: Price = cart.lines().iter().map(CartLine::line_total).sum();
            assert_eq!(cart.total(), expected);
            let count: u64 = cart.lines().iter().map(|l| u64::from(l.quantity())).sum();
            assert_eq!(cart.item_count(), count);
        }
    }
}
