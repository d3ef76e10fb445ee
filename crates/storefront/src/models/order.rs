//! Stored orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use menuboard_core::order::OrderDraft;
use menuboard_core::{
    AccountId, DeliveryMode, ItemId, OrderId, OrderLineId, OrderStatus, Price,
};

/// An order header with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub total: Price,
    pub mode: DeliveryMode,
    pub delivery_fee: Price,
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Sum of the stored line totals, for checking against `total`.
    #[must_use]
    pub fn lines_subtotal(&self) -> Price {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

/// One purchased item, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    /// `None` once the item has been deleted from the catalog.
    pub item_id: Option<ItemId>,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Header insert shape. Ids are assigned here so both stores agree.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub account_id: AccountId,
    pub total: Price,
    pub mode: DeliveryMode,
    pub delivery_fee: Price,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub id: OrderLineId,
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl NewOrder {
    /// Split a draft into the header and line inserts.
    #[must_use]
    pub fn from_draft(draft: &OrderDraft) -> (Self, Vec<NewOrderLine>) {
        let header = Self {
            id: OrderId::new(),
            account_id: draft.account_id,
            total: draft.totals.total,
            mode: draft.mode,
            delivery_fee: draft.totals.delivery_fee,
            delivery_address: draft.delivery_address.clone(),
        };
        let lines = draft
            .lines
            .iter()
            .map(|line| NewOrderLine {
                id: OrderLineId::new(),
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        (header, lines)
    }
}

/// Orders per status, for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderCounts {
    pub pending: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl OrderCounts {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending + self.completed + self.cancelled
    }

    pub const fn record(&mut self, status: OrderStatus, count: u64) {
        match status {
            OrderStatus::Pending => self.pending += count,
            OrderStatus::Completed => self.completed += count,
            OrderStatus::Cancelled => self.cancelled += count,
        }
    }
}
