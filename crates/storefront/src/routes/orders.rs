//! Order history for the logged-in account.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use menuboard_core::{DeliveryMode, OrderStatus, Price};

use crate::error::Result;
use crate::filters;
use crate::middleware::{Authorized, CanViewOrders};
use crate::models::{Order, OrderLine};
use crate::routes::PageContext;
use crate::state::AppState;

/// Timestamp format on the history page.
pub(crate) const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Order line display data for templates.
#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            name: line.item_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub reference: String,
    pub placed_at: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub mode: &'static str,
    pub is_delivery: bool,
    pub delivery_fee: Price,
    pub delivery_address: Option<String>,
    pub total: Price,
    pub lines: Vec<OrderLineView>,
}

pub(crate) const fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Pending",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.id.short(),
            placed_at: order.created_at.format(DATE_FORMAT).to_string(),
            status: status_label(order.status),
            status_class: order.status.as_str(),
            mode: order.mode.label(),
            is_delivery: order.mode == DeliveryMode::Delivery,
            delivery_fee: order.delivery_fee,
            delivery_address: order.delivery_address.clone(),
            total: order.total,
            lines: order.lines.iter().map(OrderLineView::from).collect(),
        }
    }
}

/// Query parameters for the history page.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Reference of an order just placed.
    pub placed: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
    pub placed: Option<String>,
}

/// List the account's orders, newest first.
#[instrument(skip(state, session, account), fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanViewOrders>,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersTemplate> {
    let orders = state.orders().history(Some(&account)).await?;
    Ok(OrdersTemplate {
        page: PageContext::load(&state, &session, Some(&account)).await,
        orders: orders.iter().map(OrderView::from).collect(),
        placed: query
            .placed
            .filter(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_hexdigit())),
    })
}
