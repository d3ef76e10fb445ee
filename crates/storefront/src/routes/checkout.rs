//! Checkout: delivery choice, totals and order submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use menuboard_core::order::DeliverySelection;
use menuboard_core::{Cart, DeliveryMode, Price};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Authorized, CanCheckout, cart_token};
use crate::models::CurrentAccount;
use crate::routes::PageContext;
use crate::routes::cart::CartView;
use crate::services::{CartHandle, OrderError};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub mode: DeliveryMode,
    pub address: Option<String>,
}

/// Query parameters for the checkout page.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    pub mode: Option<DeliveryMode>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub delivery_selected: bool,
    pub address: String,
    pub delivery_fee: Price,
    pub fee_applied: Price,
    pub total: Price,
    pub error: Option<String>,
}

impl CheckoutTemplate {
    fn new(
        state: &AppState,
        page: PageContext,
        cart: &Cart,
        mode: DeliveryMode,
        address: String,
        error: Option<String>,
    ) -> Self {
        let totals = state.orders().quote(cart, mode);
        Self {
            page,
            cart: CartView::from(cart),
            delivery_selected: mode == DeliveryMode::Delivery,
            address,
            delivery_fee: state.config().delivery_fee,
            fee_applied: totals.delivery_fee,
            total: totals.total,
            error,
        }
    }
}

async fn session_cart(state: &AppState, session: &Session) -> Result<Option<CartHandle>> {
    let Some(token) = cart_token(session).await? else {
        return Ok(None);
    };
    Ok(state.carts().existing(token).await)
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, session, account), fields(account_id = %account.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanCheckout>,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response> {
    let Some(handle) = session_cart(&state, &session).await? else {
        return Ok(Redirect::to("/cart").into_response());
    };
    let cart = handle.lock().await.clone();
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let page = PageContext::load(&state, &session, Some(&account)).await;
    let address = default_address(&account, None);
    Ok(CheckoutTemplate::new(
        &state,
        page,
        &cart,
        query.mode.unwrap_or_default(),
        address,
        None,
    )
    .into_response())
}

/// Submit the order.
///
/// On success the cart is empty and the customer lands on their order
/// history. A form problem re-renders the page with the cart untouched.
#[instrument(skip(state, session, account), fields(account_id = %account.id))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanCheckout>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(handle) = session_cart(&state, &session).await? else {
        return Err(OrderError::EmptyCart.into());
    };
    let selection = DeliverySelection {
        mode: form.mode,
        address: form.address.clone(),
    };

    let mut cart = handle.lock().await;
    let outcome = state
        .orders()
        .submit(&mut cart, Some(&account), &selection)
        .await;
    match outcome {
        Ok(order) => {
            let reference = order.id.short();
            add_breadcrumb("order", "Placed order", Some(&[("order_id", &reference)]));
            Ok(Redirect::to(&format!("/orders?placed={reference}")).into_response())
        }
        Err(OrderError::Validation(e)) => {
            let snapshot = cart.clone();
            drop(cart);
            let page = PageContext::load(&state, &session, Some(&account)).await;
            let address = default_address(&account, form.address.as_deref());
            let template = CheckoutTemplate::new(
                &state,
                page,
                &snapshot,
                form.mode,
                address,
                Some(capitalize(&e.to_string())),
            );
            Ok((StatusCode::BAD_REQUEST, template).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Address to prefill: what was typed, else the account's saved address.
fn default_address(account: &CurrentAccount, typed: Option<&str>) -> String {
    typed
        .map(str::to_owned)
        .or_else(|| account.address.clone())
        .unwrap_or_default()
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menuboard_core::{AccountId, Email, Role};

    use super::*;

    fn account(address: Option<&str>) -> CurrentAccount {
        CurrentAccount {
            id: AccountId::new(),
            email: Email::parse("ana@example.com").unwrap(),
            name: "Ana".to_owned(),
            role: Role::Customer,
            address: address.map(str::to_owned),
        }
    }

    #[test]
    fn test_typed_address_wins_over_saved() {
        let saved = account(Some("Rua A, 10"));
        assert_eq!(default_address(&saved, Some("Rua B, 20")), "Rua B, 20");
        assert_eq!(default_address(&saved, None), "Rua A, 10");
        assert_eq!(default_address(&account(None), None), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("delivery address is required"), "Delivery address is required");
        assert_eq!(capitalize(""), "");
    }
}
