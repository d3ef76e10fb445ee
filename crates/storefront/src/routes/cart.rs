//! Cart route handlers.
//!
//! The cart itself lives in the in-memory cart registry; the session only
//! holds its token. Mutations redirect back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use menuboard_core::{Cart, ItemId, Price};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CurrentSubject, cart_token, ensure_cart_token};
use crate::routes::PageContext;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub image_url: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Price,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            subtotal: Price::ZERO,
            item_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    item_id: line.item().id.to_string(),
                    name: line.item().name.clone(),
                    quantity: line.quantity(),
                    unit_price: line.item().unit_price,
                    line_total: line.line_total(),
                    image_url: line.item().image_url.clone(),
                })
                .collect(),
            subtotal: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub item_id: ItemId,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: ItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Read-only view of this session's cart.
pub(crate) async fn current_cart(state: &AppState, session: &Session) -> Result<CartView> {
    let Some(token) = cart_token(session).await? else {
        return Ok(CartView::empty());
    };
    Ok(match state.carts().existing(token).await {
        Some(cart) => CartView::from(&*cart.lock().await),
        None => CartView::empty(),
    })
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentSubject(account): CurrentSubject,
) -> Result<CartShowTemplate> {
    let cart = current_cart(&state, &session).await?;
    Ok(CartShowTemplate {
        page: PageContext::load(&state, &session, account.as_ref()).await,
        cart,
    })
}

/// Add an active item to the cart.
///
/// The item's name and price are captured now; later catalog edits do not
/// change this cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let item = state.catalog().active_item(form.item_id).await?;
    let token = ensure_cart_token(&session).await?;
    let cart = state.carts().cart(token).await;
    cart.lock()
        .await
        .add(item.to_entry().snapshot(), form.quantity.unwrap_or(1));

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("item_id", &form.item_id.to_string())]),
    );
    Ok(Redirect::to("/cart"))
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse> {
    if let Some(token) = cart_token(&session).await?
        && let Some(cart) = state.carts().existing(token).await
    {
        cart.lock().await.set_quantity(form.item_id, form.quantity);
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    if let Some(token) = cart_token(&session).await?
        && let Some(cart) = state.carts().existing(token).await
    {
        cart.lock().await.remove(form.item_id);
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    if let Some(token) = cart_token(&session).await?
        && let Some(cart) = state.carts().existing(token).await
    {
        cart.lock().await.clear();
    }
    Ok(Redirect::to("/cart"))
}

/// Cart count badge.
#[instrument(skip_all)]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let token = cart_token(&session).await?;
    Ok(CartCountTemplate {
        count: state.carts().item_count(token).await,
    })
}
