//! Admin dashboard and catalog management.
//!
//! Every handler here requires the admin tier. Form problems re-render the
//! page with a 400; everything else redirects back with a notice code.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use menuboard_core::{CategoryId, ItemId, Price};

use crate::db::OrderStore;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Authorized, CanManageCatalog, CanViewDashboard};
use crate::models::{CatalogItem, Category, CurrentAccount, ItemDraft, OrderCounts};
use crate::routes::PageContext;
use crate::routes::catalog::{CategoryOption, category_name, category_options};
use crate::services::CatalogError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Item create/edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct ItemForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    /// Checkbox; absent when unchecked.
    pub active: Option<String>,
}

impl ItemForm {
    fn to_draft(&self) -> std::result::Result<ItemDraft, CatalogError> {
        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<CategoryId>()
                    .map_err(|_| CatalogError::CategoryNotFound)?,
            ),
        };
        Ok(ItemDraft::parse(
            &self.name,
            &self.description,
            &self.price,
            self.image_url.as_deref(),
            category_id,
            self.active.is_some(),
        )?)
    }
}

/// Category form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Query parameters for notices after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

fn notice_text(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "created" => Some("Item created."),
        "updated" => Some("Item updated."),
        "deleted" => Some("Item deleted."),
        "activated" => Some("Item is now visible on the menu."),
        "deactivated" => Some("Item is now hidden from the menu."),
        "category_created" => Some("Category created."),
        _ => None,
    }
}

/// Message for errors the admin can fix by editing the form.
fn form_problem(err: &CatalogError) -> Option<String> {
    match err {
        CatalogError::Validation(e) => Some(e.to_string()),
        CatalogError::CategoryNotFound | CatalogError::DuplicateCategory => Some(err.to_string()),
        CatalogError::ItemNotFound | CatalogError::Store(_) => None,
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Item row for the manager table.
#[derive(Clone)]
pub struct ItemRowView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Option<String>,
    pub active: bool,
}

impl ItemRowView {
    fn new(item: &CatalogItem, categories: &[Category]) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            category: category_name(categories, item.category_id),
            active: item.active,
        }
    }
}

/// Values to prefill the item form with.
#[derive(Clone)]
pub struct ItemFormView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub active: bool,
}

impl ItemFormView {
    fn blank() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            image_url: String::new(),
            active: true,
        }
    }

    fn from_item(item: &CatalogItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.to_string(),
            image_url: item.image_url.clone().unwrap_or_default(),
            active: item.active,
        }
    }

    fn from_form(form: &ItemForm) -> Self {
        Self {
            name: form.name.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            image_url: form.image_url.clone().unwrap_or_default(),
            active: form.active.is_some(),
        }
    }
}

/// Category row with how many items use it.
#[derive(Clone)]
pub struct CategoryRowView {
    pub name: String,
    pub description: String,
    pub item_count: usize,
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub orders: OrderCounts,
    pub item_count: usize,
    pub active_item_count: usize,
    pub category_count: usize,
}

/// Item manager template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/items.html")]
pub struct ItemsTemplate {
    pub page: PageContext,
    pub items: Vec<ItemRowView>,
    pub categories: Vec<CategoryOption>,
    pub form: ItemFormView,
    pub notice: Option<&'static str>,
    pub error: Option<String>,
}

/// Item edit template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/edit_item.html")]
pub struct EditItemTemplate {
    pub page: PageContext,
    pub id: String,
    pub categories: Vec<CategoryOption>,
    pub form: ItemFormView,
    pub error: Option<String>,
}

/// Category manager template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryRowView>,
    pub name: String,
    pub description: String,
    pub notice: Option<&'static str>,
    pub error: Option<String>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Order and catalog counts.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanViewDashboard>,
) -> Result<DashboardTemplate> {
    let orders = state.store().order_counts().await?;
    let catalog = state.catalog();
    let items = catalog.all_items().await?;
    let categories = catalog.categories().await?;

    Ok(DashboardTemplate {
        page: PageContext::load(&state, &session, Some(&account)).await,
        orders,
        item_count: items.len(),
        active_item_count: items.iter().filter(|i| i.active).count(),
        category_count: categories.len(),
    })
}

// =============================================================================
// Items
// =============================================================================

async fn items_page(
    state: &AppState,
    session: &Session,
    account: &CurrentAccount,
    form: ItemFormView,
    selected_category: Option<CategoryId>,
    notice: Option<&'static str>,
    error: Option<String>,
) -> Result<ItemsTemplate> {
    let catalog = state.catalog();
    let items = catalog.all_items().await?;
    let categories = catalog.categories().await?;

    Ok(ItemsTemplate {
        page: PageContext::load(state, session, Some(account)).await,
        items: items
            .iter()
            .map(|i| ItemRowView::new(i, &categories))
            .collect(),
        categories: category_options(&categories, selected_category),
        form,
        notice,
        error,
    })
}

async fn edit_page(
    state: &AppState,
    session: &Session,
    account: &CurrentAccount,
    id: ItemId,
    form: ItemFormView,
    selected_category: Option<CategoryId>,
    error: Option<String>,
) -> Result<EditItemTemplate> {
    let categories = state.catalog().categories().await?;
    Ok(EditItemTemplate {
        page: PageContext::load(state, session, Some(account)).await,
        id: id.to_string(),
        categories: category_options(&categories, selected_category),
        form,
        error,
    })
}

fn form_category(form: &ItemForm) -> Option<CategoryId> {
    form.category_id.as_deref().and_then(|s| s.trim().parse().ok())
}

/// All items, active or not, with the create form.
#[instrument(skip_all)]
pub async fn items(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Query(query): Query<NoticeQuery>,
) -> Result<ItemsTemplate> {
    items_page(
        &state,
        &session,
        &account,
        ItemFormView::blank(),
        None,
        notice_text(query.notice.as_deref()),
        None,
    )
    .await
}

/// Create an item.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create_item(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    let created = match form.to_draft() {
        Ok(draft) => state.catalog().create_item(&draft).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(_) => Ok(Redirect::to("/admin/items?notice=created").into_response()),
        Err(e) => match form_problem(&e) {
            Some(problem) => {
                let page = items_page(
                    &state,
                    &session,
                    &account,
                    ItemFormView::from_form(&form),
                    form_category(&form),
                    None,
                    Some(problem),
                )
                .await?;
                Ok((StatusCode::BAD_REQUEST, page).into_response())
            }
            None => Err(e.into()),
        },
    }
}

/// Edit form for one item.
#[instrument(skip(state, session, account))]
pub async fn edit_item(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Path(id): Path<ItemId>,
) -> Result<EditItemTemplate> {
    let item = state.catalog().item(id).await?;
    edit_page(
        &state,
        &session,
        &account,
        id,
        ItemFormView::from_item(&item),
        item.category_id,
        None,
    )
    .await
}

/// Replace an item's fields.
#[instrument(skip(state, session, account, form))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Path(id): Path<ItemId>,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    let updated = match form.to_draft() {
        Ok(draft) => state.catalog().update_item(id, &draft).await,
        Err(e) => Err(e),
    };
    match updated {
        Ok(_) => Ok(Redirect::to("/admin/items?notice=updated").into_response()),
        Err(e) => match form_problem(&e) {
            Some(problem) => {
                let page = edit_page(
                    &state,
                    &session,
                    &account,
                    id,
                    ItemFormView::from_form(&form),
                    form_category(&form),
                    Some(problem),
                )
                .await?;
                Ok((StatusCode::BAD_REQUEST, page).into_response())
            }
            None => Err(e.into()),
        },
    }
}

/// Delete an item. Past order lines keep their recorded name and price.
#[instrument(skip(state, _auth))]
pub async fn delete_item(
    State(state): State<AppState>,
    _auth: Authorized<CanManageCatalog>,
    Path(id): Path<ItemId>,
) -> Result<Redirect> {
    state.catalog().delete_item(id).await?;
    Ok(Redirect::to("/admin/items?notice=deleted"))
}

/// Show or hide an item on the menu.
#[instrument(skip(state, _auth))]
pub async fn toggle_item(
    State(state): State<AppState>,
    _auth: Authorized<CanManageCatalog>,
    Path(id): Path<ItemId>,
) -> Result<Redirect> {
    let active = state.catalog().toggle_active(id).await?;
    let notice = if active { "activated" } else { "deactivated" };
    Ok(Redirect::to(&format!("/admin/items?notice={notice}")))
}

// =============================================================================
// Categories
// =============================================================================

async fn categories_page(
    state: &AppState,
    session: &Session,
    account: &CurrentAccount,
    form: (String, String),
    notice: Option<&'static str>,
    error: Option<String>,
) -> Result<CategoriesTemplate> {
    let catalog = state.catalog();
    let categories = catalog.categories().await?;
    let items = catalog.all_items().await?;

    Ok(CategoriesTemplate {
        page: PageContext::load(state, session, Some(account)).await,
        categories: categories
            .iter()
            .map(|c| CategoryRowView {
                name: c.name.clone(),
                description: c.description.clone(),
                item_count: items
                    .iter()
                    .filter(|i| i.category_id == Some(c.id))
                    .count(),
            })
            .collect(),
        name: form.0,
        description: form.1,
        notice,
        error,
    })
}

/// Category list with the create form.
#[instrument(skip_all)]
pub async fn categories(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Query(query): Query<NoticeQuery>,
) -> Result<CategoriesTemplate> {
    categories_page(
        &state,
        &session,
        &account,
        (String::new(), String::new()),
        notice_text(query.notice.as_deref()),
        None,
    )
    .await
}

/// Create a category.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create_category(
    State(state): State<AppState>,
    session: Session,
    Authorized { account, .. }: Authorized<CanManageCatalog>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    match state
        .catalog()
        .create_category(&form.name, &form.description)
        .await
    {
        Ok(_) => Ok(Redirect::to("/admin/categories?notice=category_created").into_response()),
        Err(e) => match form_problem(&e) {
            Some(problem) => {
                let page = categories_page(
                    &state,
                    &session,
                    &account,
                    (form.name, form.description),
                    None,
                    Some(problem),
                )
                .await?;
                Ok((StatusCode::BAD_REQUEST, page).into_response())
            }
            None => Err(e.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_form_checkbox_and_blank_category() {
        let form = ItemForm {
            name: "Pastel".to_owned(),
            price: "8,00".to_owned(),
            category_id: Some(String::new()),
            ..ItemForm::default()
        };
        let draft = form.to_draft();
        assert!(matches!(draft, Ok(ref d) if !d.active && d.category_id.is_none()));
    }

    #[test]
    fn test_item_form_rejects_garbage_category() {
        let form = ItemForm {
            name: "Pastel".to_owned(),
            price: "8,00".to_owned(),
            category_id: Some("not-a-uuid".to_owned()),
            active: Some("on".to_owned()),
            ..ItemForm::default()
        };
        assert!(matches!(form.to_draft(), Err(CatalogError::CategoryNotFound)));
    }

    #[test]
    fn test_unknown_notice_codes_are_ignored() {
        assert_eq!(notice_text(Some("created")), Some("Item created."));
        assert_eq!(notice_text(Some("<script>")), None);
        assert_eq!(notice_text(None), None);
    }
}
