//! Menu listing and item detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tower_sessions::Session;
use tracing::instrument;

use menuboard_core::catalog::{CatalogQuery, MenuEntry};
use menuboard_core::{CategoryId, ItemId, Price};

use crate::error::Result;
use crate::filters;
use crate::middleware::CurrentSubject;
use crate::models::{CatalogItem, Category};
use crate::routes::PageContext;
use crate::state::AppState;

/// Menu entry display data for templates.
#[derive(Clone)]
pub struct MenuEntryView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl MenuEntryView {
    fn new(entry: &MenuEntry, categories: &[Category]) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            price: entry.price,
            image_url: entry.image_url.clone(),
            category: category_name(categories, entry.category_id),
        }
    }
}

/// Category filter option.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

pub(crate) fn category_name(categories: &[Category], id: Option<CategoryId>) -> Option<String> {
    let id = id?;
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
}

pub(crate) fn category_options(
    categories: &[Category],
    selected: Option<CategoryId>,
) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id.to_string(),
            name: c.name.clone(),
            selected: Some(c.id) == selected,
        })
        .collect()
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct MenuTemplate {
    pub page: PageContext,
    pub entries: Vec<MenuEntryView>,
    pub categories: Vec<CategoryOption>,
    pub search: String,
    pub filtered: bool,
}

/// Item detail template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/show.html")]
pub struct ItemTemplate {
    pub page: PageContext,
    pub item: MenuEntryView,
}

/// Display the menu, filtered by search text and category.
#[instrument(skip_all, fields(search = ?query.search, category = ?query.category))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CurrentSubject(account): CurrentSubject,
    Query(query): Query<CatalogQuery>,
) -> Result<MenuTemplate> {
    let catalog = state.catalog();
    let entries = catalog.browse(&query).await?;
    let categories = catalog.categories().await?;

    Ok(MenuTemplate {
        page: PageContext::load(&state, &session, account.as_ref()).await,
        entries: entries
            .iter()
            .map(|e| MenuEntryView::new(e, &categories))
            .collect(),
        categories: category_options(&categories, query.category),
        search: query.search.clone().unwrap_or_default(),
        filtered: query.is_filtered(),
    })
}

/// Display one active item.
#[instrument(skip(state, session, account))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentSubject(account): CurrentSubject,
    Path(id): Path<ItemId>,
) -> Result<ItemTemplate> {
    let catalog = state.catalog();
    let item: CatalogItem = catalog.active_item(id).await?;
    let categories = catalog.categories().await?;

    Ok(ItemTemplate {
        page: PageContext::load(&state, &session, account.as_ref()).await,
        item: MenuEntryView::new(&item.to_entry(), &categories),
    })
}
