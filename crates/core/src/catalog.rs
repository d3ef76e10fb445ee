//! Menu listing filter.

use serde::{Deserialize, Deserializer};

use crate::cart::ItemSnapshot;
use crate::types::{CategoryId, ItemId, Price};

/// A menu item as the listing sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: bool,
}

impl MenuEntry {
    /// Capture what a cart line needs from this entry.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            name: self.name.clone(),
            unit_price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

/// Listing filters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: Option<String>,
    /// The "all categories" option submits an empty value.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<CategoryId>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<CategoryId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl CatalogQuery {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.search_term().is_some() || self.category.is_some()
    }

    /// Whether `entry` passes the search and category filters.
    #[must_use]
    pub fn matches(&self, entry: &MenuEntry) -> bool {
        if let Some(category) = self.category
            && entry.category_id != Some(category)
        {
            return false;
        }
        self.search_term().is_none_or(|term| {
            entry.name.to_lowercase().contains(&term)
                || entry.description.to_lowercase().contains(&term)
        })
    }
}

/// Active entries that pass `query`, sorted by name.
#[must_use]
pub fn filter_items(entries: Vec<MenuEntry>, query: &CatalogQuery) -> Vec<MenuEntry> {
    let mut out: Vec<MenuEntry> = entries
        .into_iter()
        .filter(|e| e.active && query.matches(e))
        .collect();
    out.sort_by_key(|e| e.name.to_lowercase());
    out
}
