//! Categories and menu items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use menuboard_core::catalog::MenuEntry;
use menuboard_core::{CategoryId, ItemId, Price, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

/// A menu item as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Inactive items stay in the admin list but are hidden from customers.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    #[must_use]
    pub fn to_entry(&self) -> MenuEntry {
        MenuEntry {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            category_id: self.category_id,
            active: self.active,
        }
    }
}

/// Validated fields for creating or updating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: bool,
}

impl ItemDraft {
    /// Validate raw form text.
    ///
    /// Name is required; description and image URL are trimmed and blank
    /// image URLs become `None`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyField`] for a blank name, or any error from
    /// [`Price::parse`].
    pub fn parse(
        name: &str,
        description: &str,
        price: &str,
        image_url: Option<&str>,
        category_id: Option<CategoryId>,
        active: bool,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        Ok(Self {
            name: name.to_owned(),
            description: description.trim().to_owned(),
            price: Price::parse(price)?,
            image_url: image_url
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            category_id,
            active,
        })
    }
}
