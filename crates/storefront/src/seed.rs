//! Load categories and items from YAML.
//!
//! Seeding is idempotent: categories and items are matched by name and
//! existing rows are left alone.
//!
//! ## YAML Format
//!
//! ```yaml
//! categories:
//!   - name: Mains
//!     description: Served with rice and beans
//!
//! items:
//!   - name: Moqueca
//!     description: Fish stew with coconut milk
//!     price: "89,90"
//!     category: Mains
//!     image_url: https://images.example.com/moqueca.jpg
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use menuboard_core::{CategoryId, ValidationError};

use crate::db::{CatalogStore, StoreError};
use crate::models::{ItemDraft, NewCategory};

/// Menu shipped with the binary for demo mode.
pub const DEMO_MENU: &str = include_str!("../seed/menu.yaml");

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("item '{item}': {source}")]
    InvalidItem {
        item: String,
        #[source]
        source: ValidationError,
    },

    #[error("item '{item}' refers to unknown category '{category}'")]
    UnknownCategory { item: String, category: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One category in the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One item in the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Kept as text so `12,50` and `12.50` both work.
    pub price: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Full seed file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedMenu {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub items: Vec<SeedItem>,
}

/// What a seeding run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub categories_created: usize,
    pub items_created: usize,
    /// Rows that already existed by name.
    pub skipped: usize,
}

impl SeedMenu {
    /// # Errors
    ///
    /// Returns `SeedError::Parse` for malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// # Errors
    ///
    /// Returns `SeedError::Io` if the file cannot be read and
    /// `SeedError::Parse` for malformed YAML.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml(&content)
    }

    /// Check every item before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first invalid item or unknown category reference.
    pub fn validate(&self) -> Result<(), SeedError> {
        for item in &self.items {
            if let Some(category) = &item.category
                && !self.categories.iter().any(|c| &c.name == category)
            {
                return Err(SeedError::UnknownCategory {
                    item: item.name.clone(),
                    category: category.clone(),
                });
            }
            draft(item, None)?;
        }
        Ok(())
    }

    /// Write missing categories and items to `catalog`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any write, or `SeedError::Store`
    /// if the store fails part way.
    #[instrument(skip_all, fields(categories = self.categories.len(), items = self.items.len()))]
    pub async fn apply<S: CatalogStore + ?Sized>(
        &self,
        catalog: &S,
    ) -> Result<SeedResult, SeedError> {
        self.validate()?;
        let mut result = SeedResult::default();

        let mut category_ids: HashMap<String, CategoryId> = catalog
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();

        for category in &self.categories {
            if category_ids.contains_key(&category.name) {
                result.skipped += 1;
                continue;
            }
            let created = catalog
                .create_category(NewCategory {
                    name: category.name.trim().to_owned(),
                    description: category.description.trim().to_owned(),
                })
                .await?;
            category_ids.insert(category.name.clone(), created.id);
            result.categories_created += 1;
        }

        let existing: Vec<String> = catalog
            .list_items()
            .await?
            .into_iter()
            .map(|i| i.name)
            .collect();

        for item in &self.items {
            if existing.iter().any(|name| name == item.name.trim()) {
                result.skipped += 1;
                continue;
            }
            let category_id = match &item.category {
                Some(name) => {
                    let id = category_ids.get(name).copied();
                    if id.is_none() {
                        warn!(item = %item.name, category = %name, "category vanished during seeding");
                    }
                    id
                }
                None => None,
            };
            catalog.create_item(&draft(item, category_id)?).await?;
            result.items_created += 1;
        }

        info!(
            categories_created = result.categories_created,
            items_created = result.items_created,
            skipped = result.skipped,
            "seeding complete"
        );
        Ok(result)
    }
}

fn draft(item: &SeedItem, category_id: Option<CategoryId>) -> Result<ItemDraft, SeedError> {
    ItemDraft::parse(
        &item.name,
        &item.description,
        &item.price,
        item.image_url.as_deref(),
        category_id,
        item.active,
    )
    .map_err(|source| SeedError::InvalidItem {
        item: item.name.clone(),
        source,
    })
}
