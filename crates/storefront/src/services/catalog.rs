//! Menu browsing and catalog management.

use thiserror::Error;
use tracing::instrument;

use menuboard_core::catalog::{CatalogQuery, MenuEntry, filter_items};
use menuboard_core::{CategoryId, ItemId, ValidationError};

use crate::db::{CatalogStore, StoreError};
use crate::models::{CatalogItem, Category, ItemDraft, NewCategory};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("item not found")]
    ItemNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error("a category with this name already exists")]
    DuplicateCategory,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Catalog service over any catalog store.
pub struct CatalogService<'a, S: CatalogStore + ?Sized> {
    catalog: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(catalog: &'a S) -> Self {
        Self { catalog }
    }

    /// Active items matching the listing filters, by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn browse(&self, query: &CatalogQuery) -> Result<Vec<MenuEntry>, CatalogError> {
        let entries = self
            .catalog
            .list_active_items()
            .await?
            .iter()
            .map(CatalogItem::to_entry)
            .collect();
        Ok(filter_items(entries, query))
    }

    /// An item customers can see. Inactive items are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` for unknown or inactive items.
    pub async fn active_item(&self, id: ItemId) -> Result<CatalogItem, CatalogError> {
        self.catalog
            .find_item(id)
            .await?
            .filter(|item| item.active)
            .ok_or(CatalogError::ItemNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.catalog.list_categories().await?)
    }

    /// Every item including inactive ones, for the manager.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn all_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.catalog.list_items().await?)
    }

    /// Any item, active or not.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` for unknown ids.
    pub async fn item(&self, id: ItemId) -> Result<CatalogItem, CatalogError> {
        self.catalog
            .find_item(id)
            .await?
            .ok_or(CatalogError::ItemNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if the draft names an
    /// unknown category.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create_item(&self, draft: &ItemDraft) -> Result<CatalogItem, CatalogError> {
        self.check_category(draft.category_id).await?;
        let item = self.catalog.create_item(draft).await?;
        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` or `CatalogError::CategoryNotFound`.
    #[instrument(skip(self, draft))]
    pub async fn update_item(
        &self,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<CatalogItem, CatalogError> {
        self.check_category(draft.category_id).await?;
        self.catalog
            .update_item(id, draft)
            .await
            .map_err(not_found_as(CatalogError::ItemNotFound))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` if nothing was deleted.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<(), CatalogError> {
        if !self.catalog.delete_item(id).await? {
            return Err(CatalogError::ItemNotFound);
        }
        tracing::info!("item deleted");
        Ok(())
    }

    /// Flip an item's active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` for unknown ids.
    #[instrument(skip(self))]
    pub async fn toggle_active(&self, id: ItemId) -> Result<bool, CatalogError> {
        let item = self.item(id).await?;
        let active = !item.active;
        self.catalog
            .set_item_active(id, active)
            .await
            .map_err(not_found_as(CatalogError::ItemNotFound))?;
        Ok(active)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for a blank name and
    /// `CatalogError::DuplicateCategory` if the name is taken.
    #[instrument(skip(self, description))]
    pub async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("category name").into());
        }
        self.catalog
            .create_category(NewCategory {
                name: name.to_owned(),
                description: description.trim().to_owned(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => CatalogError::DuplicateCategory,
                other => CatalogError::Store(other),
            })
    }

    async fn check_category(&self, id: Option<CategoryId>) -> Result<(), CatalogError> {
        match id {
            Some(id) if !self.catalog.category_exists(id).await? => {
                Err(CatalogError::CategoryNotFound)
            }
            _ => Ok(()),
        }
    }
}

fn not_found_as(mapped: CatalogError) -> impl FnOnce(StoreError) -> CatalogError {
    move |e| match e {
        StoreError::NotFound => mapped,
        other => CatalogError::Store(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use menuboard_core::Price;

    use super::*;
    use crate::db::MemoryStore;

    fn draft(name: &str, category: Option<CategoryId>) -> ItemDraft {
        ItemDraft {
            name: name.to_owned(),
            description: String::new(),
            price: Price::from_cents(1200).unwrap(),
            image_url: None,
            category_id: category,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_toggle_hides_item_from_browse() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store);
        let item = service.create_item(&draft("Pudim", None)).await.unwrap();

        assert_eq!(service.browse(&CatalogQuery::default()).await.unwrap().len(), 1);
        assert!(!service.toggle_active(item.id).await.unwrap());
        assert!(service.browse(&CatalogQuery::default()).await.unwrap().is_empty());
        assert!(matches!(
            service.active_item(item.id).await,
            Err(CatalogError::ItemNotFound)
        ));
        assert_eq!(service.all_items().await.unwrap().len(), 1);
        assert!(service.toggle_active(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store);
        let err = service
            .create_item(&draft("Pudim", Some(CategoryId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store);
        let desserts = service.create_category("Sobremesas", "").await.unwrap();
        let item = service.create_item(&draft("Pudim", None)).await.unwrap();

        let updated = service
            .update_item(item.id, &draft("Pudim de leite", Some(desserts.id)))
            .await
            .unwrap();
        assert_eq!(updated.name, "Pudim de leite");
        assert_eq!(updated.category_id, Some(desserts.id));

        service.delete_item(item.id).await.unwrap();
        assert!(matches!(
            service.delete_item(item.id).await,
            Err(CatalogError::ItemNotFound)
        ));
        assert!(matches!(
            service.update_item(item.id, &draft("x", None)).await,
            Err(CatalogError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn test_category_names() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store);
        service.create_category("Bebidas", "").await.unwrap();
        assert!(matches!(
            service.create_category(" Bebidas ", "").await,
            Err(CatalogError::DuplicateCategory)
        ));
        assert!(matches!(
            service.create_category("  ", "").await,
            Err(CatalogError::Validation(_))
        ));
    }
}
