//! In-process adapter for the store ports.
//!
//! Backs demo mode and the service and route tests. Faults can be armed to
//! make the next write of a given kind fail, which is how the partial order
//! paths are exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use menuboard_core::{AccountId, CategoryId, Email, ItemId, OrderId, OrderStatus, Role};

use super::{AccountStore, CatalogStore, OrderStore, Store, StoreError};
use crate::models::{
    Account, CatalogItem, Category, ItemDraft, NewAccount, NewCategory, NewOrder, NewOrderLine,
    Order, OrderCounts, OrderLine,
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, (Account, String)>,
    categories: HashMap<CategoryId, Category>,
    items: HashMap<ItemId, CatalogItem>,
    orders: HashMap<OrderId, Order>,
}

#[derive(Default)]
struct Faults {
    unavailable: AtomicBool,
    order_insert: AtomicBool,
    line_insert: AtomicBool,
    order_delete: AtomicBool,
}

/// Store kept in memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    faults: Faults,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next order header insert.
    pub fn fail_next_order_insert(&self) {
        self.faults.order_insert.store(true, Ordering::SeqCst);
    }

    /// Fail the next order line batch.
    pub fn fail_next_line_insert(&self) {
        self.faults.line_insert.store(true, Ordering::SeqCst);
    }

    /// Fail the next order delete.
    pub fn fail_next_order_delete(&self) {
        self.faults.order_delete.store(true, Ordering::SeqCst);
    }

    fn check(&self, armed: Option<&AtomicBool>, what: &str) -> Result<(), StoreError> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_owned()));
        }
        if let Some(flag) = armed
            && flag.swap(false, Ordering::SeqCst)
        {
            return Err(StoreError::Unavailable(format!("injected failure: {what}")));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.check(None, "read")?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.check(None, "write")?;
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_owned()))
    }
}

fn by_name<T>(mut rows: Vec<T>, name: impl Fn(&T) -> String) -> Vec<T> {
    rows.sort_by_key(|row| name(row).to_lowercase());
    rows
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.get(&id).map(|(a, _)| a.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError> {
        Ok(self
            .read()?
            .accounts
            .values()
            .find(|(a, _)| &a.email == email)
            .cloned())
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.write()?;
        if tables.accounts.values().any(|(a, _)| a.email == new.email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        let account = Account {
            id: AccountId::new(),
            email: new.email,
            name: new.name,
            phone: new.phone,
            address: new.address,
            role: Role::Customer,
            created_at: Utc::now(),
        };
        tables
            .accounts
            .insert(account.id, (account.clone(), new.password_hash));
        Ok(account)
    }

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let (account, _) = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.role = role;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = self.read()?.categories.values().cloned().collect();
        Ok(by_name(rows, |c: &Category| c.name.clone()))
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, StoreError> {
        let mut tables = self.write()?;
        if tables.categories.values().any(|c| c.name == new.name) {
            return Err(StoreError::Conflict("category already exists".to_owned()));
        }
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let rows = self.read()?.items.values().cloned().collect();
        Ok(by_name(rows, |i: &CatalogItem| i.name.clone()))
    }

    async fn list_active_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let rows = self
            .read()?
            .items
            .values()
            .filter(|i| i.active)
            .cloned()
            .collect();
        Ok(by_name(rows, |i: &CatalogItem| i.name.clone()))
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn create_item(&self, draft: &ItemDraft) -> Result<CatalogItem, StoreError> {
        let item = CatalogItem {
            id: ItemId::new(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            image_url: draft.image_url.clone(),
            category_id: draft.category_id,
            active: draft.active,
            created_at: Utc::now(),
        };
        self.write()?.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, draft: &ItemDraft) -> Result<CatalogItem, StoreError> {
        let mut tables = self.write()?;
        let item = tables.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        item.name.clone_from(&draft.name);
        item.description.clone_from(&draft.description);
        item.price = draft.price;
        item.image_url.clone_from(&draft.image_url);
        item.category_id = draft.category_id;
        item.active = draft.active;
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let existed = tables.items.remove(&id).is_some();
        if existed {
            for line in tables.orders.values_mut().flat_map(|o| o.lines.iter_mut()) {
                if line.item_id == Some(id) {
                    line.item_id = None;
                }
            }
        }
        Ok(existed)
    }

    async fn set_item_active(&self, id: ItemId, active: bool) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let item = tables.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        item.active = active;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, new: &NewOrder) -> Result<Order, StoreError> {
        self.check(Some(&self.faults.order_insert), "order insert")?;
        let order = Order {
            id: new.id,
            account_id: new.account_id,
            total: new.total,
            mode: new.mode,
            delivery_fee: new.delivery_fee,
            delivery_address: new.delivery_address.clone(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            lines: Vec::new(),
        };
        let mut tables = self.write()?;
        if !tables.accounts.contains_key(&new.account_id) {
            return Err(StoreError::Conflict("unknown account".to_owned()));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError> {
        self.check(Some(&self.faults.line_insert), "order line insert")?;
        let mut tables = self.write()?;
        let order = tables.orders.get_mut(&order_id).ok_or(StoreError::NotFound)?;
        order.lines.extend(lines.iter().map(|line| OrderLine {
            id: line.id,
            order_id,
            item_id: Some(line.item_id),
            item_name: line.item_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }));
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        self.check(Some(&self.faults.order_delete), "order delete")?;
        Ok(self.write()?.orders.remove(&id).is_some())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn orders_for_account(&self, account: AccountId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.account_id == account)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let order = tables.orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        order.status = status;
        Ok(())
    }

    async fn orders_without_lines(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.lines.is_empty() && o.created_at < created_before)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn order_counts(&self) -> Result<OrderCounts, StoreError> {
        let mut counts = OrderCounts::default();
        for order in self.read()?.orders.values() {
            counts.record(order.status, 1);
        }
        Ok(counts)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check(None, "ping")
    }
}
