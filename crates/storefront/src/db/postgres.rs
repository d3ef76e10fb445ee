//! `PostgreSQL` adapter for the store ports.
//!
//! Queries are built at runtime with `query_as` and mapped through row
//! structs, so typed values (emails, prices, roles, statuses) are parsed
//! once here and a bad row surfaces as [`StoreError::DataCorruption`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use menuboard_core::{
    AccountId, CategoryId, DeliveryMode, Email, ItemId, OrderId, OrderLineId, OrderStatus, Price,
    Role,
};

use super::{AccountStore, CatalogStore, OrderStore, Store, StoreError};
use crate::models::{
    Account, CatalogItem, Category, ItemDraft, NewAccount, NewCategory, NewOrder, NewOrderLine,
    Order, OrderCounts, OrderLine,
};

const ACCOUNT_COLUMNS: &str = "id, email, name, phone, address, role, created_at";
const ITEM_COLUMNS: &str =
    "id, name, description, price, image_url, category_id, active, created_at";
const ORDER_COLUMNS: &str =
    "id, account_id, total, delivery_mode, delivery_fee, delivery_address, status, created_at";

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn attach_lines(&self, headers: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id.as_uuid()).collect();
        let rows: Vec<LineRow> = sqlx::query_as(
            r"
            SELECT id, order_id, item_id, item_name, quantity, unit_price
            FROM menuboard.order_line
            WHERE order_id = ANY($1)
            ORDER BY created_at, id
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let line = OrderLine::try_from(row)?;
            by_order.entry(line.order_id).or_default().push(line);
        }

        headers
            .into_iter()
            .map(|header| {
                let lines = by_order.remove(&header.id).unwrap_or_default();
                header.into_order(lines)
            })
            .collect()
    }
}

fn conflict_on_unique(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(e)
}

fn price_from_db(amount: Decimal, column: &str) -> Result<Price, StoreError> {
    Price::new(amount)
        .map_err(|e| StoreError::DataCorruption(format!("invalid {column} in database: {e}")))
}

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct AccountRow {
    id: AccountId,
    email: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    role: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = Role::from_ordinal(r.role).ok_or_else(|| {
            StoreError::DataCorruption(format!("invalid role in database: {}", r.role))
        })?;
        Ok(Self {
            id: r.id,
            email,
            name: r.name,
            phone: r.phone,
            address: r.address,
            role,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

#[derive(FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: ItemId,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    category_id: Option<CategoryId>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for CatalogItem {
    type Error = StoreError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: price_from_db(r.price, "item price")?,
            image_url: r.image_url,
            category_id: r.category_id,
            active: r.active,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: OrderId,
    account_id: AccountId,
    total: Decimal,
    delivery_mode: String,
    delivery_fee: Decimal,
    delivery_address: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
        let mode: DeliveryMode = self
            .delivery_mode
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("{e} in database")))?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("{e} in database")))?;
        Ok(Order {
            id: self.id,
            account_id: self.account_id,
            total: price_from_db(self.total, "order total")?,
            mode,
            delivery_fee: price_from_db(self.delivery_fee, "delivery fee")?,
            delivery_address: self.delivery_address,
            status,
            created_at: self.created_at,
            lines,
        })
    }
}

#[derive(FromRow)]
struct LineRow {
    id: OrderLineId,
    order_id: OrderId,
    item_id: Option<ItemId>,
    item_name: String,
    quantity: i32,
    unit_price: Decimal,
}

impl TryFrom<LineRow> for OrderLine {
    type Error = StoreError;

    fn try_from(r: LineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                StoreError::DataCorruption(format!("invalid quantity in database: {}", r.quantity))
            })?;
        Ok(Self {
            id: r.id,
            order_id: r.order_id,
            item_id: r.item_id,
            item_name: r.item_name,
            quantity,
            unit_price: price_from_db(r.unit_price, "unit price")?,
        })
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountStore for PgStore {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM menuboard.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, StoreError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM menuboard.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((Account::try_from(r.account)?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let row: AccountRow = sqlx::query_as(&format!(
            r"
            INSERT INTO menuboard.account (id, email, name, phone, address, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(AccountId::new())
        .bind(new.email.as_str())
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(Role::Customer.ordinal())
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        Account::try_from(row)
    }

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE menuboard.account SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.ordinal())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, name, description, created_at FROM menuboard.category ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, StoreError> {
        let row: CategoryRow = sqlx::query_as(
            r"
            INSERT INTO menuboard.category (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            ",
        )
        .bind(CategoryId::new())
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;
        Ok(row.into())
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM menuboard.item ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    async fn list_active_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM menuboard.item WHERE active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM menuboard.item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CatalogItem::try_from).transpose()
    }

    async fn create_item(&self, draft: &ItemDraft) -> Result<CatalogItem, StoreError> {
        let row: ItemRow = sqlx::query_as(&format!(
            r"
            INSERT INTO menuboard.item
                (id, name, description, price, image_url, category_id, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(ItemId::new())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.amount())
        .bind(&draft.image_url)
        .bind(draft.category_id)
        .bind(draft.active)
        .fetch_one(&self.pool)
        .await?;
        CatalogItem::try_from(row)
    }

    async fn update_item(&self, id: ItemId, draft: &ItemDraft) -> Result<CatalogItem, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            r"
            UPDATE menuboard.item
            SET name = $2, description = $3, price = $4, image_url = $5,
                category_id = $6, active = $7
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.amount())
        .bind(&draft.image_url)
        .bind(draft.category_id)
        .bind(draft.active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CatalogItem::try_from)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM menuboard.item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_item_active(&self, id: ItemId, active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE menuboard.item SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, new: &NewOrder) -> Result<Order, StoreError> {
        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO menuboard.customer_order
                (id, account_id, total, delivery_mode, delivery_fee, delivery_address, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(new.id)
        .bind(new.account_id)
        .bind(new.total.amount())
        .bind(new.mode.as_str())
        .bind(new.delivery_fee.amount())
        .bind(&new.delivery_address)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.into_order(Vec::new())
    }

    async fn insert_order_lines(
        &self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO menuboard.order_line \
             (id, order_id, item_id, item_name, quantity, unit_price) ",
        );
        builder.push_values(lines, |mut row, line| {
            row.push_bind(line.id)
                .push_bind(order_id)
                .push_bind(line.item_id)
                .push_bind(line.item_name.clone())
                .push_bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
                .push_bind(line.unit_price.amount());
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        // Lines go with the header via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM menuboard.customer_order WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM menuboard.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.attach_lines(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn orders_for_account(&self, account: AccountId) -> Result<Vec<Order>, StoreError> {
        let headers: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM menuboard.customer_order
            WHERE account_id = $1
            ORDER BY created_at DESC, id
            "
        ))
        .bind(account)
        .fetch_all(&self.pool)
        .await?;
        self.attach_lines(headers).await
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE menuboard.customer_order SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn orders_without_lines(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        let headers: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM menuboard.customer_order o
            WHERE NOT EXISTS (
                SELECT 1 FROM menuboard.order_line l WHERE l.order_id = o.id
            )
            AND o.created_at < $1
            ORDER BY created_at
            "
        ))
        .bind(created_before)
        .fetch_all(&self.pool)
        .await?;
        headers
            .into_iter()
            .map(|h| h.into_order(Vec::new()))
            .collect()
    }

    async fn order_counts(&self) -> Result<OrderCounts, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM menuboard.customer_order GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = OrderCounts::default();
        for (status, count) in rows {
            let status: OrderStatus = status
                .parse()
                .map_err(|e| StoreError::DataCorruption(format!("{e} in database")))?;
            counts.record(status, u64::try_from(count).unwrap_or_default());
        }
        Ok(counts)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
