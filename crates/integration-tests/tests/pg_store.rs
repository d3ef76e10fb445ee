//! `PostgreSQL` adapter tests.
//!
//! These tests require a database with migrations applied
//! (`menuboard migrate`) and `MENUBOARD_DATABASE_URL` set.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use menuboard_core::{AccountId, DeliveryMode, Email, OrderId, OrderLineId, OrderStatus, Price, Role};
use menuboard_integration_tests::{database_url, unique_email};
use menuboard_storefront::db::{AccountStore, CatalogStore, OrderStore, PgStore, Store, StoreError, create_pool};
use menuboard_storefront::models::{ItemDraft, NewAccount, NewOrder, NewOrderLine};
use menuboard_storefront::services::{OrderError, OrderService, OrderSettings};

async fn store() -> PgStore {
    PgStore::new(create_pool(&database_url()).await.unwrap())
}

async fn account(store: &PgStore) -> AccountId {
    store
        .create_account(NewAccount {
            email: Email::parse(&unique_email("pg")).unwrap(),
            name: "Pg".to_owned(),
            phone: None,
            address: None,
            password_hash: "not-a-real-hash".to_owned(),
        })
        .await
        .unwrap()
        .id
}

fn header(account_id: AccountId, total: Price) -> NewOrder {
    NewOrder {
        id: OrderId::new(),
        account_id,
        total,
        mode: DeliveryMode::InVenue,
        delivery_fee: Price::ZERO,
        delivery_address: None,
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_ping() {
    store().await.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_duplicate_email_is_conflict() {
    let store = store().await;
    let email = Email::parse(&unique_email("dupe")).unwrap();
    let new = || NewAccount {
        email: email.clone(),
        name: "Dupe".to_owned(),
        phone: None,
        address: None,
        password_hash: "x".to_owned(),
    };

    store.create_account(new()).await.unwrap();
    assert!(matches!(
        store.create_account(new()).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_role_change_is_persisted() {
    let store = store().await;
    let id = account(&store).await;

    store.set_role(id, Role::Staff).await.unwrap();
    assert_eq!(store.find_account(id).await.unwrap().unwrap().role, Role::Staff);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_order_lines_round_trip_and_orphans() {
    let store = store().await;
    let owner = account(&store).await;
    let item = store
        .create_item(&ItemDraft::parse("Pg test item", "", "10,00", None, None, true).unwrap())
        .await
        .unwrap();

    let complete = store
        .insert_order(&header(owner, Price::parse("20,00").unwrap()))
        .await
        .unwrap();
    store
        .insert_order_lines(
            complete.id,
            &[NewOrderLine {
                id: OrderLineId::new(),
                item_id: item.id,
                item_name: item.name.clone(),
                quantity: 2,
                unit_price: item.price,
            }],
        )
        .await
        .unwrap();

    let bare = store
        .insert_order(&header(owner, Price::parse("5,00").unwrap()))
        .await
        .unwrap();

    let found = store.find_order(complete.id).await.unwrap().unwrap();
    assert_eq!(found.lines.len(), 1);
    assert_eq!(found.lines_subtotal(), found.total);

    let orphans = store
        .orders_without_lines(chrono::Utc::now() + chrono::Duration::seconds(1))
        .await
        .unwrap();
    assert!(
        store
            .orders_without_lines(bare.created_at)
            .await
            .unwrap()
            .iter()
            .all(|o| o.id != bare.id)
    );
    assert!(orphans.iter().any(|o| o.id == bare.id));
    assert!(!orphans.iter().any(|o| o.id == complete.id));

    assert!(store.delete_order(bare.id).await.unwrap());
    assert!(!store.delete_order(bare.id).await.unwrap());
    store.delete_item(item.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_status_transition_rules() {
    let store = store().await;
    let owner = account(&store).await;
    let order = store
        .insert_order(&header(owner, Price::parse("9,00").unwrap()))
        .await
        .unwrap();
    let orders = OrderService::new(&store, OrderSettings::default());

    orders.transition(order.id, OrderStatus::Completed).await.unwrap();
    assert!(matches!(
        orders.transition(order.id, OrderStatus::Pending).await,
        Err(OrderError::InvalidTransition { .. })
    ));
    assert!(matches!(
        orders.transition(OrderId::new(), OrderStatus::Cancelled).await,
        Err(OrderError::NotFound)
    ));
}
