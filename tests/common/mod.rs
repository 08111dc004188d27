#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::{env, sync::Arc};
use stockroom_core::{
    auth::{AuthenticatedUser, Role},
    db::{create_db_pool, run_migrations, DbPool},
    entities::{bin_inventory, inventory, inventory_movement, shelf},
    events::{Event, EventSender},
    services::inventory::InventoryService,
};
use tokio::sync::{mpsc, OnceCell};
use uuid::Uuid;

static SHARED_DB: OnceCell<Arc<DbPool>> = OnceCell::const_new();

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub service: InventoryService,
    pub events: mpsc::Receiver<Event>,
}

/// Connects to the shared in-memory database and applies migrations once per
/// test binary. A single pooled connection keeps the database alive for the
/// whole binary and serializes access; fixtures use fresh UUIDs, so parallel
/// tests do not observe each other's rows.
pub async fn setup() -> TestContext {
    env::set_var("APP__DATABASE_URL", "sqlite::memory:?cache=shared");
    env::set_var("APP__DB_MAX_CONNECTIONS", "1");

    let db = SHARED_DB
        .get_or_init(|| async {
            let db = Arc::new(create_db_pool().await.expect("Failed to create DB pool"));
            run_migrations(db.as_ref())
                .await
                .expect("Failed to run migrations");
            db
        })
        .await
        .clone();

    let (tx, rx) = mpsc::channel(64);
    let service = InventoryService::new(db.clone(), Arc::new(EventSender::new(tx)));

    TestContext {
        db,
        service,
        events: rx,
    }
}

pub fn admin() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Admin)
}

pub fn manager() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Manager)
}

pub fn staff() -> AuthenticatedUser {
    AuthenticatedUser::new(Uuid::new_v4(), Role::Staff)
}

pub async fn seed_inventory(
    db: &DbPool,
    product_id: Uuid,
    site_id: Uuid,
    quantity: i32,
    reserved_quantity: i32,
) -> inventory::Model {
    inventory::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        site_id: Set(site_id),
        quantity: Set(quantity),
        reserved_quantity: Set(reserved_quantity),
        available_quantity: Set(quantity - reserved_quantity),
        min_stock_level: Set(None),
        max_stock_level: Set(None),
        reorder_point: Set(None),
        version: Set(0),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed inventory")
}

pub async fn seed_inventory_with_reorder_point(
    db: &DbPool,
    product_id: Uuid,
    site_id: Uuid,
    quantity: i32,
    reorder_point: i32,
) -> inventory::Model {
    inventory::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        site_id: Set(site_id),
        quantity: Set(quantity),
        reserved_quantity: Set(0),
        available_quantity: Set(quantity),
        min_stock_level: Set(None),
        max_stock_level: Set(None),
        reorder_point: Set(Some(reorder_point)),
        version: Set(0),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed inventory")
}

pub async fn seed_shelf(db: &DbPool, site_id: Uuid, code: &str) -> shelf::Model {
    shelf::ActiveModel {
        id: Set(Uuid::new_v4()),
        site_id: Set(site_id),
        code: Set(code.to_string()),
        name: Set(format!("Shelf {}", code)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed shelf")
}

pub async fn seed_bin(
    db: &DbPool,
    shelf: &shelf::Model,
    product_id: Uuid,
    quantity: i32,
    reserved_quantity: i32,
) -> bin_inventory::Model {
    bin_inventory::ActiveModel {
        id: Set(Uuid::new_v4()),
        shelf_id: Set(shelf.id),
        site_id: Set(shelf.site_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        reserved_quantity: Set(reserved_quantity),
        available_quantity: Set(quantity - reserved_quantity),
        is_primary: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed bin")
}

pub async fn get_inventory_by_id(db: &DbPool, id: Uuid) -> inventory::Model {
    inventory::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to load inventory")
        .expect("Inventory record should exist")
}

pub async fn find_inventory(
    db: &DbPool,
    product_id: Uuid,
    site_id: Uuid,
) -> Option<inventory::Model> {
    inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .filter(inventory::Column::SiteId.eq(site_id))
        .one(db)
        .await
        .expect("Failed to query inventory")
}

pub async fn find_bin(db: &DbPool, bin_id: Uuid) -> Option<bin_inventory::Model> {
    bin_inventory::Entity::find_by_id(bin_id)
        .one(db)
        .await
        .expect("Failed to query bin")
}

/// Ledger rows for one inventory record, oldest first.
pub async fn movements_for(db: &DbPool, inventory_id: Uuid) -> Vec<inventory_movement::Model> {
    inventory_movement::Entity::find()
        .filter(inventory_movement::Column::InventoryId.eq(inventory_id))
        .order_by_asc(inventory_movement::Column::CreatedAt)
        .all(db)
        .await
        .expect("Failed to query movements")
}
