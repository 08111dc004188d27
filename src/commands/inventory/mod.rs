//! Stock-mutating commands.
//!
//! Every command runs its read-modify-write sequence inside one database
//! transaction; a failure at any step rolls back all of it, including any
//! ledger rows written earlier in the same transaction.

pub mod adjust_stock_command;
pub mod partial_pick_up_command;
pub mod pick_up_command;
pub mod put_away_command;
pub mod transfer_stock_command;

pub use adjust_stock_command::{AdjustStockCommand, AdjustStockResult, AdjustmentDirection};
pub use partial_pick_up_command::{PartialPickUpCommand, PartialPickUpResult};
pub use pick_up_command::{PickUpCommand, PickUpResult};
pub use put_away_command::{PutAwayCommand, PutAwayResult};
pub use transfer_stock_command::{TransferStockCommand, TransferStockResult};

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::inventory::{self, Entity as Inventory};
use crate::entities::inventory_movement::{self, MovementType};
use crate::errors::ServiceError;

/// Applies a signed delta to a site-level record's `quantity` and
/// `available_quantity`, leaving `reserved_quantity` untouched.
///
/// The update is filtered on the version read at load time; zero affected
/// rows means another writer won the race and the transaction must abort.
pub(crate) async fn apply_site_delta<C: ConnectionTrait>(
    txn: &C,
    record: &inventory::Model,
    delta: i32,
) -> Result<inventory::Model, ServiceError> {
    let now = Utc::now();
    let mut active: inventory::ActiveModel = record.clone().into();
    active.quantity = Set(record.quantity + delta);
    active.available_quantity = Set(record.available_quantity + delta);
    active.version = Set(record.version + 1);
    active.updated_at = Set(now);

    let updated = Inventory::update_many()
        .set(active)
        .filter(inventory::Column::Id.eq(record.id))
        .filter(inventory::Column::Version.eq(record.version))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if updated.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(record.id));
    }

    Ok(inventory::Model {
        quantity: record.quantity + delta,
        available_quantity: record.available_quantity + delta,
        version: record.version + 1,
        updated_at: now,
        ..record.clone()
    })
}

/// Appends a movement ledger row for `record`, capturing the record's
/// quantity as it stood before the change.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn record_movement<C: ConnectionTrait>(
    txn: &C,
    record: &inventory::Model,
    movement_type: MovementType,
    quantity_change: i32,
    from_site_id: Option<Uuid>,
    to_site_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
    performed_by: Option<Uuid>,
) -> Result<Uuid, ServiceError> {
    let movement_id = Uuid::new_v4();
    inventory_movement::ActiveModel {
        id: Set(movement_id),
        inventory_id: Set(record.id),
        movement_type: Set(movement_type.as_str().to_string()),
        quantity_before: Set(record.quantity),
        quantity_change: Set(quantity_change),
        quantity_after: Set(record.quantity + quantity_change),
        from_site_id: Set(from_site_id),
        to_site_id: Set(to_site_id),
        reason: Set(reason),
        notes: Set(notes),
        performed_by: Set(performed_by),
        created_at: NotSet,
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;
    Ok(movement_id)
}
