use crate::{
    commands::Command,
    db::DbPool,
    entities::bin_inventory::{self, Entity as BinInventory},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref SHELF_PARTIAL_PICK_UPS: IntCounter = IntCounter::new(
        "shelf_partial_pick_ups_total",
        "Total number of partial pick-up operations"
    )
    .expect("metric can be created");
    static ref SHELF_PARTIAL_PICK_UP_FAILURES: IntCounter = IntCounter::new(
        "shelf_partial_pick_up_failures_total",
        "Total number of failed partial pick-up operations"
    )
    .expect("metric can be created");
}

/// Picks part of a bin down without clearing it.
///
/// Bounded by the bin's available quantity, so reserved stock stays put.
/// When the pick empties the bin the row is deleted, same as a whole-bin
/// pick-up.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PartialPickUpCommand {
    pub bin_inventory_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Stamped by the service facade from the authenticated caller.
    #[serde(default)]
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartialPickUpResult {
    pub bin_id: Uuid,
    pub shelf_id: Uuid,
    pub site_id: Uuid,
    pub product_id: Uuid,
    pub removed_quantity: i32,
    pub remaining_quantity: i32,
    pub bin_deleted: bool,
}

#[async_trait::async_trait]
impl Command for PartialPickUpCommand {
    type Result = PartialPickUpResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            SHELF_PARTIAL_PICK_UP_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let db = db_pool.as_ref();
        let result = self.pick_in_db(db).await?;

        let event = if result.bin_deleted {
            Event::ShelfCleared {
                bin_id: result.bin_id,
                shelf_id: result.shelf_id,
                site_id: result.site_id,
                product_id: result.product_id,
                released_quantity: result.removed_quantity,
            }
        } else {
            Event::ShelfPicked {
                bin_id: result.bin_id,
                shelf_id: result.shelf_id,
                site_id: result.site_id,
                product_id: result.product_id,
                removed_quantity: result.removed_quantity,
                remaining_quantity: result.remaining_quantity,
            }
        };
        event_sender.send(event).await.map_err(|e| {
            let msg = format!("Failed to send event for partial pick-up: {}", e);
            error!("{}", msg);
            ServiceError::EventError(msg)
        })?;

        info!(
            bin_id = %result.bin_id,
            removed = result.removed_quantity,
            remaining = result.remaining_quantity,
            "Bin picked down"
        );
        SHELF_PARTIAL_PICK_UPS.inc();

        Ok(result)
    }
}

impl PartialPickUpCommand {
    async fn pick_in_db(
        &self,
        db: &DatabaseConnection,
    ) -> Result<PartialPickUpResult, ServiceError> {
        let bin_inventory_id = self.bin_inventory_id;
        let quantity = self.quantity;

        let result = db
            .transaction::<_, PartialPickUpResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let bin = BinInventory::find_by_id(bin_inventory_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Bin record {} not found",
                                bin_inventory_id
                            ))
                        })?;

                    if quantity > bin.available_quantity {
                        SHELF_PARTIAL_PICK_UP_FAILURES.inc();
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, available {} in bin {}",
                            quantity, bin.available_quantity, bin.id
                        )));
                    }

                    let remaining = bin.quantity - quantity;
                    // The availability guard means an emptied bin cannot be
                    // holding reserved stock.
                    if remaining == 0 {
                        BinInventory::delete_by_id(bin.id)
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                    } else {
                        let mut active: bin_inventory::ActiveModel = bin.clone().into();
                        active.quantity = Set(remaining);
                        active.available_quantity = Set(bin.available_quantity - quantity);
                        active.updated_at = Set(Utc::now());
                        active.update(txn).await.map_err(ServiceError::db_error)?;
                    }

                    Ok(PartialPickUpResult {
                        bin_id: bin.id,
                        shelf_id: bin.shelf_id,
                        site_id: bin.site_id,
                        product_id: bin.product_id,
                        removed_quantity: quantity,
                        remaining_quantity: remaining,
                        bin_deleted: remaining == 0,
                    })
                })
            })
            .await;

        match result {
            Ok(res) => Ok(res),
            Err(TransactionError::Connection(db_err)) => {
                SHELF_PARTIAL_PICK_UP_FAILURES.inc();
                Err(ServiceError::db_error(db_err))
            }
            Err(TransactionError::Transaction(service_err)) => Err(service_err),
        }
    }
}
