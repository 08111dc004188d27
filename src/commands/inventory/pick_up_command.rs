use crate::{
    commands::Command,
    db::DbPool,
    entities::bin_inventory::Entity as BinInventory,
    errors::ServiceError,
    events::{Event, EventSender},
};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{DatabaseConnection, EntityTrait, TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref SHELF_PICK_UPS: IntCounter = IntCounter::new(
        "shelf_pick_ups_total",
        "Total number of whole-bin pick-up operations"
    )
    .expect("metric can be created");
    static ref SHELF_PICK_UP_FAILURES: IntCounter = IntCounter::new(
        "shelf_pick_up_failures_total",
        "Total number of failed whole-bin pick-up operations"
    )
    .expect("metric can be created");
}

/// Removes a product from a shelf by deleting the whole bin row.
///
/// Blocked while the bin has reserved quantity; reserved stock may not be
/// relocated out from under an open order.
#[derive(Debug, Serialize, Deserialize)]
pub struct PickUpCommand {
    pub bin_inventory_id: Uuid,
    /// Stamped by the service facade from the authenticated caller.
    #[serde(default)]
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PickUpResult {
    pub bin_id: Uuid,
    pub shelf_id: Uuid,
    pub site_id: Uuid,
    pub product_id: Uuid,
    pub released_quantity: i32,
}

#[async_trait::async_trait]
impl Command for PickUpCommand {
    type Result = PickUpResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let result = self.pick_up_in_db(db).await?;

        event_sender
            .send(Event::ShelfCleared {
                bin_id: result.bin_id,
                shelf_id: result.shelf_id,
                site_id: result.site_id,
                product_id: result.product_id,
                released_quantity: result.released_quantity,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for pick-up: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        info!(
            bin_id = %result.bin_id,
            released = result.released_quantity,
            "Bin cleared"
        );
        SHELF_PICK_UPS.inc();

        Ok(result)
    }
}

impl PickUpCommand {
    async fn pick_up_in_db(&self, db: &DatabaseConnection) -> Result<PickUpResult, ServiceError> {
        let bin_inventory_id = self.bin_inventory_id;

        let result = db
            .transaction::<_, PickUpResult, ServiceError>(move |txn| {
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

                    if bin.reserved_quantity > 0 {
                        SHELF_PICK_UP_FAILURES.inc();
                        return Err(ServiceError::HasReservedQuantity(format!(
                            "bin {} has {} units reserved",
                            bin.id, bin.reserved_quantity
                        )));
                    }

                    BinInventory::delete_by_id(bin.id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(PickUpResult {
                        bin_id: bin.id,
                        shelf_id: bin.shelf_id,
                        site_id: bin.site_id,
                        product_id: bin.product_id,
                        released_quantity: bin.quantity,
                    })
                })
            })
            .await;

        match result {
            Ok(res) => Ok(res),
            Err(TransactionError::Connection(db_err)) => {
                SHELF_PICK_UP_FAILURES.inc();
                Err(ServiceError::db_error(db_err))
            }
            Err(TransactionError::Transaction(service_err)) => Err(service_err),
        }
    }
}
