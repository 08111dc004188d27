use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        bin_inventory::{self, Entity as BinInventory},
        inventory::{self, Entity as Inventory},
        shelf::Entity as Shelf,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref SHELF_PUT_AWAYS: IntCounter = IntCounter::new(
        "shelf_put_aways_total",
        "Total number of shelf put-away operations"
    )
    .expect("metric can be created");
    static ref SHELF_PUT_AWAY_FAILURES: IntCounter = IntCounter::new(
        "shelf_put_away_failures_total",
        "Total number of failed shelf put-away operations"
    )
    .expect("metric can be created");
}

/// Places site stock onto a shelf.
///
/// Bin rows are a location index over the site pool, so shelving does not
/// change site totals and writes no ledger row. The guard is the product's
/// unassigned quantity at the site (available minus already shelved), which
/// keeps the sum of bin quantities within the site-level quantity.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PutAwayCommand {
    pub shelf_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Stamped by the service facade from the authenticated caller.
    #[serde(default)]
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutAwayResult {
    pub bin_id: Uuid,
    pub shelf_id: Uuid,
    pub site_id: Uuid,
    pub product_id: Uuid,
    pub added_quantity: i32,
    pub bin_quantity: i32,
    pub created_bin: bool,
}

#[async_trait::async_trait]
impl Command for PutAwayCommand {
    type Result = PutAwayResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            SHELF_PUT_AWAY_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let db = db_pool.as_ref();
        let result = self.put_away_in_db(db).await?;

        event_sender
            .send(Event::ShelfStocked {
                bin_id: result.bin_id,
                shelf_id: result.shelf_id,
                site_id: result.site_id,
                product_id: result.product_id,
                added_quantity: result.added_quantity,
                bin_quantity: result.bin_quantity,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for put-away: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        info!(
            shelf_id = %result.shelf_id,
            product_id = %result.product_id,
            added = result.added_quantity,
            bin_quantity = result.bin_quantity,
            "Stock shelved"
        );
        SHELF_PUT_AWAYS.inc();

        Ok(result)
    }
}

impl PutAwayCommand {
    async fn put_away_in_db(
        &self,
        db: &DatabaseConnection,
    ) -> Result<PutAwayResult, ServiceError> {
        let shelf_id = self.shelf_id;
        let product_id = self.product_id;
        let quantity = self.quantity;

        let result = db
            .transaction::<_, PutAwayResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let shelf = Shelf::find_by_id(shelf_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Shelf {} not found", shelf_id))
                        })?;

                    let site_inventory = Inventory::find()
                        .filter(inventory::Column::ProductId.eq(product_id))
                        .filter(inventory::Column::SiteId.eq(shelf.site_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Product {} is not stocked at site {}",
                                product_id, shelf.site_id
                            ))
                        })?;

                    let site_bins = BinInventory::find()
                        .filter(bin_inventory::Column::SiteId.eq(shelf.site_id))
                        .filter(bin_inventory::Column::ProductId.eq(product_id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    let shelved: i32 = site_bins.iter().map(|bin| bin.quantity).sum();
                    let unassigned = (site_inventory.available_quantity - shelved).max(0);

                    if quantity > unassigned {
                        SHELF_PUT_AWAY_FAILURES.inc();
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, unassigned {} for product {} at site {}",
                            quantity, unassigned, product_id, shelf.site_id
                        )));
                    }

                    let existing = site_bins
                        .into_iter()
                        .find(|bin| bin.shelf_id == shelf_id);

                    match existing {
                        Some(bin) => {
                            // Additive put-away: one row per (shelf, product).
                            let mut active: bin_inventory::ActiveModel = bin.clone().into();
                            active.quantity = Set(bin.quantity + quantity);
                            active.available_quantity =
                                Set(bin.available_quantity + quantity);
                            active.updated_at = Set(Utc::now());
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            Ok(PutAwayResult {
                                bin_id: updated.id,
                                shelf_id,
                                site_id: shelf.site_id,
                                product_id,
                                added_quantity: quantity,
                                bin_quantity: updated.quantity,
                                created_bin: false,
                            })
                        }
                        None => {
                            let is_primary = shelved == 0;
                            let created = bin_inventory::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                shelf_id: Set(shelf_id),
                                site_id: Set(shelf.site_id),
                                product_id: Set(product_id),
                                quantity: Set(quantity),
                                reserved_quantity: Set(0),
                                available_quantity: Set(quantity),
                                is_primary: Set(is_primary),
                                created_at: Set(Utc::now()),
                                updated_at: Set(Utc::now()),
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                            Ok(PutAwayResult {
                                bin_id: created.id,
                                shelf_id,
                                site_id: shelf.site_id,
                                product_id,
                                added_quantity: quantity,
                                bin_quantity: created.quantity,
                                created_bin: true,
                            })
                        }
                    }
                })
            })
            .await;

        match result {
            Ok(res) => Ok(res),
            Err(TransactionError::Connection(db_err)) => {
                SHELF_PUT_AWAY_FAILURES.inc();
                Err(ServiceError::db_error(db_err))
            }
            Err(TransactionError::Transaction(service_err)) => Err(service_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_quantity() {
        let command = PutAwayCommand {
            shelf_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 0,
            performed_by: None,
        };
        assert!(command.validate().is_err());
    }
}
