use crate::{
    commands::{
        inventory::{apply_site_delta, record_movement},
        Command,
    },
    db::DbPool,
    entities::{
        inventory::{self, Entity as Inventory},
        inventory_movement::MovementType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
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
    static ref STOCK_TRANSFERS: IntCounter = IntCounter::new(
        "stock_transfers_total",
        "Total number of inter-site stock transfers"
    )
    .expect("metric can be created");
    static ref STOCK_TRANSFER_FAILURES: IntCounter = IntCounter::new(
        "stock_transfer_failures_total",
        "Total number of failed inter-site stock transfers"
    )
    .expect("metric can be created");
}

/// Moves quantity of one product from one site's pool to another's.
///
/// Debit, credit and both ledger rows commit together or not at all; a
/// transfer that decremented the source without crediting the destination
/// would be lost stock.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TransferStockCommand {
    pub product_id: Uuid,
    pub from_site_id: Uuid,
    pub to_site_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    /// Stamped by the service facade from the authenticated caller.
    #[serde(default)]
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferStockResult {
    pub product_id: Uuid,
    pub from_site_id: Uuid,
    pub to_site_id: Uuid,
    pub quantity: i32,
    pub source_inventory_id: Uuid,
    pub destination_inventory_id: Uuid,
    pub out_movement_id: Uuid,
    pub in_movement_id: Uuid,
    pub source_remaining_quantity: i32,
    pub destination_quantity: i32,
    pub transferred_at: DateTime<Utc>,
}

#[async_trait::async_trait]
impl Command for TransferStockCommand {
    type Result = TransferStockResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_TRANSFER_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        if self.from_site_id == self.to_site_id {
            STOCK_TRANSFER_FAILURES.inc();
            let msg = "Cannot transfer stock to the same site".to_string();
            error!("{}", msg);
            return Err(ServiceError::ValidationError(msg));
        }

        let db = db_pool.as_ref();
        let result = self.transfer_in_db(db).await?;

        event_sender
            .send(Event::StockTransferred {
                product_id: result.product_id,
                from_site_id: result.from_site_id,
                to_site_id: result.to_site_id,
                quantity: result.quantity,
                out_movement_id: result.out_movement_id,
                in_movement_id: result.in_movement_id,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for stock transfer: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        info!(
            product_id = %result.product_id,
            from_site = %result.from_site_id,
            to_site = %result.to_site_id,
            quantity = result.quantity,
            "Stock transferred"
        );
        STOCK_TRANSFERS.inc();

        Ok(result)
    }
}

impl TransferStockCommand {
    async fn transfer_in_db(
        &self,
        db: &DatabaseConnection,
    ) -> Result<TransferStockResult, ServiceError> {
        let product_id = self.product_id;
        let from_site_id = self.from_site_id;
        let to_site_id = self.to_site_id;
        let quantity = self.quantity;
        let notes = self.notes.clone();
        let performed_by = self.performed_by;

        let result = db
            .transaction::<_, TransferStockResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let source = Inventory::find()
                        .filter(inventory::Column::ProductId.eq(product_id))
                        .filter(inventory::Column::SiteId.eq(from_site_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "No inventory for product {} at site {}",
                                product_id, from_site_id
                            ))
                        })?;

                    if source.available_quantity < quantity {
                        STOCK_TRANSFER_FAILURES.inc();
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, available {} for product {} at site {}",
                            quantity, source.available_quantity, product_id, from_site_id
                        )));
                    }

                    let out_movement_id = record_movement(
                        txn,
                        &source,
                        MovementType::TransferOut,
                        -quantity,
                        None,
                        Some(to_site_id),
                        None,
                        notes.clone(),
                        performed_by,
                    )
                    .await?;
                    let updated_source = apply_site_delta(txn, &source, -quantity).await?;

                    // The destination pool is created lazily, starting empty.
                    let destination = match Inventory::find()
                        .filter(inventory::Column::ProductId.eq(product_id))
                        .filter(inventory::Column::SiteId.eq(to_site_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                    {
                        Some(existing) => existing,
                        None => inventory::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(product_id),
                            site_id: Set(to_site_id),
                            quantity: Set(0),
                            reserved_quantity: Set(0),
                            available_quantity: Set(0),
                            min_stock_level: Set(None),
                            max_stock_level: Set(None),
                            reorder_point: Set(None),
                            version: Set(0),
                            created_at: Set(Utc::now()),
                            updated_at: Set(Utc::now()),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?,
                    };

                    let in_movement_id = record_movement(
                        txn,
                        &destination,
                        MovementType::TransferIn,
                        quantity,
                        Some(from_site_id),
                        None,
                        None,
                        notes,
                        performed_by,
                    )
                    .await?;
                    let updated_destination =
                        apply_site_delta(txn, &destination, quantity).await?;

                    Ok(TransferStockResult {
                        product_id,
                        from_site_id,
                        to_site_id,
                        quantity,
                        source_inventory_id: updated_source.id,
                        destination_inventory_id: updated_destination.id,
                        out_movement_id,
                        in_movement_id,
                        source_remaining_quantity: updated_source.quantity,
                        destination_quantity: updated_destination.quantity,
                        transferred_at: updated_destination.updated_at,
                    })
                })
            })
            .await;

        match result {
            Ok(res) => Ok(res),
            Err(TransactionError::Connection(db_err)) => {
                STOCK_TRANSFER_FAILURES.inc();
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
        let command = TransferStockCommand {
            product_id: Uuid::new_v4(),
            from_site_id: Uuid::new_v4(),
            to_site_id: Uuid::new_v4(),
            quantity: 0,
            notes: None,
            performed_by: None,
        };
        assert!(command.validate().is_err());
    }
}
