use crate::{
    commands::{
        inventory::{apply_site_delta, record_movement},
        Command,
    },
    db::DbPool,
    entities::{
        inventory::Entity as Inventory,
        inventory_movement::MovementType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref STOCK_ADJUSTMENTS: IntCounter = IntCounter::new(
        "stock_adjustments_total",
        "Total number of stock adjustments"
    )
    .expect("metric can be created");
    static ref STOCK_ADJUSTMENT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_adjustment_failures_total",
            "Total number of failed stock adjustments"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    In,
    Out,
}

impl AdjustmentDirection {
    fn signed(&self, quantity: i32) -> i32 {
        match self {
            AdjustmentDirection::In => quantity,
            AdjustmentDirection::Out => -quantity,
        }
    }
}

/// Applies a signed quantity delta to one site-level record and writes an
/// ADJUSTMENT ledger row in the same transaction.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdjustStockCommand {
    pub inventory_id: Uuid,
    pub direction: AdjustmentDirection,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 50))]
    pub reason: String,
    /// External document the adjustment traces back to, e.g. a count sheet.
    #[validate(length(max = 500))]
    pub reference: Option<String>,
    /// Stamped by the service facade from the authenticated caller.
    #[serde(default)]
    pub performed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustStockResult {
    pub movement_id: Uuid,
    pub inventory_id: Uuid,
    pub product_id: Uuid,
    pub site_id: Uuid,
    pub previous_quantity: i32,
    pub quantity_change: i32,
    pub new_quantity: i32,
    pub new_available_quantity: i32,
    pub adjusted_at: DateTime<Utc>,
}

#[async_trait::async_trait]
impl Command for AdjustStockCommand {
    type Result = AdjustStockResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_ADJUSTMENT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let db = db_pool.as_ref();
        let result = self.adjust_in_db(db).await?;

        event_sender
            .send(Event::StockAdjusted {
                inventory_id: result.inventory_id,
                site_id: result.site_id,
                product_id: result.product_id,
                old_quantity: result.previous_quantity,
                new_quantity: result.new_quantity,
                reason: self.reason.clone(),
                movement_id: result.movement_id,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for stock adjustment: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        info!(
            inventory_id = %result.inventory_id,
            change = result.quantity_change,
            new_quantity = result.new_quantity,
            "Stock adjusted"
        );
        STOCK_ADJUSTMENTS.inc();

        Ok(result)
    }
}

impl AdjustStockCommand {
    async fn adjust_in_db(
        &self,
        db: &DatabaseConnection,
    ) -> Result<AdjustStockResult, ServiceError> {
        let inventory_id = self.inventory_id;
        let direction = self.direction;
        let requested = self.quantity;
        let delta = direction.signed(requested);
        let reason = self.reason.clone();
        let reference = self.reference.clone();
        let performed_by = self.performed_by;

        let result = db
            .transaction::<_, AdjustStockResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let current = Inventory::find_by_id(inventory_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Inventory record {} not found",
                                inventory_id
                            ))
                        })?;

                    // OUT adjustments may not dip into reserved stock.
                    if direction == AdjustmentDirection::Out
                        && requested > current.available_quantity
                    {
                        STOCK_ADJUSTMENT_FAILURES
                            .with_label_values(&["insufficient_stock"])
                            .inc();
                        return Err(ServiceError::InsufficientStock(format!(
                            "requested {}, available {} for product {} at site {}",
                            requested,
                            current.available_quantity,
                            current.product_id,
                            current.site_id
                        )));
                    }

                    let movement_id = record_movement(
                        txn,
                        &current,
                        MovementType::Adjustment,
                        delta,
                        None,
                        None,
                        Some(reason),
                        reference,
                        performed_by,
                    )
                    .await?;
                    let updated = apply_site_delta(txn, &current, delta).await?;

                    Ok(AdjustStockResult {
                        movement_id,
                        inventory_id: updated.id,
                        product_id: updated.product_id,
                        site_id: updated.site_id,
                        previous_quantity: current.quantity,
                        quantity_change: delta,
                        new_quantity: updated.quantity,
                        new_available_quantity: updated.available_quantity,
                        adjusted_at: updated.updated_at,
                    })
                })
            })
            .await;

        match result {
            Ok(res) => Ok(res),
            Err(TransactionError::Connection(db_err)) => {
                STOCK_ADJUSTMENT_FAILURES
                    .with_label_values(&["database_error"])
                    .inc();
                Err(ServiceError::db_error(db_err))
            }
            Err(TransactionError::Transaction(service_err)) => Err(service_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(quantity: i32, reason: &str) -> AdjustStockCommand {
        AdjustStockCommand {
            inventory_id: Uuid::new_v4(),
            direction: AdjustmentDirection::Out,
            quantity,
            reason: reason.to_string(),
            reference: None,
            performed_by: None,
        }
    }

    #[test]
    fn validates_quantity_and_reason() {
        assert!(command(10, "CYCLE_COUNT").validate().is_ok());
        assert!(command(0, "CYCLE_COUNT").validate().is_err());
        assert!(command(-5, "CYCLE_COUNT").validate().is_err());
        assert!(command(10, "").validate().is_err());
    }

    #[test]
    fn direction_signs_the_delta() {
        assert_eq!(AdjustmentDirection::In.signed(7), 7);
        assert_eq!(AdjustmentDirection::Out.signed(7), -7);
    }
}
