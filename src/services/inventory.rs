use crate::{
    auth::{authorize, AuthenticatedUser, Permission},
    commands::{
        inventory::{
            AdjustStockCommand, AdjustStockResult, PartialPickUpCommand, PartialPickUpResult,
            PickUpCommand, PickUpResult, PutAwayCommand, PutAwayResult, TransferStockCommand,
            TransferStockResult,
        },
        Command,
    },
    db::DbPool,
    entities::{bin_inventory, inventory, inventory_movement},
    errors::ServiceError,
    events::EventSender,
    queries::{
        inventory_queries::{
            GetInventoryQuery, LowStockItemsQuery, MovementHistoryQuery, ShelfContentsQuery,
            UnassignedQuantityQuery,
        },
        Query,
    },
};
use std::sync::Arc;
use uuid::Uuid;

/// In-process API for the inventory ledger and stock-movement engine.
///
/// Every entry point resolves the caller through the central policy check
/// before touching the store. `performed_by` on mutating commands is
/// stamped from the authenticated caller, never taken from the payload.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Applies a signed quantity delta to one site-level record.
    pub async fn adjust_stock(
        &self,
        actor: Option<&AuthenticatedUser>,
        mut command: AdjustStockCommand,
    ) -> Result<AdjustStockResult, ServiceError> {
        let user = authorize(actor, Permission::InventoryAdjust)?;
        command.performed_by = Some(user.user_id);
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Moves stock of one product between two sites.
    pub async fn transfer_stock(
        &self,
        actor: Option<&AuthenticatedUser>,
        mut command: TransferStockCommand,
    ) -> Result<TransferStockResult, ServiceError> {
        let user = authorize(actor, Permission::InventoryTransfer)?;
        command.performed_by = Some(user.user_id);
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Places site stock onto a shelf.
    pub async fn put_away(
        &self,
        actor: Option<&AuthenticatedUser>,
        mut command: PutAwayCommand,
    ) -> Result<PutAwayResult, ServiceError> {
        let user = authorize(actor, Permission::InventoryAllocate)?;
        command.performed_by = Some(user.user_id);
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Clears a whole bin off its shelf.
    pub async fn pick_up(
        &self,
        actor: Option<&AuthenticatedUser>,
        mut command: PickUpCommand,
    ) -> Result<PickUpResult, ServiceError> {
        let user = authorize(actor, Permission::InventoryAllocate)?;
        command.performed_by = Some(user.user_id);
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Picks part of a bin down without clearing it.
    pub async fn partial_pick_up(
        &self,
        actor: Option<&AuthenticatedUser>,
        mut command: PartialPickUpCommand,
    ) -> Result<PartialPickUpResult, ServiceError> {
        let user = authorize(actor, Permission::InventoryAllocate)?;
        command.performed_by = Some(user.user_id);
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn get_inventory(
        &self,
        actor: Option<&AuthenticatedUser>,
        product_id: Uuid,
        site_id: Uuid,
    ) -> Result<inventory::Model, ServiceError> {
        authorize(actor, Permission::InventoryRead)?;
        GetInventoryQuery {
            product_id,
            site_id,
        }
        .execute(self.db_pool.as_ref())
        .await
    }

    /// Available stock not yet allocated to any shelf, floored at zero.
    pub async fn unassigned_quantity(
        &self,
        actor: Option<&AuthenticatedUser>,
        site_id: Uuid,
        product_id: Uuid,
    ) -> Result<i32, ServiceError> {
        authorize(actor, Permission::InventoryRead)?;
        UnassignedQuantityQuery {
            site_id,
            product_id,
        }
        .execute(self.db_pool.as_ref())
        .await
    }

    /// Movement ledger rows for one inventory record, newest first.
    pub async fn movement_history(
        &self,
        actor: Option<&AuthenticatedUser>,
        inventory_id: Uuid,
        limit: u64,
    ) -> Result<Vec<inventory_movement::Model>, ServiceError> {
        authorize(actor, Permission::InventoryRead)?;
        MovementHistoryQuery {
            inventory_id,
            limit,
        }
        .execute(self.db_pool.as_ref())
        .await
    }

    pub async fn shelf_contents(
        &self,
        actor: Option<&AuthenticatedUser>,
        shelf_id: Uuid,
    ) -> Result<Vec<bin_inventory::Model>, ServiceError> {
        authorize(actor, Permission::InventoryRead)?;
        ShelfContentsQuery { shelf_id }
            .execute(self.db_pool.as_ref())
            .await
    }

    pub async fn low_stock_items(
        &self,
        actor: Option<&AuthenticatedUser>,
        site_id: Uuid,
    ) -> Result<Vec<inventory::Model>, ServiceError> {
        authorize(actor, Permission::InventoryRead)?;
        LowStockItemsQuery { site_id }
            .execute(self.db_pool.as_ref())
            .await
    }
}
