use crate::{
    entities::{
        bin_inventory::{self, Entity as BinInventory},
        inventory::{self, Entity as Inventory},
        inventory_movement::{self, Entity as InventoryMovement},
        shelf::Entity as Shelf,
    },
    errors::ServiceError,
    queries::Query,
};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Looks up the site-level record for one (product, site) pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetInventoryQuery {
    pub product_id: Uuid,
    pub site_id: Uuid,
}

#[async_trait]
impl Query for GetInventoryQuery {
    type Result = inventory::Model;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        Inventory::find()
            .filter(inventory::Column::ProductId.eq(self.product_id))
            .filter(inventory::Column::SiteId.eq(self.site_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No inventory for product {} at site {}",
                    self.product_id, self.site_id
                ))
            })
    }
}

/// The portion of a site's available stock not yet allocated to any shelf.
///
/// `site available quantity - sum of the product's bin quantities`, floored
/// at zero. Drives "how much of this product can still be shelved".
#[derive(Debug, Serialize, Deserialize)]
pub struct UnassignedQuantityQuery {
    pub site_id: Uuid,
    pub product_id: Uuid,
}

#[async_trait]
impl Query for UnassignedQuantityQuery {
    type Result = i32;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let site_inventory = Inventory::find()
            .filter(inventory::Column::ProductId.eq(self.product_id))
            .filter(inventory::Column::SiteId.eq(self.site_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Nothing stocked means nothing left to shelve.
        let Some(record) = site_inventory else {
            return Ok(0);
        };

        let bins = BinInventory::find()
            .filter(bin_inventory::Column::SiteId.eq(self.site_id))
            .filter(bin_inventory::Column::ProductId.eq(self.product_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let shelved: i32 = bins.iter().map(|bin| bin.quantity).sum();

        Ok((record.available_quantity - shelved).max(0))
    }
}

/// Movement ledger rows for one inventory record, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct MovementHistoryQuery {
    pub inventory_id: Uuid,
    pub limit: u64,
}

#[async_trait]
impl Query for MovementHistoryQuery {
    type Result = Vec<inventory_movement::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        InventoryMovement::find()
            .filter(inventory_movement::Column::InventoryId.eq(self.inventory_id))
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .limit(self.limit)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// All bin rows on one shelf.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShelfContentsQuery {
    pub shelf_id: Uuid,
}

#[async_trait]
impl Query for ShelfContentsQuery {
    type Result = Vec<bin_inventory::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        Shelf::find_by_id(self.shelf_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shelf {} not found", self.shelf_id))
            })?;

        BinInventory::find()
            .filter(bin_inventory::Column::ShelfId.eq(self.shelf_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Site records at or below their re-order point.
#[derive(Debug, Serialize, Deserialize)]
pub struct LowStockItemsQuery {
    pub site_id: Uuid,
}

#[async_trait]
impl Query for LowStockItemsQuery {
    type Result = Vec<inventory::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let records = Inventory::find()
            .filter(inventory::Column::SiteId.eq(self.site_id))
            .filter(inventory::Column::ReorderPoint.is_not_null())
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(records
            .into_iter()
            .filter(inventory::Model::is_below_reorder_point)
            .collect())
    }
}
