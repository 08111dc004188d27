use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of ledger movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Adjustment,
    TransferIn,
    TransferOut,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::TransferIn => "TRANSFER_IN",
            MovementType::TransferOut => "TRANSFER_OUT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            "TRANSFER_IN" => Some(MovementType::TransferIn),
            "TRANSFER_OUT" => Some(MovementType::TransferOut),
            _ => None,
        }
    }
}

/// Append-only movement ledger entry.
///
/// Rows are never updated or deleted once written; for every row
/// `quantity_after == quantity_before + quantity_change`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Site-level inventory record the movement pertains to.
    pub inventory_id: Uuid,
    pub movement_type: String,
    pub quantity_before: i32,
    pub quantity_change: i32,
    pub quantity_after: i32,
    pub from_site_id: Option<Uuid>,
    pub to_site_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InventoryId",
        to = "super::inventory::Column::Id"
    )]
    Inventory,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::MovementType;

    #[test]
    fn movement_type_string_mapping() {
        for mt in [
            MovementType::Adjustment,
            MovementType::TransferIn,
            MovementType::TransferOut,
        ] {
            assert_eq!(MovementType::from_str(mt.as_str()), Some(mt));
        }
        assert_eq!(MovementType::from_str("RECEIVE"), None);
    }
}
