use crate::errors::ServiceError;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

/// Read-side counterpart to `Command`: single statements, no transaction,
/// no events. Results are recomputed on every call rather than cached, so
/// derived views (like unassigned quantity) cannot drift from the
/// authoritative records.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

pub mod inventory_queries;
