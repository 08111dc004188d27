use sea_orm::error::DbErr;
use serde::Serialize;
use uuid::Uuid;

/// Error taxonomy for the inventory core.
///
/// Every failing operation leaves the quantity records and the movement
/// ledger exactly as they were before the call; the surrounding database
/// transaction rolls back on any variant below.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested quantity exceeds what is available at the relevant scope.
    /// Expected during normal use; the UI renders it as a validation
    /// message, not a system fault.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// Removal blocked by open reservations on the bin.
    #[error("Bin has reserved quantity: {0}")]
    HasReservedQuantity(String),

    /// The record's version changed between read and write.
    #[error("Concurrent modification of inventory record: {0}")]
    ConcurrentModification(Uuid),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Helper trait so database-ish failures from different layers normalize
/// into a `DbErr`.
pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Whether the error is one a caller may present as user input feedback
    /// rather than a system failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::ValidationError(_)
                | Self::InvalidOperation(_)
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::InsufficientStock(_)
                | Self::HasReservedQuantity(_)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(format!("Invalid input: {}", errors))
    }
}
