use sea_orm::error::DbErr;
use serde::Serialize;

/// Error type shared by every service in the crate.
///
/// All domain errors are raised inside the owning transaction and cause a
/// full rollback; the (external) transport layer is responsible for mapping
/// them to user-facing responses.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Hard delete forbidden: {0}")]
    ForbiddenHardDelete(String),

    #[error("Allocation exceeds invoice total: {0}")]
    AllocationExceedsInvoice(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Wraps an underlying store failure.
    pub fn db_error<E: Into<DbErr>>(error: E) -> Self {
        ServiceError::DatabaseError(error.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    /// Whether the error is the caller's fault (4xx-equivalent) as opposed
    /// to a store or invariant failure (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_)
                | ServiceError::ValidationError(_)
                | ServiceError::InsufficientStock(_)
                | ServiceError::InvalidTransition(_)
                | ServiceError::ForbiddenHardDelete(_)
                | ServiceError::AllocationExceedsInvoice(_)
                | ServiceError::InvalidOperation(_)
        )
    }
}

/// Errors surfaced during process startup (config load, pool creation,
/// migrations) rather than inside a business operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(ServiceError::InsufficientStock("p1".into()).is_client_error());
        assert!(ServiceError::InvalidTransition("DRAFT -> SHIPPED".into()).is_client_error());
        assert!(ServiceError::ForbiddenHardDelete("stock_items".into()).is_client_error());
        assert!(!ServiceError::InternalError("torn write".into()).is_client_error());
        assert!(!ServiceError::DatabaseError(DbErr::Custom("boom".into())).is_client_error());
    }
}
