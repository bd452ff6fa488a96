use sea_orm::error::DbErr;
use serde::Serialize;
use thiserror::Error;

use crate::entities::purchase_requisition::RequisitionStatus;

/// Error taxonomy of the procurement engine.
///
/// Expected conditions are not errors: a duplicate open requisition surfaces
/// as a no-op outcome from the generator, never as `AlreadyExists`. That
/// variant is reserved for callers that insist on creation semantics.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: RequisitionStatus,
        to: RequisitionStatus,
    },

    #[error("Insufficient authority: {0}")]
    InsufficientAuthority(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("BOM cycle detected: {0}")]
    BomCycle(String),
}

impl ServiceError {
    pub fn db_error(err: DbErr) -> Self {
        ServiceError::PersistenceFailure(err)
    }

    /// Stable machine-readable category, used by embedding applications to
    /// map engine failures onto their own response formats.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::PersistenceFailure(_) => ErrorCategory::Persistence,
            ServiceError::NotFound(_) => ErrorCategory::NotFound,
            ServiceError::AlreadyExists(_) => ErrorCategory::Conflict,
            ServiceError::InvalidTransition { .. } => ErrorCategory::Conflict,
            ServiceError::InsufficientAuthority(_) => ErrorCategory::Forbidden,
            ServiceError::Validation(_) => ErrorCategory::Invalid,
            ServiceError::BomCycle(_) => ErrorCategory::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Persistence,
    NotFound,
    Conflict,
    Forbidden,
    Invalid,
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_both_states() {
        let err = ServiceError::InvalidTransition {
            from: RequisitionStatus::Rejected,
            to: RequisitionStatus::Approved,
        };
        let msg = err.to_string();
        assert!(msg.contains("Rejected"));
        assert!(msg.contains("Approved"));
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn db_errors_map_to_persistence_category() {
        let err = ServiceError::db_error(DbErr::Custom("connection reset".into()));
        assert_eq!(err.category(), ErrorCategory::Persistence);
    }
}
