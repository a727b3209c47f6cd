use crate::types::{DbId, Timestamp};

/// Domain error taxonomy shared by every layer above `core`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The entity exists but belongs to a different parent.
    #[error("{entity} {id} does not belong to {parent} {parent_id}")]
    NotOwned {
        entity: &'static str,
        id: DbId,
        parent: &'static str,
        parent_id: DbId,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Forbidden because of the failed-attempt lockout. Kept apart from
    /// [`CoreError::Forbidden`] so callers can tell it from bad credentials
    /// and from policy denials.
    #[error("Account is locked until {until}")]
    AccountLocked { until: Timestamp },

    #[error("Internal error: {0}")]
    Internal(String),
}
