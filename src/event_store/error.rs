//! Event Store Errors
//!
//! Error types for event store operations.

use uuid::Uuid;

use crate::domain::DomainError;

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict; a racing writer won the append
    #[error("Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// A list rename collided with another list of the same owner
    #[error("Identifier already in use by owner '{resource_owner}': {identifier}")]
    IdentifierInUse {
        resource_owner: String,
        identifier: String,
    },

    /// Stored data that cannot be replayed
    #[error("Invalid event record: {0}")]
    InvalidEventRecord(String),

    /// Aggregate invariant violated while replaying or committing
    #[error(transparent)]
    Invariant(#[from] DomainError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }

    /// Check if retrying the whole load-validate-mutate-save cycle may help
    pub fn is_retryable(&self) -> bool {
        self.is_concurrency_conflict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_conflict_is_retryable() {
        let conflict = EventStoreError::ConcurrencyConflict {
            aggregate_id: Uuid::new_v4(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_retryable());
        assert!(conflict.is_concurrency_conflict());

        let invariant = EventStoreError::Invariant(DomainError::EventNotPersisted);
        assert!(!invariant.is_retryable());
    }
}
