//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors
///
/// These errors represent business rule violations and aggregate invariant
/// failures. They are independent of the web/infrastructure layer and are
/// fatal to the request that triggered them, never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Create was called on a list that already exists
    #[error("Access list is already initialized")]
    AlreadyInitialized,

    /// A mutator was called before the list was created
    #[error("Access list has not been initialized")]
    NotInitialized,

    /// A mutator was called after the list was deleted
    #[error("Access list is deleted")]
    ListDeleted,

    /// Update was called with no fields to change
    #[error("Update requires at least one field")]
    EmptyUpdate,

    /// An add/remove operation was called with an empty set
    #[error("Operation requires at least one item")]
    EmptyChangeSet,

    /// A resource connection for this resource already exists
    #[error("Resource connection already exists: {resource_identifier}")]
    ConnectionExists { resource_identifier: String },

    /// No resource connection exists for this resource
    #[error("Resource connection not found: {resource_identifier}")]
    ConnectionNotFound { resource_identifier: String },

    /// An action being added is already allow-listed on the connection
    #[error("Action '{action}' already present on connection: {resource_identifier}")]
    DuplicateAction {
        resource_identifier: String,
        action: String,
    },

    /// An action being removed is not allow-listed on the connection
    #[error("Action '{action}' not present on connection: {resource_identifier}")]
    MissingAction {
        resource_identifier: String,
        action: String,
    },

    /// A party being added is already a member
    #[error("Party is already a member: {party_id}")]
    DuplicateMember { party_id: Uuid },

    /// A party being removed is not a member
    #[error("Party is not a member: {party_id}")]
    MissingMember { party_id: Uuid },

    /// Commit was attempted while an event had no persisted sequence id
    #[error("Cannot commit an event that has not been assigned a sequence id")]
    EventNotPersisted,
}

impl DomainError {
    /// Check if this error means a referenced item does not exist
    pub fn is_missing_target(&self) -> bool {
        matches!(
            self,
            Self::ConnectionNotFound { .. } | Self::MissingAction { .. } | Self::MissingMember { .. }
        )
    }

    /// Check if this error means the request collides with existing state
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInitialized
                | Self::ConnectionExists { .. }
                | Self::DuplicateAction { .. }
                | Self::DuplicateMember { .. }
        )
    }

    /// Check if this error indicates a bug in the calling code rather than
    /// bad request input
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::EventNotPersisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_member_error() {
        let party_id = Uuid::new_v4();
        let err = DomainError::DuplicateMember { party_id };

        assert!(err.is_duplicate());
        assert!(!err.is_missing_target());
        assert!(err.to_string().contains(&party_id.to_string()));
    }

    #[test]
    fn test_missing_action_error() {
        let err = DomainError::MissingAction {
            resource_identifier: "tax-api".to_string(),
            action: "write".to_string(),
        };

        assert!(err.is_missing_target());
        assert!(err.to_string().contains("tax-api"));
        assert!(err.to_string().contains("write"));
    }

    #[test]
    fn test_event_not_persisted_is_programming_error() {
        assert!(DomainError::EventNotPersisted.is_programming_error());
        assert!(!DomainError::ListDeleted.is_programming_error());
    }
}
