//! Domain Events
//!
//! Event definitions for the access list aggregate. Events are immutable
//! facts; the projection is rebuilt by folding them in sequence order.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::PersistedEvent;

/// The closed set of facts that can happen to an access list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ListEventKind {
    /// List was created
    Created {
        resource_owner: String,
        identifier: String,
        name: String,
        description: String,
    },

    /// List metadata was changed; absent fields were left untouched
    Updated {
        #[serde(skip_serializing_if = "Option::is_none")]
        identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// List was deleted (terminal)
    Deleted,

    /// A resource connection was added with its initial action set
    ConnectionCreated {
        resource_identifier: String,
        actions: BTreeSet<String>,
    },

    /// Actions were added to an existing resource connection
    ConnectionActionsAdded {
        resource_identifier: String,
        actions: BTreeSet<String>,
    },

    /// Actions were removed from an existing resource connection
    ConnectionActionsRemoved {
        resource_identifier: String,
        actions: BTreeSet<String>,
    },

    /// A resource connection was removed entirely
    ConnectionDeleted { resource_identifier: String },

    /// Parties were added as members
    MembersAdded { party_ids: BTreeSet<Uuid> },

    /// Parties were removed from the members
    MembersRemoved { party_ids: BTreeSet<Uuid> },
}

impl ListEventKind {
    /// Get the event type as a string (for storage)
    pub fn event_type(&self) -> &'static str {
        match self {
            ListEventKind::Created { .. } => "Created",
            ListEventKind::Updated { .. } => "Updated",
            ListEventKind::Deleted => "Deleted",
            ListEventKind::ConnectionCreated { .. } => "ConnectionCreated",
            ListEventKind::ConnectionActionsAdded { .. } => "ConnectionActionsAdded",
            ListEventKind::ConnectionActionsRemoved { .. } => "ConnectionActionsRemoved",
            ListEventKind::ConnectionDeleted { .. } => "ConnectionDeleted",
            ListEventKind::MembersAdded { .. } => "MembersAdded",
            ListEventKind::MembersRemoved { .. } => "MembersRemoved",
        }
    }
}

/// An event in an access list's history
///
/// `sequence_id` is unset until the event has been persisted; once assigned
/// it is immutable, unique and strictly increasing within the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEvent {
    sequence_id: Option<i64>,
    aggregate_id: Uuid,
    event_time: DateTime<Utc>,
    #[serde(flatten)]
    kind: ListEventKind,
}

impl ListEvent {
    /// Create a new, not yet persisted event
    pub fn new(aggregate_id: Uuid, event_time: DateTime<Utc>, kind: ListEventKind) -> Self {
        Self {
            sequence_id: None,
            aggregate_id,
            event_time,
            kind,
        }
    }

    /// Reconstruct an event from its persisted record
    pub fn from_persisted(
        sequence_id: i64,
        aggregate_id: Uuid,
        event_time: DateTime<Utc>,
        kind: ListEventKind,
    ) -> Self {
        Self {
            sequence_id: Some(sequence_id),
            aggregate_id,
            event_time,
            kind,
        }
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn kind(&self) -> &ListEventKind {
        &self.kind
    }

    /// Get the event type as a string (for storage)
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

impl PersistedEvent for ListEvent {
    fn sequence_id(&self) -> Option<i64> {
        self.sequence_id
    }

    fn assign_sequence_id(&mut self, sequence_id: i64) {
        debug_assert!(self.sequence_id.is_none(), "sequence id assigned twice");
        self.sequence_id = Some(sequence_id);
    }

    fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serialization() {
        let kind = ListEventKind::ConnectionActionsAdded {
            resource_identifier: "tax-api".to_string(),
            actions: BTreeSet::from(["read".to_string(), "write".to_string()]),
        };

        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("ConnectionActionsAdded"));
        assert!(json.contains("tax-api"));

        let deserialized: ListEventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, deserialized);
    }

    #[test]
    fn test_updated_event_omits_unchanged_fields() {
        let kind = ListEventKind::Updated {
            identifier: None,
            name: Some("New name".to_string()),
            description: None,
        };

        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("name"));
        assert!(!json.contains("identifier"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_sequence_id_assignment() {
        let mut event = ListEvent::new(Uuid::new_v4(), Utc::now(), ListEventKind::Deleted);
        assert!(event.sequence_id().is_none());

        event.assign_sequence_id(7);
        assert_eq!(event.sequence_id(), Some(7));
    }

    #[test]
    fn test_event_type_names() {
        let kind = ListEventKind::MembersAdded {
            party_ids: BTreeSet::new(),
        };
        assert_eq!(kind.event_type(), "MembersAdded");
        assert_eq!(ListEventKind::Deleted.event_type(), "Deleted");
    }
}
