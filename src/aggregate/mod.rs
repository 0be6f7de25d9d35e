//! Aggregate module
//!
//! Event-sourced aggregate building blocks. An aggregate owns an ordered
//! event log with a committed/uncommitted boundary; its queryable state is a
//! projection rebuilt by folding the log. The same fold runs during replay
//! and during live mutation, so replay determinism holds by construction.

mod list;

pub use list::{AccessList, AccessListInfo, ListStatus, ResourceConnection};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Behaviour the event log needs from an event type
pub trait PersistedEvent {
    /// The per-aggregate sequence id, unset until the event is persisted
    fn sequence_id(&self) -> Option<i64>;

    /// Record the sequence id assigned by the repository
    fn assign_sequence_id(&mut self, sequence_id: i64);

    /// When the event happened
    fn event_time(&self) -> DateTime<Utc>;
}

/// Ordered event log with a committed/uncommitted boundary
///
/// Events before the boundary have been durably persisted; events after it
/// exist only in memory and are discarded if the request fails before the
/// repository commits them.
#[derive(Debug, Clone)]
pub struct EventLog<E> {
    events: Vec<E>,
    committed: usize,
}

impl<E: PersistedEvent> EventLog<E> {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            committed: 0,
        }
    }

    /// Rebuild a log from already-persisted events, all marked committed
    ///
    /// The events must arrive in ascending sequence order and every one must
    /// carry a persisted sequence id.
    pub fn from_committed(events: Vec<E>) -> Result<Self, DomainError> {
        let mut previous: Option<i64> = None;
        for event in &events {
            let Some(sequence_id) = event.sequence_id() else {
                return Err(DomainError::EventNotPersisted);
            };
            debug_assert!(
                previous.is_none_or(|p| sequence_id > p),
                "event sequence ids must be strictly increasing"
            );
            previous = Some(sequence_id);
        }

        Ok(Self {
            committed: events.len(),
            events,
        })
    }

    /// Append an uncommitted event to the end of the log
    pub fn append(&mut self, event: E) -> &E {
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Advance the committed boundary to the end of the log
    ///
    /// Every event being committed must already carry a persisted sequence
    /// id; a missing id is a bug in the persistence path, not a domain
    /// outcome.
    pub fn commit(&mut self) -> Result<(), DomainError> {
        for event in &self.events[self.committed..] {
            if event.sequence_id().is_none() {
                return Err(DomainError::EventNotPersisted);
            }
        }
        self.committed = self.events.len();
        Ok(())
    }

    /// Sequence id of the last committed event, or 0 for a fresh aggregate
    pub fn committed_version(&self) -> i64 {
        if self.committed == 0 {
            0
        } else {
            self.events[self.committed - 1].sequence_id().unwrap_or(0)
        }
    }

    /// Time of the first event
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(PersistedEvent::event_time)
    }

    /// Time of the most recent event
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(PersistedEvent::event_time)
    }

    pub fn has_uncommitted(&self) -> bool {
        self.committed < self.events.len()
    }

    /// Events past the committed boundary
    pub fn uncommitted(&self) -> &[E] {
        &self.events[self.committed..]
    }

    /// Mutable view of the uncommitted events, for sequence id assignment
    pub fn uncommitted_mut(&mut self) -> &mut [E] {
        &mut self.events[self.committed..]
    }

    /// Drop all uncommitted events
    ///
    /// Nothing durable was changed, so no compensating action is needed.
    pub fn discard_uncommitted(&mut self) {
        self.events.truncate(self.committed);
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E: PersistedEvent> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque version token wrapping an aggregate's committed version
///
/// Used as the optimistic-concurrency token and as the externally visible
/// version tag for conditional requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(i64);

impl VersionTag {
    pub fn new(version: i64) -> Self {
        Self(version)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionTag {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListEvent, ListEventKind};
    use uuid::Uuid;

    fn deleted_event(aggregate_id: Uuid, sequence_id: Option<i64>) -> ListEvent {
        match sequence_id {
            Some(id) => {
                ListEvent::from_persisted(id, aggregate_id, Utc::now(), ListEventKind::Deleted)
            }
            None => ListEvent::new(aggregate_id, Utc::now(), ListEventKind::Deleted),
        }
    }

    #[test]
    fn test_commit_requires_sequence_ids() {
        let aggregate_id = Uuid::new_v4();
        let mut log = EventLog::new();
        log.append(deleted_event(aggregate_id, None));

        assert!(log.has_uncommitted());
        assert_eq!(log.commit(), Err(DomainError::EventNotPersisted));

        // Once the repository stamps an id, commit succeeds
        for event in log.uncommitted_mut() {
            event.assign_sequence_id(1);
        }
        assert_eq!(log.commit(), Ok(()));
        assert!(!log.has_uncommitted());
        assert_eq!(log.committed_version(), 1);
    }

    #[test]
    fn test_from_committed_rejects_unpersisted_events() {
        let aggregate_id = Uuid::new_v4();
        let events = vec![deleted_event(aggregate_id, None)];

        let result = EventLog::from_committed(events);
        assert_eq!(result.err(), Some(DomainError::EventNotPersisted));
    }

    #[test]
    fn test_committed_version_tracks_last_committed_event() {
        let aggregate_id = Uuid::new_v4();
        let events = vec![
            deleted_event(aggregate_id, Some(1)),
            deleted_event(aggregate_id, Some(2)),
            deleted_event(aggregate_id, Some(3)),
        ];

        let mut log = EventLog::from_committed(events).unwrap();
        assert_eq!(log.committed_version(), 3);

        // An uncommitted event does not move the committed version
        log.append(deleted_event(aggregate_id, None));
        assert_eq!(log.committed_version(), 3);
        assert!(log.has_uncommitted());
    }

    #[test]
    fn test_discard_uncommitted() {
        let aggregate_id = Uuid::new_v4();
        let mut log = EventLog::from_committed(vec![deleted_event(aggregate_id, Some(1))]).unwrap();

        log.append(deleted_event(aggregate_id, None));
        log.append(deleted_event(aggregate_id, None));
        assert_eq!(log.len(), 3);

        log.discard_uncommitted();
        assert_eq!(log.len(), 1);
        assert!(!log.has_uncommitted());
        assert_eq!(log.committed_version(), 1);
    }

    #[test]
    fn test_created_and_updated_at() {
        let aggregate_id = Uuid::new_v4();
        let mut log = EventLog::new();
        assert!(log.created_at().is_none());
        assert!(log.updated_at().is_none());

        let first = log.append(deleted_event(aggregate_id, None)).event_time();
        let last = log.append(deleted_event(aggregate_id, None)).event_time();

        assert_eq!(log.created_at(), Some(first));
        assert_eq!(log.updated_at(), Some(last));
        assert!(last >= first);
    }

    #[test]
    fn test_version_tag_round_trip() {
        let tag = VersionTag::new(42);
        let text = tag.to_string();
        assert_eq!(text, "42");
        assert_eq!(text.parse::<VersionTag>().unwrap(), tag);
    }
}
