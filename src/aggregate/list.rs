//! Access List Aggregate
//!
//! An access list is a named, tenant-owned collection of resource
//! connections and members. Its state is derived from events, never
//! directly mutated; every mutator validates the domain rules, appends
//! exactly one event and returns the fragment it affected.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::conditional::VersionedEntity;
use crate::domain::{DomainError, ListEvent, ListEventKind};

use super::{EventLog, PersistedEvent, VersionTag};

/// Lifecycle state of an access list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListStatus {
    Uninitialized,
    Active,
    Deleted,
}

impl Default for ListStatus {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// An allow-listed connection between the list and an external resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConnection {
    pub resource_identifier: String,
    pub actions: BTreeSet<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Metadata snapshot of an access list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessListInfo {
    pub resource_owner: String,
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived state, rebuilt by folding events in order
#[derive(Debug, Clone, Default, PartialEq)]
struct ListProjection {
    status: ListStatus,
    resource_owner: String,
    identifier: String,
    name: String,
    description: String,
    connections: BTreeMap<String, ResourceConnection>,
    members: BTreeSet<Uuid>,
}

/// Access List Aggregate
///
/// Holds the event log and the projection folded from it. Not thread-safe;
/// one logical request owns an instance at a time.
#[derive(Debug, Clone)]
pub struct AccessList {
    id: Uuid,
    log: EventLog<ListEvent>,
    projection: ListProjection,
}

impl AccessList {
    /// Create an empty, uninitialized aggregate shell
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            log: EventLog::new(),
            projection: ListProjection::default(),
        }
    }

    /// Rebuild an aggregate by replaying committed events in ascending
    /// sequence order
    pub fn load_from(id: Uuid, events: Vec<ListEvent>) -> Result<Self, DomainError> {
        let mut projection = ListProjection::default();
        for event in &events {
            debug_assert_eq!(event.aggregate_id(), id, "event belongs to another aggregate");
            Self::fold(&mut projection, event);
        }

        Ok(Self {
            id,
            log: EventLog::from_committed(events)?,
            projection,
        })
    }

    /// The single fold used for both replay and live mutation
    fn fold(projection: &mut ListProjection, event: &ListEvent) {
        let event_time = event.event_time();
        match event.kind() {
            ListEventKind::Created {
                resource_owner,
                identifier,
                name,
                description,
            } => {
                projection.status = ListStatus::Active;
                projection.resource_owner = resource_owner.clone();
                projection.identifier = identifier.clone();
                projection.name = name.clone();
                projection.description = description.clone();
            }

            ListEventKind::Updated {
                identifier,
                name,
                description,
            } => {
                if let Some(identifier) = identifier {
                    projection.identifier = identifier.clone();
                }
                if let Some(name) = name {
                    projection.name = name.clone();
                }
                if let Some(description) = description {
                    projection.description = description.clone();
                }
            }

            ListEventKind::Deleted => {
                projection.status = ListStatus::Deleted;
            }

            ListEventKind::ConnectionCreated {
                resource_identifier,
                actions,
            } => {
                projection.connections.insert(
                    resource_identifier.clone(),
                    ResourceConnection {
                        resource_identifier: resource_identifier.clone(),
                        actions: actions.clone(),
                        created: event_time,
                        modified: event_time,
                    },
                );
            }

            ListEventKind::ConnectionActionsAdded {
                resource_identifier,
                actions,
            } => {
                if let Some(connection) = projection.connections.get_mut(resource_identifier) {
                    connection.actions.extend(actions.iter().cloned());
                    connection.modified = event_time;
                }
            }

            ListEventKind::ConnectionActionsRemoved {
                resource_identifier,
                actions,
            } => {
                if let Some(connection) = projection.connections.get_mut(resource_identifier) {
                    for action in actions {
                        connection.actions.remove(action);
                    }
                    connection.modified = event_time;
                }
            }

            ListEventKind::ConnectionDeleted {
                resource_identifier,
            } => {
                projection.connections.remove(resource_identifier);
            }

            ListEventKind::MembersAdded { party_ids } => {
                projection.members.extend(party_ids.iter().copied());
            }

            ListEventKind::MembersRemoved { party_ids } => {
                for party_id in party_ids {
                    projection.members.remove(party_id);
                }
            }
        }
    }

    /// The single code path used by every mutation method: apply to the
    /// projection immediately, then append as uncommitted
    fn record(&mut self, kind: ListEventKind) {
        let event = ListEvent::new(self.id, Utc::now(), kind);
        Self::fold(&mut self.projection, &event);
        self.log.append(event);
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        match self.projection.status {
            ListStatus::Uninitialized => Err(DomainError::NotInitialized),
            ListStatus::Deleted => Err(DomainError::ListDeleted),
            ListStatus::Active => Ok(()),
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Create the list
    pub fn initialize(
        &mut self,
        resource_owner: String,
        identifier: String,
        name: String,
        description: String,
    ) -> Result<AccessListInfo, DomainError> {
        if self.projection.status != ListStatus::Uninitialized {
            return Err(DomainError::AlreadyInitialized);
        }

        self.record(ListEventKind::Created {
            resource_owner,
            identifier,
            name,
            description,
        });
        Ok(self.as_info())
    }

    /// Change list metadata; `None` means "leave unchanged", not "clear"
    pub fn update(
        &mut self,
        identifier: Option<String>,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<AccessListInfo, DomainError> {
        self.ensure_active()?;
        if identifier.is_none() && name.is_none() && description.is_none() {
            return Err(DomainError::EmptyUpdate);
        }

        self.record(ListEventKind::Updated {
            identifier,
            name,
            description,
        });
        Ok(self.as_info())
    }

    /// Add a connection for a resource with its initial action set
    pub fn add_resource_connection(
        &mut self,
        resource_identifier: String,
        actions: BTreeSet<String>,
    ) -> Result<ResourceConnection, DomainError> {
        self.ensure_active()?;
        if self.projection.connections.contains_key(&resource_identifier) {
            return Err(DomainError::ConnectionExists {
                resource_identifier,
            });
        }

        self.record(ListEventKind::ConnectionCreated {
            resource_identifier: resource_identifier.clone(),
            actions,
        });
        Ok(self.projection.connections[&resource_identifier].clone())
    }

    /// Union actions into an existing connection's action set
    pub fn add_resource_connection_actions(
        &mut self,
        resource_identifier: String,
        actions: BTreeSet<String>,
    ) -> Result<ResourceConnection, DomainError> {
        self.ensure_active()?;
        if actions.is_empty() {
            return Err(DomainError::EmptyChangeSet);
        }

        let connection = self
            .projection
            .connections
            .get(&resource_identifier)
            .ok_or_else(|| DomainError::ConnectionNotFound {
                resource_identifier: resource_identifier.clone(),
            })?;
        for action in &actions {
            if connection.actions.contains(action) {
                return Err(DomainError::DuplicateAction {
                    resource_identifier,
                    action: action.clone(),
                });
            }
        }

        self.record(ListEventKind::ConnectionActionsAdded {
            resource_identifier: resource_identifier.clone(),
            actions,
        });
        Ok(self.projection.connections[&resource_identifier].clone())
    }

    /// Remove actions from an existing connection; the remove-set must be a
    /// subset of the current actions
    pub fn remove_resource_connection_actions(
        &mut self,
        resource_identifier: String,
        actions: BTreeSet<String>,
    ) -> Result<ResourceConnection, DomainError> {
        self.ensure_active()?;
        if actions.is_empty() {
            return Err(DomainError::EmptyChangeSet);
        }

        let connection = self
            .projection
            .connections
            .get(&resource_identifier)
            .ok_or_else(|| DomainError::ConnectionNotFound {
                resource_identifier: resource_identifier.clone(),
            })?;
        for action in &actions {
            if !connection.actions.contains(action) {
                return Err(DomainError::MissingAction {
                    resource_identifier,
                    action: action.clone(),
                });
            }
        }

        self.record(ListEventKind::ConnectionActionsRemoved {
            resource_identifier: resource_identifier.clone(),
            actions,
        });
        Ok(self.projection.connections[&resource_identifier].clone())
    }

    /// Remove a connection; returns its last state before removal
    pub fn remove_resource_connection(
        &mut self,
        resource_identifier: String,
    ) -> Result<ResourceConnection, DomainError> {
        self.ensure_active()?;
        let connection = self
            .projection
            .connections
            .get(&resource_identifier)
            .ok_or_else(|| DomainError::ConnectionNotFound {
                resource_identifier: resource_identifier.clone(),
            })?
            .clone();

        self.record(ListEventKind::ConnectionDeleted {
            resource_identifier,
        });
        Ok(connection)
    }

    /// Add parties as members; adding an existing member is an error, not a
    /// silent no-op
    pub fn add_members(
        &mut self,
        party_ids: BTreeSet<Uuid>,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        self.ensure_active()?;
        if party_ids.is_empty() {
            return Err(DomainError::EmptyChangeSet);
        }
        for party_id in &party_ids {
            if self.projection.members.contains(party_id) {
                return Err(DomainError::DuplicateMember {
                    party_id: *party_id,
                });
            }
        }

        self.record(ListEventKind::MembersAdded { party_ids });
        Ok(self.projection.members.clone())
    }

    /// Remove member parties; removing a non-member is an error
    pub fn remove_members(
        &mut self,
        party_ids: BTreeSet<Uuid>,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        self.ensure_active()?;
        if party_ids.is_empty() {
            return Err(DomainError::EmptyChangeSet);
        }
        for party_id in &party_ids {
            if !self.projection.members.contains(party_id) {
                return Err(DomainError::MissingMember {
                    party_id: *party_id,
                });
            }
        }

        self.record(ListEventKind::MembersRemoved { party_ids });
        Ok(self.projection.members.clone())
    }

    /// Mark the tombstone; all further mutation fails
    pub fn delete(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.record(ListEventKind::Deleted);
        Ok(())
    }

    // =========================================================================
    // Log plumbing, used by the repository
    // =========================================================================

    /// Advance the committed boundary; every uncommitted event must already
    /// carry a persisted sequence id
    pub fn commit(&mut self) -> Result<(), DomainError> {
        self.log.commit()
    }

    /// Drop in-memory uncommitted events after a failed persistence attempt
    pub fn discard_uncommitted_events(&mut self) {
        self.log.discard_uncommitted();
    }

    pub fn uncommitted_events(&self) -> &[ListEvent] {
        self.log.uncommitted()
    }

    pub fn uncommitted_events_mut(&mut self) -> &mut [ListEvent] {
        self.log.uncommitted_mut()
    }

    pub fn events(&self) -> &[ListEvent] {
        self.log.events()
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> ListStatus {
        self.projection.status
    }

    pub fn is_initialized(&self) -> bool {
        self.projection.status != ListStatus::Uninitialized
    }

    pub fn is_deleted(&self) -> bool {
        self.projection.status == ListStatus::Deleted
    }

    pub fn resource_owner(&self) -> &str {
        &self.projection.resource_owner
    }

    pub fn identifier(&self) -> &str {
        &self.projection.identifier
    }

    pub fn name(&self) -> &str {
        &self.projection.name
    }

    pub fn description(&self) -> &str {
        &self.projection.description
    }

    pub fn connections(&self) -> &BTreeMap<String, ResourceConnection> {
        &self.projection.connections
    }

    pub fn members(&self) -> &BTreeSet<Uuid> {
        &self.projection.members
    }

    /// Sequence id of the last committed event; doubles as the
    /// optimistic-concurrency token
    pub fn committed_version(&self) -> i64 {
        self.log.committed_version()
    }

    pub fn version_tag(&self) -> VersionTag {
        VersionTag::new(self.log.committed_version())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.log.created_at()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.log.updated_at()
    }

    pub fn has_uncommitted_events(&self) -> bool {
        self.log.has_uncommitted()
    }

    /// Metadata snapshot; meaningful once the list is initialized
    pub fn as_info(&self) -> AccessListInfo {
        AccessListInfo {
            resource_owner: self.projection.resource_owner.clone(),
            identifier: self.projection.identifier.clone(),
            name: self.projection.name.clone(),
            description: self.projection.description.clone(),
            created_at: self.log.created_at().unwrap_or_default(),
            updated_at: self.log.updated_at().unwrap_or_default(),
        }
    }
}

impl VersionedEntity for AccessList {
    type Tag = VersionTag;

    fn version_matches(&self, tag: &VersionTag) -> bool {
        self.log.committed_version() == tag.value()
    }

    fn modified_since(&self, instant: DateTime<Utc>) -> bool {
        // Compared at whole-second resolution, matching the precision of the
        // caller-facing last-modified value.
        match self.log.updated_at() {
            Some(updated_at) => updated_at.trunc_subsecs(0) > instant.trunc_subsecs(0),
            None => false,
        }
    }
}
