//! Integration tests for the aggregate and conditional layers
//!
//! Drives the public library API the way the service layer does, with the
//! repository's id assignment simulated in-process. No database required.

use std::collections::BTreeSet;

use access_registry::aggregate::PersistedEvent;
use access_registry::{
    AccessList, ConditionCollection, ConditionOutcome, DomainError, VersionCondition, VersionTag,
    VersionedEntity,
};
use uuid::Uuid;

/// Assign sequence ids to uncommitted events and commit, as the repository
/// does after a successful append
fn persist(list: &mut AccessList) {
    let mut next = list.committed_version();
    for event in list.uncommitted_events_mut() {
        next += 1;
        event.assign_sequence_id(next);
    }
    list.commit().unwrap();
}

fn approved_banks() -> AccessList {
    let mut list = AccessList::new(Uuid::new_v4());
    list.initialize(
        "skd".to_string(),
        "banks".to_string(),
        "Approved banks".to_string(),
        "desc".to_string(),
    )
    .unwrap();
    persist(&mut list);
    list
}

fn actions(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn full_lifecycle_replays_identically() {
    let mut list = approved_banks();
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();

    list.add_resource_connection("tax-api".to_string(), actions(&["read"]))
        .unwrap();
    list.add_resource_connection_actions("tax-api".to_string(), actions(&["write"]))
        .unwrap();
    list.add_members(BTreeSet::from([p1, p2])).unwrap();
    list.remove_resource_connection_actions("tax-api".to_string(), actions(&["read"]))
        .unwrap();
    list.update(None, Some("Banks".to_string()), None).unwrap();
    persist(&mut list);

    assert_eq!(list.committed_version(), 6);

    let replayed = AccessList::load_from(list.id(), list.events().to_vec()).unwrap();
    assert_eq!(replayed.committed_version(), 6);
    assert_eq!(replayed.as_info(), list.as_info());
    assert_eq!(replayed.members(), list.members());
    assert_eq!(replayed.connections(), list.connections());
    assert_eq!(
        replayed.connections()["tax-api"].actions,
        actions(&["write"])
    );
    assert_eq!(replayed.name(), "Banks");
}

#[test]
fn committed_version_advances_once_per_persisted_event() {
    let mut list = approved_banks();
    assert_eq!(list.committed_version(), 1);

    list.add_members(BTreeSet::from([Uuid::new_v4()])).unwrap();
    assert_eq!(list.committed_version(), 1);
    persist(&mut list);
    assert_eq!(list.committed_version(), 2);

    // A failed persistence attempt discards the events without moving the
    // committed version
    list.update(None, Some("Other".to_string()), None).unwrap();
    list.discard_uncommitted_events();
    assert_eq!(list.committed_version(), 2);
}

#[test]
fn conditional_read_flow() {
    let list = approved_banks();
    let current = list.version_tag();

    // First read: no conditions
    let conditions: ConditionCollection<VersionTag> = ConditionCollection::new();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Succeeded);

    // Poll with the tag from the first read: nothing changed
    let conditions: ConditionCollection<VersionTag> = [VersionCondition::IsDifferent {
        tag: current,
        is_read: true,
    }]
    .into_iter()
    .collect();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Unmodified);

    // Poll with a stale tag: changed, serve the new representation
    let conditions: ConditionCollection<VersionTag> = [VersionCondition::IsDifferent {
        tag: VersionTag::new(0),
        is_read: true,
    }]
    .into_iter()
    .collect();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Succeeded);
}

#[test]
fn conditional_write_flow() {
    let mut list = approved_banks();
    let stale = list.version_tag();

    list.add_members(BTreeSet::from([Uuid::new_v4()])).unwrap();
    persist(&mut list);

    // A writer holding the stale tag must not clobber the newer state
    let conditions: ConditionCollection<VersionTag> =
        [VersionCondition::IsMatch(stale)].into_iter().collect();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Failed);

    // A writer holding the current tag may proceed
    let conditions: ConditionCollection<VersionTag> =
        [VersionCondition::IsMatch(list.version_tag())].into_iter().collect();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Succeeded);
}

#[test]
fn modified_since_uses_second_precision() {
    let list = approved_banks();
    let updated_at = list.updated_at().unwrap();

    assert!(!list.modified_since(updated_at));
    assert!(list.modified_since(updated_at - chrono::Duration::seconds(2)));
}

#[test]
fn deleted_list_rejects_further_mutation() {
    let mut list = approved_banks();
    list.delete().unwrap();
    persist(&mut list);

    assert!(list.is_deleted());
    let result = list.update(None, Some("Renamed".to_string()), None);
    assert_eq!(result.err(), Some(DomainError::ListDeleted));
}

#[test]
fn create_only_upsert_decision() {
    // If-None-Match: * — creation allowed against nothing, rejected once the
    // list exists
    let conditions: ConditionCollection<VersionTag> =
        [VersionCondition::NotExists { is_read: false }].into_iter().collect();

    assert_eq!(conditions.validate_absent(), ConditionOutcome::Succeeded);

    let list = approved_banks();
    assert_eq!(conditions.validate(&list), ConditionOutcome::Failed);
}
