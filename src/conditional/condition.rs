//! Version Conditions
//!
//! Each condition evaluates a single precondition against a versioned
//! entity. The `is_read` flag softens a miss into `Unmodified` for read
//! requests, where the caller is asking "has anything changed?" rather than
//! guarding a write.

use chrono::{DateTime, Utc};

use super::VersionedEntity;

/// Outcome of evaluating a condition, ordered by severity
///
/// `Succeeded < Unmodified < Failed`; when several conditions are combined
/// the most severe outcome wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConditionOutcome {
    Succeeded,
    Unmodified,
    Failed,
}

impl ConditionOutcome {
    pub fn is_succeeded(self) -> bool {
        self == Self::Succeeded
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }
}

/// A single version precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCondition<T> {
    /// The entity's version must equal the tag
    IsMatch(T),

    /// Wildcard "must exist"; trivially satisfied once the entity is loaded
    Exists,

    /// The entity's version must differ from the tag
    IsDifferent { tag: T, is_read: bool },

    /// Wildcard "must not exist"; can never succeed against a loaded entity
    NotExists { is_read: bool },

    /// The entity must have been modified after the instant
    ModifiedSince {
        date: DateTime<Utc>,
        is_read: bool,
    },

    /// The entity must not have been modified after the instant
    UnmodifiedSince(DateTime<Utc>),
}

impl<T> VersionCondition<T> {
    /// Evaluate against a loaded entity
    pub fn validate<E>(&self, entity: &E) -> ConditionOutcome
    where
        E: VersionedEntity<Tag = T>,
    {
        match self {
            VersionCondition::IsMatch(tag) => {
                if entity.version_matches(tag) {
                    ConditionOutcome::Succeeded
                } else {
                    ConditionOutcome::Failed
                }
            }

            VersionCondition::Exists => ConditionOutcome::Succeeded,

            VersionCondition::IsDifferent { tag, is_read } => {
                if !entity.version_matches(tag) {
                    ConditionOutcome::Succeeded
                } else if *is_read {
                    ConditionOutcome::Unmodified
                } else {
                    ConditionOutcome::Failed
                }
            }

            VersionCondition::NotExists { is_read } => {
                if *is_read {
                    ConditionOutcome::Unmodified
                } else {
                    ConditionOutcome::Failed
                }
            }

            VersionCondition::ModifiedSince { date, is_read } => {
                if entity.modified_since(*date) {
                    ConditionOutcome::Succeeded
                } else if *is_read {
                    ConditionOutcome::Unmodified
                } else {
                    ConditionOutcome::Failed
                }
            }

            VersionCondition::UnmodifiedSince(date) => {
                if !entity.modified_since(*date) {
                    ConditionOutcome::Succeeded
                } else {
                    ConditionOutcome::Failed
                }
            }
        }
    }

    /// Evaluate as if the target entity does not exist
    ///
    /// Used by the upsert flow to decide whether creation is allowed before
    /// anything is loaded. Version-bound conditions cannot hold against
    /// nothing; the time-based conditions are trivially satisfied.
    pub fn validate_absent(&self) -> ConditionOutcome {
        match self {
            VersionCondition::IsMatch(_) | VersionCondition::Exists => ConditionOutcome::Failed,
            VersionCondition::IsDifferent { .. }
            | VersionCondition::NotExists { .. }
            | VersionCondition::ModifiedSince { .. }
            | VersionCondition::UnmodifiedSince(_) => ConditionOutcome::Succeeded,
        }
    }

    /// Whether this is a presence-based condition in the "match" direction
    pub(super) fn is_match_kind(&self) -> bool {
        matches!(self, VersionCondition::IsMatch(_) | VersionCondition::Exists)
    }

    /// Whether this is a presence-based condition in the "none-match"
    /// direction
    pub(super) fn is_none_match_kind(&self) -> bool {
        matches!(
            self,
            VersionCondition::IsDifferent { .. } | VersionCondition::NotExists { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Minimal versioned entity for exercising the algebra
    struct Entity {
        version: String,
        updated_at: DateTime<Utc>,
    }

    impl VersionedEntity for Entity {
        type Tag = String;

        fn version_matches(&self, tag: &String) -> bool {
            self.version == *tag
        }

        fn modified_since(&self, instant: DateTime<Utc>) -> bool {
            self.updated_at > instant
        }
    }

    fn entity(version: &str) -> Entity {
        Entity {
            version: version.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ConditionOutcome::Succeeded < ConditionOutcome::Unmodified);
        assert!(ConditionOutcome::Unmodified < ConditionOutcome::Failed);
    }

    #[test]
    fn test_is_match() {
        let condition = VersionCondition::IsMatch("v1".to_string());
        assert_eq!(condition.validate(&entity("v1")), ConditionOutcome::Succeeded);
        assert_eq!(condition.validate(&entity("v2")), ConditionOutcome::Failed);
    }

    #[test]
    fn test_exists_succeeds_against_loaded_entity() {
        let condition: VersionCondition<String> = VersionCondition::Exists;
        assert_eq!(condition.validate(&entity("v1")), ConditionOutcome::Succeeded);
    }

    #[test]
    fn test_is_different_read_vs_write() {
        let read = VersionCondition::IsDifferent {
            tag: "v1".to_string(),
            is_read: true,
        };
        assert_eq!(read.validate(&entity("v1")), ConditionOutcome::Unmodified);
        assert_eq!(read.validate(&entity("v2")), ConditionOutcome::Succeeded);

        let write = VersionCondition::IsDifferent {
            tag: "v1".to_string(),
            is_read: false,
        };
        assert_eq!(write.validate(&entity("v1")), ConditionOutcome::Failed);
        assert_eq!(write.validate(&entity("v2")), ConditionOutcome::Succeeded);
    }

    #[test]
    fn test_not_exists_never_succeeds_against_loaded_entity() {
        let read: VersionCondition<String> = VersionCondition::NotExists { is_read: true };
        assert_eq!(read.validate(&entity("v1")), ConditionOutcome::Unmodified);

        let write: VersionCondition<String> = VersionCondition::NotExists { is_read: false };
        assert_eq!(write.validate(&entity("v1")), ConditionOutcome::Failed);
    }

    #[test]
    fn test_modified_since() {
        let target = entity("v1");
        let before = target.updated_at - Duration::minutes(5);
        let after = target.updated_at + Duration::minutes(5);

        let modified_read = VersionCondition::ModifiedSince {
            date: before,
            is_read: true,
        };
        assert_eq!(modified_read.validate(&target), ConditionOutcome::Succeeded);

        let unchanged_read = VersionCondition::ModifiedSince {
            date: after,
            is_read: true,
        };
        assert_eq!(unchanged_read.validate(&target), ConditionOutcome::Unmodified);

        let unchanged_write = VersionCondition::ModifiedSince {
            date: after,
            is_read: false,
        };
        assert_eq!(unchanged_write.validate(&target), ConditionOutcome::Failed);
    }

    #[test]
    fn test_unmodified_since() {
        let target = entity("v1");
        let before = target.updated_at - Duration::minutes(5);
        let after = target.updated_at + Duration::minutes(5);

        let stale = VersionCondition::UnmodifiedSince(before);
        assert_eq!(stale.validate(&target), ConditionOutcome::Failed);

        let fresh = VersionCondition::UnmodifiedSince(after);
        assert_eq!(fresh.validate(&target), ConditionOutcome::Succeeded);
    }

    #[test]
    fn test_validate_absent() {
        let now = Utc::now();

        let is_match = VersionCondition::IsMatch("v1".to_string());
        assert_eq!(is_match.validate_absent(), ConditionOutcome::Failed);
        let exists: VersionCondition<String> = VersionCondition::Exists;
        assert_eq!(exists.validate_absent(), ConditionOutcome::Failed);

        let not_exists: VersionCondition<String> = VersionCondition::NotExists { is_read: false };
        assert_eq!(not_exists.validate_absent(), ConditionOutcome::Succeeded);
        let different = VersionCondition::IsDifferent {
            tag: "v1".to_string(),
            is_read: false,
        };
        assert_eq!(different.validate_absent(), ConditionOutcome::Succeeded);

        let unmodified: VersionCondition<String> = VersionCondition::UnmodifiedSince(now);
        assert_eq!(unmodified.validate_absent(), ConditionOutcome::Succeeded);
    }
}
