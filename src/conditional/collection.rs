//! Condition Collection
//!
//! Composes zero or more version conditions. Every condition is evaluated
//! and the maximum severity wins; evaluation stops early once `Failed` is
//! reached since nothing can exceed it.

use super::{ConditionOutcome, VersionCondition, VersionedEntity};

/// An ordered set of version preconditions
///
/// Binding precedence: a presence-based condition takes priority over the
/// time-based condition in the same direction. An unmodified-since check is
/// consulted only when no match condition was supplied, and a modified-since
/// check only when no none-match condition was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionCollection<T> {
    conditions: Vec<VersionCondition<T>>,
}

impl<T> ConditionCollection<T> {
    /// Create an empty collection; validates to `Succeeded`
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    pub fn push(&mut self, condition: VersionCondition<T>) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn conditions(&self) -> &[VersionCondition<T>] {
        &self.conditions
    }

    fn has_match_condition(&self) -> bool {
        self.conditions.iter().any(VersionCondition::is_match_kind)
    }

    fn has_none_match_condition(&self) -> bool {
        self.conditions
            .iter()
            .any(VersionCondition::is_none_match_kind)
    }

    /// Whether the condition should take part in evaluation under the
    /// binding precedence rule
    fn is_binding(&self, condition: &VersionCondition<T>) -> bool {
        match condition {
            VersionCondition::UnmodifiedSince(_) => !self.has_match_condition(),
            VersionCondition::ModifiedSince { .. } => !self.has_none_match_condition(),
            _ => true,
        }
    }

    /// Evaluate every binding condition against a loaded entity and return
    /// the most severe outcome
    pub fn validate<E>(&self, entity: &E) -> ConditionOutcome
    where
        E: VersionedEntity<Tag = T>,
    {
        self.validate_with(|condition| condition.validate(entity))
    }

    /// Evaluate as if the target entity does not exist
    pub fn validate_absent(&self) -> ConditionOutcome {
        self.validate_with(VersionCondition::validate_absent)
    }

    fn validate_with(
        &self,
        evaluate: impl Fn(&VersionCondition<T>) -> ConditionOutcome,
    ) -> ConditionOutcome {
        let mut result = ConditionOutcome::Succeeded;
        for condition in &self.conditions {
            if !self.is_binding(condition) {
                continue;
            }
            result = result.max(evaluate(condition));
            if result == ConditionOutcome::Failed {
                break;
            }
        }
        result
    }
}

impl<T> FromIterator<VersionCondition<T>> for ConditionCollection<T> {
    fn from_iter<I: IntoIterator<Item = VersionCondition<T>>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}
