//! Conditional Result
//!
//! The four-way outcome returned by service flows. Condition misses are
//! first-class values that propagate to the boundary; they are never raised
//! as errors.

use chrono::{DateTime, Utc};

/// Outcome of a conditionally-executed service operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalResult<T, Tag> {
    /// The operation ran and produced a value
    Found(T),

    /// The target entity does not exist
    NotFound,

    /// A read precondition showed the caller already has the current version
    Unmodified {
        version: Tag,
        modified_at: DateTime<Utc>,
    },

    /// A write precondition was not met
    ConditionFailed,
}

impl<T, Tag> ConditionalResult<T, Tag> {
    pub fn found(value: T) -> Self {
        Self::Found(value)
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn unmodified(version: Tag, modified_at: DateTime<Utc>) -> Self {
        Self::Unmodified {
            version,
            modified_at,
        }
    }

    pub fn condition_failed() -> Self {
        Self::ConditionFailed
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Transform the carried value, leaving the other variants untouched
    pub fn map<U, F>(self, f: F) -> ConditionalResult<U, Tag>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Found(value) => ConditionalResult::Found(f(value)),
            Self::NotFound => ConditionalResult::NotFound,
            Self::Unmodified {
                version,
                modified_at,
            } => ConditionalResult::Unmodified {
                version,
                modified_at,
            },
            Self::ConditionFailed => ConditionalResult::ConditionFailed,
        }
    }
}

/// A value paired with the version and modification instant it was read or
/// written at, so callers can emit version headers without a second read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: crate::aggregate::VersionTag,
    pub modified_at: DateTime<Utc>,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: crate::aggregate::VersionTag, modified_at: DateTime<Utc>) -> Self {
        Self {
            value,
            version,
            modified_at,
        }
    }
}
