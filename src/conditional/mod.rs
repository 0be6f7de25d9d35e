//! Conditional request evaluation
//!
//! A small algebra of version preconditions evaluated against anything that
//! exposes a version token and a last-modified instant. Outcomes compose by
//! severity ("most restrictive wins") and surface to callers as ordinary
//! values, never as errors.

mod collection;
mod condition;
mod result;

pub use collection::ConditionCollection;
pub use condition::{ConditionOutcome, VersionCondition};
pub use result::{ConditionalResult, Versioned};

use chrono::{DateTime, Utc};

/// Capability exposed by anything a version condition can be checked against
pub trait VersionedEntity {
    /// The opaque version token type
    type Tag;

    /// Whether the entity's current version equals the given tag
    fn version_matches(&self, tag: &Self::Tag) -> bool;

    /// Whether the entity was modified after the given instant, compared at
    /// whole-second resolution
    fn modified_since(&self, instant: DateTime<Utc>) -> bool;
}
