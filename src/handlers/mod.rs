//! Service handlers module
//!
//! Orchestrates the load → validate → mutate → persist cycle for each
//! operation, returning conditional results as values. Concurrency
//! conflicts retry the whole cycle from scratch; no partial step is ever
//! retried on its own.

mod commands;
mod connection_handler;
mod delete_handler;
mod get_handler;
mod membership_handler;
mod upsert_handler;

#[cfg(test)]
mod tests;

pub use commands::*;
pub use connection_handler::ConnectionHandler;
pub use delete_handler::DeleteListHandler;
pub use get_handler::GetListHandler;
pub use membership_handler::MembershipHandler;
pub use upsert_handler::UpsertListHandler;

use std::time::Duration;

use chrono::Utc;

use crate::aggregate::{AccessList, VersionTag};
use crate::conditional::{ConditionCollection, ConditionOutcome, ConditionalResult, Versioned};
use crate::domain::{DomainError, OperationContext};
use crate::error::AppResult;
use crate::event_store::ListRepository;

/// Bounded retries for writers that lose the append race
pub(crate) const MAX_CONFLICT_RETRIES: u32 = 3;

/// Backoff before the given retry attempt
pub(crate) fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(50 * (attempt as u64 + 1))
}

/// Run the full mutation cycle against an existing list
///
/// Loads the aggregate, validates the preconditions against the current
/// snapshot, applies the mutation and persists. When a racing writer wins
/// the append the whole cycle restarts from the load; the stale aggregate
/// and its uncommitted events are simply dropped.
pub(crate) async fn mutate_list<T, F>(
    repository: &ListRepository,
    resource_owner: &str,
    identifier: &str,
    conditions: &ConditionCollection<VersionTag>,
    context: &OperationContext,
    mutate: F,
) -> AppResult<ConditionalResult<Versioned<T>, VersionTag>>
where
    F: Fn(&mut AccessList) -> Result<T, DomainError>,
{
    let mut attempt = 0;
    loop {
        let Some(mut list) = repository.load_by_key(resource_owner, identifier).await? else {
            return Ok(ConditionalResult::not_found());
        };
        if list.is_deleted() {
            return Ok(ConditionalResult::not_found());
        }

        match conditions.validate(&list) {
            ConditionOutcome::Failed => return Ok(ConditionalResult::condition_failed()),
            ConditionOutcome::Unmodified => {
                // Mutating requests carry is_read = false conditions, which
                // cannot evaluate to Unmodified.
                debug_assert!(false, "unmodified outcome on a mutating request");
                return Ok(ConditionalResult::condition_failed());
            }
            ConditionOutcome::Succeeded => {}
        }

        let fragment = mutate(&mut list)?;
        match repository.apply_changes(&mut list, context).await {
            Ok(()) => {
                let modified_at = list.updated_at().unwrap_or_else(Utc::now);
                return Ok(ConditionalResult::found(Versioned::new(
                    fragment,
                    list.version_tag(),
                    modified_at,
                )));
            }
            Err(e) if e.is_concurrency_conflict() && attempt + 1 < MAX_CONFLICT_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    resource_owner,
                    identifier,
                    "Concurrency conflict, retrying (attempt {}/{})",
                    attempt,
                    MAX_CONFLICT_RETRIES
                );
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
