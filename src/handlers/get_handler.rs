//! Get List Handler
//!
//! Read flows: list metadata and event history.

use chrono::Utc;
use sqlx::PgPool;

use crate::aggregate::{AccessListInfo, VersionTag};
use crate::conditional::{ConditionOutcome, ConditionalResult, Versioned};
use crate::domain::ListEvent;
use crate::error::AppResult;
use crate::event_store::ListRepository;

use super::GetListQuery;

/// Handler for list reads
pub struct GetListHandler {
    repository: ListRepository,
}

impl GetListHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ListRepository::new(pool),
        }
    }

    /// Read the list's metadata snapshot
    pub async fn execute(
        &self,
        query: GetListQuery,
    ) -> AppResult<ConditionalResult<Versioned<AccessListInfo>, VersionTag>> {
        let Some(list) = self
            .repository
            .load_by_key(&query.resource_owner, &query.identifier)
            .await?
        else {
            return Ok(ConditionalResult::not_found());
        };
        if list.is_deleted() {
            return Ok(ConditionalResult::not_found());
        }

        let modified_at = list.updated_at().unwrap_or_else(Utc::now);
        match query.conditions.validate(&list) {
            ConditionOutcome::Failed => Ok(ConditionalResult::condition_failed()),
            ConditionOutcome::Unmodified => {
                Ok(ConditionalResult::unmodified(list.version_tag(), modified_at))
            }
            ConditionOutcome::Succeeded => Ok(ConditionalResult::found(Versioned::new(
                list.as_info(),
                list.version_tag(),
                modified_at,
            ))),
        }
    }

    /// Read the list's full change history, ascending
    pub async fn history(
        &self,
        query: GetListQuery,
    ) -> AppResult<ConditionalResult<Versioned<Vec<ListEvent>>, VersionTag>> {
        let Some(list) = self
            .repository
            .load_by_key(&query.resource_owner, &query.identifier)
            .await?
        else {
            return Ok(ConditionalResult::not_found());
        };
        if list.is_deleted() {
            return Ok(ConditionalResult::not_found());
        }

        let modified_at = list.updated_at().unwrap_or_else(Utc::now);
        match query.conditions.validate(&list) {
            ConditionOutcome::Failed => Ok(ConditionalResult::condition_failed()),
            ConditionOutcome::Unmodified => {
                Ok(ConditionalResult::unmodified(list.version_tag(), modified_at))
            }
            ConditionOutcome::Succeeded => Ok(ConditionalResult::found(Versioned::new(
                list.events().to_vec(),
                list.version_tag(),
                modified_at,
            ))),
        }
    }
}
