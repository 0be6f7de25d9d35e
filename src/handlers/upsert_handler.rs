//! Upsert List Handler
//!
//! Atomic create-or-update. Whether creation is allowed is decided against
//! the absent entity before anything is loaded, so the create-vs-update
//! decision stays atomic with the repository's load-or-create primitive.

use chrono::Utc;
use sqlx::PgPool;

use crate::aggregate::{AccessList, AccessListInfo, VersionTag};
use crate::conditional::{ConditionOutcome, ConditionalResult, Versioned};
use crate::domain::OperationContext;
use crate::error::{AppError, AppResult};
use crate::event_store::ListRepository;

use super::{retry_delay, UpsertListCommand, MAX_CONFLICT_RETRIES};

/// Handler for list creation and metadata updates
pub struct UpsertListHandler {
    repository: ListRepository,
}

impl UpsertListHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ListRepository::new(pool),
        }
    }

    /// Execute the upsert command, retrying the whole cycle on conflicts
    pub async fn execute(
        &self,
        command: UpsertListCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<AccessListInfo>, VersionTag>> {
        let mut attempt = 0;
        loop {
            let result = self.try_execute(&command, context).await;
            match result {
                Err(AppError::EventStore(ref e))
                    if e.is_concurrency_conflict() && attempt + 1 < MAX_CONFLICT_RETRIES =>
                {
                    attempt += 1;
                    tracing::warn!(
                        resource_owner = %command.resource_owner,
                        identifier = %command.identifier,
                        "Concurrency conflict, retrying (attempt {}/{})",
                        attempt,
                        MAX_CONFLICT_RETRIES
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                result => return result,
            }
        }
    }

    async fn try_execute(
        &self,
        command: &UpsertListCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<AccessListInfo>, VersionTag>> {
        if command.conditions.validate_absent().is_succeeded() {
            // Creation is allowed; insert-if-absent decides create vs update
            let (mut list, was_created) = self
                .repository
                .load_or_create(
                    &command.resource_owner,
                    &command.identifier,
                    &command.name,
                    &command.description,
                    context,
                )
                .await?;

            if was_created {
                // Conditions were already proven valid against the absent
                // entity before creation; no further checks needed.
                return Ok(Self::found(&list));
            }
            self.update_existing(&mut list, command, context).await
        } else {
            // Creation is disallowed; this must be an update of an existing
            // list, so absence is a failed precondition.
            match self
                .repository
                .load_by_key(&command.resource_owner, &command.identifier)
                .await?
            {
                None => Ok(ConditionalResult::condition_failed()),
                Some(mut list) => self.update_existing(&mut list, command, context).await,
            }
        }
    }

    async fn update_existing(
        &self,
        list: &mut AccessList,
        command: &UpsertListCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<AccessListInfo>, VersionTag>> {
        // The identifier of a deleted list stays tombstoned; it cannot be
        // recreated through upsert.
        if list.is_deleted() {
            return Ok(ConditionalResult::condition_failed());
        }

        match command.conditions.validate(&*list) {
            ConditionOutcome::Failed => return Ok(ConditionalResult::condition_failed()),
            ConditionOutcome::Unmodified => {
                debug_assert!(false, "unmodified outcome on a mutating request");
                return Ok(ConditionalResult::condition_failed());
            }
            ConditionOutcome::Succeeded => {}
        }

        // Field-level diff: append an update event only if something
        // actually changed, to keep no-op writes out of the history.
        let name = (list.name() != command.name).then(|| command.name.clone());
        let description =
            (list.description() != command.description).then(|| command.description.clone());
        if name.is_none() && description.is_none() {
            return Ok(Self::found(list));
        }

        list.update(None, name, description)?;
        self.repository.apply_changes(list, context).await?;
        Ok(Self::found(list))
    }

    fn found(list: &AccessList) -> ConditionalResult<Versioned<AccessListInfo>, VersionTag> {
        let modified_at = list.updated_at().unwrap_or_else(Utc::now);
        ConditionalResult::found(Versioned::new(
            list.as_info(),
            list.version_tag(),
            modified_at,
        ))
    }
}
