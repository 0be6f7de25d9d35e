//! Membership Handler
//!
//! Reads and mutations of a list's member parties.

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::VersionTag;
use crate::conditional::{ConditionOutcome, ConditionalResult, Versioned};
use crate::domain::OperationContext;
use crate::error::AppResult;
use crate::event_store::ListRepository;

use super::{mutate_list, GetListQuery, MembersCommand};

/// Handler for list membership
pub struct MembershipHandler {
    repository: ListRepository,
}

impl MembershipHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ListRepository::new(pool),
        }
    }

    /// Read the current membership set
    pub async fn get_members(
        &self,
        query: GetListQuery,
    ) -> AppResult<ConditionalResult<Versioned<BTreeSet<Uuid>>, VersionTag>> {
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
                list.members().clone(),
                list.version_tag(),
                modified_at,
            ))),
        }
    }

    /// Add member parties; returns the post-mutation membership set
    pub async fn add_members(
        &self,
        command: MembersCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<BTreeSet<Uuid>>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| list.add_members(command.party_ids.clone()),
        )
        .await
    }

    /// Remove member parties; returns the post-mutation membership set
    pub async fn remove_members(
        &self,
        command: MembersCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<BTreeSet<Uuid>>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| list.remove_members(command.party_ids.clone()),
        )
        .await
    }
}
