//! Delete List Handler
//!
//! Validates preconditions against the current snapshot, marks the
//! tombstone and returns the post-delete snapshot.

use sqlx::PgPool;

use crate::aggregate::{AccessListInfo, VersionTag};
use crate::conditional::{ConditionalResult, Versioned};
use crate::domain::OperationContext;
use crate::error::AppResult;
use crate::event_store::ListRepository;

use super::{mutate_list, DeleteListCommand};

/// Handler for list deletion
pub struct DeleteListHandler {
    repository: ListRepository,
}

impl DeleteListHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ListRepository::new(pool),
        }
    }

    /// Execute the delete command
    pub async fn execute(
        &self,
        command: DeleteListCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<AccessListInfo>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| {
                list.delete()?;
                Ok(list.as_info())
            },
        )
        .await
    }
}
