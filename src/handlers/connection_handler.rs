//! Connection Handler
//!
//! Mutations on a list's resource connections. Every operation runs the
//! shared load → validate → mutate → persist cycle and returns the affected
//! connection.

use sqlx::PgPool;

use crate::aggregate::{ResourceConnection, VersionTag};
use crate::conditional::{ConditionalResult, Versioned};
use crate::domain::OperationContext;
use crate::error::AppResult;
use crate::event_store::ListRepository;

use super::{mutate_list, AddConnectionCommand, ConnectionActionsCommand, RemoveConnectionCommand};

/// Handler for resource connection mutations
pub struct ConnectionHandler {
    repository: ListRepository,
}

impl ConnectionHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ListRepository::new(pool),
        }
    }

    /// Add a connection for a resource with its initial action set
    pub async fn add_connection(
        &self,
        command: AddConnectionCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<ResourceConnection>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| {
                list.add_resource_connection(
                    command.resource_identifier.clone(),
                    command.actions.clone(),
                )
            },
        )
        .await
    }

    /// Add actions to an existing connection
    pub async fn add_actions(
        &self,
        command: ConnectionActionsCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<ResourceConnection>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| {
                list.add_resource_connection_actions(
                    command.resource_identifier.clone(),
                    command.actions.clone(),
                )
            },
        )
        .await
    }

    /// Remove actions from an existing connection
    pub async fn remove_actions(
        &self,
        command: ConnectionActionsCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<ResourceConnection>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| {
                list.remove_resource_connection_actions(
                    command.resource_identifier.clone(),
                    command.actions.clone(),
                )
            },
        )
        .await
    }

    /// Remove a connection; returns its last state before removal
    pub async fn remove_connection(
        &self,
        command: RemoveConnectionCommand,
        context: &OperationContext,
    ) -> AppResult<ConditionalResult<Versioned<ResourceConnection>, VersionTag>> {
        mutate_list(
            &self.repository,
            &command.resource_owner,
            &command.identifier,
            &command.conditions,
            context,
            |list| list.remove_resource_connection(command.resource_identifier.clone()),
        )
        .await
    }
}
