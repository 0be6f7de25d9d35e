//! List Repository
//!
//! Persistence for the access list aggregate. Aggregates are reconstructed
//! by replaying committed events in ascending sequence order; uncommitted
//! events are appended with optimistic concurrency control.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::aggregate::{AccessList, PersistedEvent};
use crate::domain::{ListEvent, ListEventKind, OperationContext};

use super::EventStoreError;

/// Repository for loading and persisting access list aggregates
#[derive(Debug, Clone)]
pub struct ListRepository {
    pool: PgPool,
}

impl ListRepository {
    /// Create a new repository with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load an aggregate by replaying its committed events
    pub async fn load(&self, aggregate_id: Uuid) -> Result<Option<AccessList>, EventStoreError> {
        let events = self.fetch_events(aggregate_id).await?;
        if events.is_empty() {
            return Ok(None);
        }

        let list = AccessList::load_from(aggregate_id, events)?;
        Ok(Some(list))
    }

    /// Load an aggregate by its owner + identifier key
    pub async fn load_by_key(
        &self,
        resource_owner: &str,
        identifier: &str,
    ) -> Result<Option<AccessList>, EventStoreError> {
        let aggregate_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT aggregate_id FROM access_lists
            WHERE resource_owner = $1 AND identifier = $2
            "#,
        )
        .bind(resource_owner)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        match aggregate_id {
            Some(aggregate_id) => self.load(aggregate_id).await,
            None => Ok(None),
        }
    }

    /// Persist the aggregate's uncommitted events, assigning sequence ids,
    /// then advance its committed boundary
    ///
    /// Fails with a concurrency conflict if another writer appended since
    /// this aggregate was loaded; the caller retries the whole
    /// load-validate-mutate-save cycle.
    pub async fn apply_changes(
        &self,
        list: &mut AccessList,
        context: &OperationContext,
    ) -> Result<(), EventStoreError> {
        if !list.has_uncommitted_events() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        // Verify expected version (optimistic locking)
        let expected = list.committed_version();
        let actual = self.current_version(&mut tx, list.id()).await?;
        if actual != expected {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: list.id(),
                expected,
                actual,
            });
        }

        self.persist_uncommitted(&mut tx, list, context).await?;
        tx.commit().await?;

        // Events are durable now; move the committed boundary
        list.commit()?;
        Ok(())
    }

    /// Atomic "insert if absent, else return existing", keyed on
    /// owner + identifier
    ///
    /// Two concurrent creators cannot both observe `was_created == true`:
    /// the unique key on the registry row serializes them, and the loser
    /// loads the winner's freshly committed aggregate.
    pub async fn load_or_create(
        &self,
        resource_owner: &str,
        identifier: &str,
        name: &str,
        description: &str,
        context: &OperationContext,
    ) -> Result<(AccessList, bool), EventStoreError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO access_lists (aggregate_id, resource_owner, identifier)
            VALUES ($1, $2, $3)
            ON CONFLICT (resource_owner, identifier) DO NOTHING
            RETURNING aggregate_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resource_owner)
        .bind(identifier)
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(aggregate_id) => {
                let mut list = AccessList::new(aggregate_id);
                list.initialize(
                    resource_owner.to_string(),
                    identifier.to_string(),
                    name.to_string(),
                    description.to_string(),
                )?;

                self.persist_uncommitted(&mut tx, &mut list, context).await?;
                tx.commit().await?;
                list.commit()?;

                tracing::info!(
                    resource_owner,
                    identifier,
                    aggregate_id = %aggregate_id,
                    "Created access list"
                );
                Ok((list, true))
            }
            None => {
                tx.commit().await?;
                let list = self.load_by_key(resource_owner, identifier).await?.ok_or_else(|| {
                    EventStoreError::InvalidEventRecord(format!(
                        "registry row for {resource_owner}/{identifier} has no events"
                    ))
                })?;
                Ok((list, false))
            }
        }
    }

    /// Get current version of an aggregate
    async fn current_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        aggregate_id: Uuid,
    ) -> Result<i64, EventStoreError> {
        let result: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(sequence_id) FROM list_events WHERE aggregate_id = $1
            "#,
        )
        .bind(aggregate_id)
        .fetch_optional(&mut **tx)
        .await?
        .flatten();

        Ok(result.unwrap_or(0))
    }

    /// Insert the aggregate's uncommitted events, stamping each with its
    /// assigned sequence id
    async fn persist_uncommitted(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        list: &mut AccessList,
        context: &OperationContext,
    ) -> Result<(), EventStoreError> {
        let context_json = serde_json::to_value(context)?;
        let aggregate_id = list.id();
        let expected = list.committed_version();
        let mut sequence_id = expected;
        let mut renamed: Option<String> = None;

        for event in list.uncommitted_events_mut() {
            sequence_id += 1;
            let payload = serde_json::to_value(event.kind())?;
            if let ListEventKind::Updated {
                identifier: Some(identifier),
                ..
            } = event.kind()
            {
                renamed = Some(identifier.clone());
            }

            sqlx::query(
                r#"
                INSERT INTO list_events (
                    aggregate_id, sequence_id, event_type, event_time, payload, context
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(aggregate_id)
            .bind(sequence_id)
            .bind(event.event_type())
            .bind(event.event_time())
            .bind(&payload)
            .bind(&context_json)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                // A primary-key collision on (aggregate_id, sequence_id)
                // means a racing writer appended between our version check
                // and this insert.
                map_unique_violation(
                    e,
                    EventStoreError::ConcurrencyConflict {
                        aggregate_id,
                        expected,
                        actual: sequence_id,
                    },
                )
            })?;

            event.assign_sequence_id(sequence_id);
        }

        // Keep the lookup key in sync when the list was renamed
        if let Some(identifier) = renamed {
            let resource_owner = list.resource_owner().to_string();
            sqlx::query(
                r#"
                UPDATE access_lists SET identifier = $2 WHERE aggregate_id = $1
                "#,
            )
            .bind(aggregate_id)
            .bind(&identifier)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    EventStoreError::IdentifierInUse {
                        resource_owner,
                        identifier,
                    },
                )
            })?;
        }

        Ok(())
    }

    /// Fetch all persisted events for an aggregate, ascending
    async fn fetch_events(&self, aggregate_id: Uuid) -> Result<Vec<ListEvent>, EventStoreError> {
        let rows: Vec<(i64, DateTime<Utc>, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT sequence_id, event_time, payload
            FROM list_events
            WHERE aggregate_id = $1
            ORDER BY sequence_id ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for (sequence_id, event_time, payload) in rows {
            let kind = serde_json::from_value(payload)?;
            events.push(ListEvent::from_persisted(
                sequence_id,
                aggregate_id,
                event_time,
                kind,
            ));
        }

        Ok(events)
    }
}

/// Map a Postgres unique violation onto a domain-specific conflict
fn map_unique_violation(error: sqlx::Error, conflict: EventStoreError) -> EventStoreError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => conflict,
        _ => EventStoreError::Database(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_unique_violation_passes_through_other_errors() {
        let mapped = map_unique_violation(
            sqlx::Error::RowNotFound,
            EventStoreError::ConcurrencyConflict {
                aggregate_id: Uuid::new_v4(),
                expected: 0,
                actual: 1,
            },
        );
        assert!(matches!(mapped, EventStoreError::Database(_)));
    }
}
