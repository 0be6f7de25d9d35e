//! Event Store module
//!
//! Persistence layer for the access list event log, backed by PostgreSQL.

mod error;
mod repository;

pub use error::EventStoreError;
pub use repository::ListRepository;
