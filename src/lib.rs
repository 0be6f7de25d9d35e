//! accessRegistry Library
//!
//! Tenant-owned access lists with event-sourced state and conditional
//! requests. Re-exports modules for integration testing and the server
//! binary.

pub mod aggregate;
pub mod api;
pub mod conditional;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod event_store;
pub mod handlers;

pub use config::Config;
pub use error::{AppError, AppResult};

pub use aggregate::{AccessList, AccessListInfo, ResourceConnection, VersionTag};
pub use conditional::{
    ConditionCollection, ConditionOutcome, ConditionalResult, VersionCondition, Versioned,
    VersionedEntity,
};
pub use domain::{DomainError, ListEvent, ListEventKind, OperationContext};

use axum::{middleware, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn build_router(pool: PgPool) -> Router {
    let api_router = api::create_router().layer(middleware::from_fn(
        api::middleware::context_middleware,
    ));

    Router::new()
        // Health check (no context middleware)
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
