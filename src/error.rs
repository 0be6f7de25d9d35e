//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::event_store::EventStoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid precondition: {0}")]
    InvalidCondition(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Persistence errors
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Map a domain-invariant violation onto an HTTP status and error code
fn domain_error_parts(error: &DomainError) -> (StatusCode, &'static str) {
    match error {
        DomainError::AlreadyInitialized => (StatusCode::CONFLICT, "already_exists"),
        DomainError::ListDeleted => (StatusCode::CONFLICT, "list_deleted"),
        DomainError::EmptyUpdate => (StatusCode::BAD_REQUEST, "empty_update"),
        DomainError::EmptyChangeSet => (StatusCode::BAD_REQUEST, "empty_change_set"),
        DomainError::ConnectionExists { .. } => (StatusCode::CONFLICT, "connection_exists"),
        DomainError::ConnectionNotFound { .. } => (StatusCode::NOT_FOUND, "connection_not_found"),
        DomainError::DuplicateAction { .. } => (StatusCode::CONFLICT, "duplicate_action"),
        DomainError::MissingAction { .. } => (StatusCode::NOT_FOUND, "missing_action"),
        DomainError::DuplicateMember { .. } => (StatusCode::CONFLICT, "duplicate_member"),
        DomainError::MissingMember { .. } => (StatusCode::NOT_FOUND, "missing_member"),
        // The service checks state before mutating; reaching these means a
        // bug in the calling code, not bad request input.
        DomainError::NotInitialized | DomainError::EventNotPersisted => {
            (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::InvalidCondition(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_precondition",
                Some(msg.clone()),
            ),

            // Domain-invariant violations
            AppError::Domain(domain_err) => {
                let (status, code) = domain_error_parts(domain_err);
                if status.is_server_error() {
                    tracing::error!("Domain invariant violation: {}", domain_err);
                }
                (status, code, Some(domain_err.to_string()))
            }

            // Persistence outcomes
            AppError::EventStore(store_err) => match store_err {
                EventStoreError::ConcurrencyConflict { .. } => (
                    StatusCode::CONFLICT,
                    "concurrency_conflict",
                    Some(store_err.to_string()),
                ),
                EventStoreError::IdentifierInUse { .. } => (
                    StatusCode::CONFLICT,
                    "identifier_in_use",
                    Some(store_err.to_string()),
                ),
                EventStoreError::Invariant(domain_err) => {
                    let (status, code) = domain_error_parts(domain_err);
                    (status, code, Some(domain_err.to_string()))
                }
                EventStoreError::InvalidEventRecord(_)
                | EventStoreError::Database(_)
                | EventStoreError::Serialization(_) => {
                    tracing::error!("Event store error: {:?}", store_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "event_store_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_mapping() {
        let (status, code) = domain_error_parts(&DomainError::DuplicateMember {
            party_id: uuid::Uuid::new_v4(),
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "duplicate_member");

        let (status, _) = domain_error_parts(&DomainError::EventNotPersisted);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
