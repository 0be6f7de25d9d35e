//! API Routes
//!
//! HTTP endpoint definitions. The handlers here only assemble commands,
//! invoke the service layer and map conditional results onto statuses and
//! version headers; all behaviour lives below this layer.

use std::collections::BTreeSet;

use axum::extract::{Extension, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::VersionTag;
use crate::conditional::{ConditionalResult, Versioned};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{
    AddConnectionCommand, ConnectionActionsCommand, ConnectionHandler, DeleteListCommand,
    DeleteListHandler, GetListHandler, GetListQuery, MembersCommand, MembershipHandler,
    RemoveConnectionCommand, UpsertListCommand, UpsertListHandler,
};

use super::conditions::{conditions_from_headers, format_entity_tag, format_http_date};

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct UpsertListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    #[serde(default)]
    pub actions: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionsRequest {
    pub actions: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
pub struct MembersRequest {
    pub party_ids: BTreeSet<Uuid>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<PgPool> {
    Router::new()
        .route(
            "/access-lists/:owner/:identifier",
            get(get_list).put(upsert_list).delete(delete_list),
        )
        .route("/access-lists/:owner/:identifier/events", get(get_list_events))
        .route(
            "/access-lists/:owner/:identifier/members",
            get(get_members).post(add_members).delete(remove_members),
        )
        .route(
            "/access-lists/:owner/:identifier/resource-connections/:resource",
            put(add_connection).delete(remove_connection),
        )
        .route(
            "/access-lists/:owner/:identifier/resource-connections/:resource/actions",
            post(add_actions).delete(remove_actions),
        )
}

// =========================================================================
// Response mapping
// =========================================================================

fn version_headers(version: VersionTag, modified_at: DateTime<Utc>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = format_entity_tag(version).parse() {
        headers.insert(header::ETAG, value);
    }
    if let Ok(value) = format_http_date(modified_at).parse() {
        headers.insert(header::LAST_MODIFIED, value);
    }
    headers
}

/// Map a conditional result onto status, version headers and body
fn conditional_response<T: Serialize>(
    result: ConditionalResult<Versioned<T>, VersionTag>,
) -> Response {
    match result {
        ConditionalResult::Found(versioned) => (
            StatusCode::OK,
            version_headers(versioned.version, versioned.modified_at),
            Json(versioned.value),
        )
            .into_response(),
        ConditionalResult::NotFound => StatusCode::NOT_FOUND.into_response(),
        ConditionalResult::Unmodified {
            version,
            modified_at,
        } => (
            StatusCode::NOT_MODIFIED,
            version_headers(version, modified_at),
        )
            .into_response(),
        ConditionalResult::ConditionFailed => StatusCode::PRECONDITION_FAILED.into_response(),
    }
}

// =========================================================================
// List endpoints
// =========================================================================

/// Get list metadata
async fn get_list(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, true)?;
    let result = GetListHandler::new(pool)
        .execute(GetListQuery::new(owner, identifier).with_conditions(conditions))
        .await?;

    Ok(conditional_response(result))
}

/// Create a list or update its metadata
async fn upsert_list(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<UpsertListRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command = UpsertListCommand::new(owner, identifier, request.name, request.description)
        .with_conditions(conditions);
    let result = UpsertListHandler::new(pool).execute(command, &context).await?;

    Ok(conditional_response(result))
}

/// Delete a list
async fn delete_list(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command = DeleteListCommand::new(owner, identifier).with_conditions(conditions);
    let result = DeleteListHandler::new(pool).execute(command, &context).await?;

    Ok(conditional_response(result))
}

/// Get the list's change history
async fn get_list_events(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, true)?;
    let result = GetListHandler::new(pool)
        .history(GetListQuery::new(owner, identifier).with_conditions(conditions))
        .await?;

    Ok(conditional_response(result))
}

// =========================================================================
// Membership endpoints
// =========================================================================

/// Get the list's members
async fn get_members(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, true)?;
    let result = MembershipHandler::new(pool)
        .get_members(GetListQuery::new(owner, identifier).with_conditions(conditions))
        .await?;

    Ok(conditional_response(result))
}

/// Add members
async fn add_members(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<MembersRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command =
        MembersCommand::new(owner, identifier, request.party_ids).with_conditions(conditions);
    let result = MembershipHandler::new(pool).add_members(command, &context).await?;

    Ok(conditional_response(result))
}

/// Remove members
async fn remove_members(
    State(pool): State<PgPool>,
    Path((owner, identifier)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<MembersRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command =
        MembersCommand::new(owner, identifier, request.party_ids).with_conditions(conditions);
    let result = MembershipHandler::new(pool)
        .remove_members(command, &context)
        .await?;

    Ok(conditional_response(result))
}

// =========================================================================
// Resource connection endpoints
// =========================================================================

/// Add a resource connection
async fn add_connection(
    State(pool): State<PgPool>,
    Path((owner, identifier, resource)): Path<(String, String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<ConnectionRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command = AddConnectionCommand::new(owner, identifier, resource, request.actions)
        .with_conditions(conditions);
    let result = ConnectionHandler::new(pool)
        .add_connection(command, &context)
        .await?;

    Ok(conditional_response(result))
}

/// Remove a resource connection
async fn remove_connection(
    State(pool): State<PgPool>,
    Path((owner, identifier, resource)): Path<(String, String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command =
        RemoveConnectionCommand::new(owner, identifier, resource).with_conditions(conditions);
    let result = ConnectionHandler::new(pool)
        .remove_connection(command, &context)
        .await?;

    Ok(conditional_response(result))
}

/// Add actions to a resource connection
async fn add_actions(
    State(pool): State<PgPool>,
    Path((owner, identifier, resource)): Path<(String, String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<ActionsRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command = ConnectionActionsCommand::new(owner, identifier, resource, request.actions)
        .with_conditions(conditions);
    let result = ConnectionHandler::new(pool).add_actions(command, &context).await?;

    Ok(conditional_response(result))
}

/// Remove actions from a resource connection
async fn remove_actions(
    State(pool): State<PgPool>,
    Path((owner, identifier, resource)): Path<(String, String, String)>,
    headers: HeaderMap,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<ActionsRequest>,
) -> Result<Response, AppError> {
    let conditions = conditions_from_headers(&headers, false)?;
    let command = ConnectionActionsCommand::new(owner, identifier, resource, request.actions)
        .with_conditions(conditions);
    let result = ConnectionHandler::new(pool)
        .remove_actions(command, &context)
        .await?;

    Ok(conditional_response(result))
}
