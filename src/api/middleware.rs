//! API Middleware
//!
//! Builds the per-request operation context and logs the request/response
//! pair.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::domain::OperationContext;

/// Attach an `OperationContext` extension and log the round trip
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uuid>().ok())
        .unwrap_or_else(Uuid::new_v4);

    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse().ok());

    let mut context = OperationContext::new().with_correlation_id(correlation_id);
    if let Some(client_ip) = client_ip {
        context = context.with_client_ip(client_ip);
    }
    request.extensions_mut().insert(context);

    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = start.elapsed().as_millis() as u64,
        correlation_id = %correlation_id,
        "Request handled"
    );

    response
}
