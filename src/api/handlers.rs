//! API Handlers
//!
//! The interception fallback plus the `/__shell/*` control endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
    Json,
};
use tokio::sync::oneshot;
use tracing::debug;

use crate::cache::{
    origin_of, resolve_url, CapturedResponse, Destination, FetchRequest, PartitionStore,
    RequestDescriptor, RequestMode,
};
use crate::error::{Result, ShellError};
use crate::models::{HealthResponse, MessageResponse, PartitionSummary, StatsResponse};
use crate::network::Network;
use crate::worker::{ControlMessage, Registration};

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active/waiting worker generations
    pub registration: Arc<Registration>,
    /// Used for requests no worker intercepts
    pub network: Arc<dyn Network>,
    /// Origin that path-only request URIs are resolved against
    pub origin: String,
}

impl AppState {
    pub fn new(
        registration: Arc<Registration>,
        network: Arc<dyn Network>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            registration,
            network,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

// == Interception ==

/// Fallback handler: every request outside `/__shell/*`.
///
/// Intercepted requests always produce a response; only passthrough requests
/// can fail, with 502 when the upstream is unreachable.
pub async fn intercept_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let request = fetch_request_from_http(&state.origin, request).await?;

    let captured = match state.registration.handle_fetch(&request).await {
        Some(response) => response,
        None => {
            debug!(
                "Passing through {} {}",
                request.descriptor.method(),
                request.descriptor.url()
            );
            state.network.fetch(&request).await?
        }
    };

    into_http_response(captured)
}

/// Builds the descriptor, headers and body of an incoming request.
pub async fn fetch_request_from_http(origin: &str, request: Request) -> Result<FetchRequest> {
    let (parts, body) = request.into_parts();

    // Absolute-form URIs are proxy requests for another origin
    let uri = parts.uri.to_string();
    let url = if origin_of(&uri).is_some() {
        uri
    } else {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        resolve_url(origin, path)
    };

    let mode = request_mode(&parts.method, &parts.headers);
    let destination = match header_str(&parts.headers, "sec-fetch-dest") {
        Some(value) => Destination::from_header(value),
        None if mode == RequestMode::Navigate => Destination::Document,
        None => Destination::Empty,
    };

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ShellError::InvalidRequest(format!("Unreadable request body: {}", e)))?;

    Ok(
        FetchRequest::new(RequestDescriptor::new(parts.method, url, mode, destination))
            .with_headers(parts.headers)
            .with_body(body),
    )
}

/// `Sec-Fetch-Mode` when present; otherwise an HTML-accepting GET counts as
/// a navigation.
fn request_mode(method: &Method, headers: &HeaderMap) -> RequestMode {
    if let Some(value) = header_str(headers, "sec-fetch-mode") {
        return RequestMode::from_header(value);
    }

    let wants_html = header_str(headers, header::ACCEPT.as_str())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false);
    if *method == Method::GET && wants_html {
        RequestMode::Navigate
    } else {
        RequestMode::NoCors
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Renders a captured response back to the client.
pub fn into_http_response(captured: CapturedResponse) -> Result<Response> {
    let status = StatusCode::from_u16(captured.status)
        .map_err(|e| ShellError::Internal(format!("Invalid status {}: {}", captured.status, e)))?;

    let mut builder = Response::builder().status(status);
    for (name, value) in &captured.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(Body::from(captured.body))
        .map_err(|e| ShellError::Internal(format!("Invalid response: {}", e)))
}

// == Control Endpoints ==

/// Handler for POST /__shell/message
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> Result<Json<MessageResponse>> {
    let response = MessageResponse::accepted(message.kind());

    if message != ControlMessage::GetVersion {
        state.registration.handle_message(message, None).await?;
        return Ok(Json(response));
    }

    let (tx, rx) = oneshot::channel();
    state.registration.handle_message(message, Some(tx)).await?;
    let reply = rx
        .await
        .map_err(|_| ShellError::Internal("Version reply was dropped".to_string()))?;

    Ok(Json(response.with_version(reply.version)))
}

/// Handler for GET /__shell/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.registration.store();
    let stats = store.stats().await;

    let mut partitions = Vec::new();
    for name in store.partition_names().await {
        // A concurrent delete may remove the partition between the two calls
        if let Some(entries) = store.len(&name).await {
            partitions.push(PartitionSummary { name, entries });
        }
    }

    Json(StatsResponse::new(&stats, partitions))
}

/// Handler for GET /__shell/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registration.version().await))
}
