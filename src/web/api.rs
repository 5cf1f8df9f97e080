//! REST API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::AdapterError;
use crate::records::InvoiceLineItem;
use crate::services::{InvoiceAdapter, TimeTrackerAdapter};

const SERVICE_NAME: &str = "freelance-bridge";

/// Shared application state for API handlers
pub struct ApiState {
    pub tracker: TimeTrackerAdapter,
    pub invoices: InvoiceAdapter,
    /// Entry count used when /api/time/entries gets no usable limit
    pub default_entry_limit: usize,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn ok(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({"success": true, "data": data}))
}

fn json_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({"success": false, "error": message})))
}

/// Map an adapter error onto an HTTP status, keeping the error text in the
/// envelope for the caller.
fn adapter_error(err: &AdapterError) -> ApiError {
    let status = match err {
        AdapterError::Validation(_) => StatusCode::BAD_REQUEST,
        AdapterError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(%err, "adapter call failed");
    json_error(status, &err.to_string())
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": SERVICE_NAME}))
}

/// API-shaped health check
pub async fn api_health() -> Json<Value> {
    ok(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Start timer request body
#[derive(Debug, Deserialize)]
pub struct StartTimerRequest {
    pub client: String,
    pub project: String,
    #[serde(default)]
    pub description: String,
}

/// Start a timer
pub async fn start_timer(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<StartTimerRequest>,
) -> ApiResult {
    tracing::info!(client = %req.client, project = %req.project, "API: start timer");
    state
        .tracker
        .start_timer(&req.client, &req.project, &req.description)
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Stop the running timer
pub async fn stop_timer(State(state): State<Arc<ApiState>>) -> ApiResult {
    tracing::info!("API: stop timer");
    state
        .tracker
        .stop_timer()
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Current timer state; `data` is null when nothing is running
pub async fn timer_status(State(state): State<Arc<ApiState>>) -> ApiResult {
    state
        .tracker
        .status()
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Entries query string
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    /// Raw string so an unparseable value falls back to the default
    /// instead of rejecting the request
    pub limit: Option<String>,
}

/// Recent entries.
///
/// `limit=0` disables truncation; a missing or unparseable limit uses the
/// configured default.
pub async fn time_entries(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EntriesQuery>,
) -> ApiResult {
    let limit = match query.limit.as_deref().map(str::parse::<usize>) {
        Some(Ok(n)) => NonZeroUsize::new(n),
        Some(Err(_)) | None => NonZeroUsize::new(state.default_entry_limit),
    };

    state
        .tracker
        .recent_entries(limit)
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Today's summary
pub async fn today_summary(State(state): State<Arc<ApiState>>) -> ApiResult {
    state
        .tracker
        .today_summary()
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Invoice generation request body
#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub client_name: String,
    pub client_email: String,
    pub line_items: Vec<InvoiceLineItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub date: String,
}

/// Generate an invoice PDF
pub async fn generate_invoice(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<GenerateInvoiceRequest>,
) -> ApiResult {
    tracing::info!(client = %req.client_name, items = req.line_items.len(), "API: generate invoice");
    state
        .invoices
        .generate_invoice(
            &req.client_name,
            &req.client_email,
            &req.line_items,
            Some(&req.notes).filter(|n| !n.is_empty()).map(String::as_str),
            Some(&req.date).filter(|d| !d.is_empty()).map(String::as_str),
        )
        .await
        .map(ok)
        .map_err(|err| adapter_error(&err))
}

/// Invoice preview placeholder
pub async fn preview_invoice() -> ApiError {
    json_error(
        StatusCode::NOT_IMPLEMENTED,
        "Invoice preview not yet implemented",
    )
}
