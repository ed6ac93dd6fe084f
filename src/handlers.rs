use crate::config::Config;
use crate::endpoints;
use crate::errors::AppError;
use crate::executor::execute_operation;
use crate::explorium_client::ReqwestTransport;
use crate::models::{EntityType, ExecuteRequest, OperationKind};
use crate::services::ExploriumService;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Operation runner over the authenticated transport.
    pub service: ExploriumService,
    /// Transport kept for the credential check.
    pub transport: Arc<ReqwestTransport>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let service = ExploriumService::new(transport.clone(), config.enrichment_failure_policy);
        Ok(Self {
            config,
            service,
            transport,
        })
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-explorium-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/operations
///
/// Lists the operations with their documentation links and accepted option values.
pub async fn list_operations() -> Json<Value> {
    let operations: Vec<Value> = OperationKind::ALL
        .iter()
        .map(|op| {
            json!({
                "operation": op.as_str(),
                "description": op.description(),
                "docs": {
                    "businesses": endpoints::docs_url(*op, EntityType::Businesses),
                    "prospects": endpoints::docs_url(*op, EntityType::Prospects),
                },
            })
        })
        .collect();

    Json(json!({
        "operations": operations,
        "enrichments": {
            "businesses": endpoints::enrichment_keys(EntityType::Businesses),
            "prospects": endpoints::enrichment_keys(EntityType::Prospects),
        },
        "event_types": {
            "businesses": endpoints::event_types(EntityType::Businesses),
            "prospects": endpoints::event_types(EntityType::Prospects),
        },
        "autocomplete_fields": endpoints::AUTOCOMPLETE_FIELDS,
    }))
}

/// POST /api/v1/execute/:operation
///
/// Runs one operation over the posted input items.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `operation` - `match`, `enrich`, `fetch`, `events` or `autocomplete`.
/// * `request` - Input items and the optional continue-on-failure override.
///
/// # Returns
///
/// * `Result<Json<Vec<Value>>, AppError>` - The ordered output records.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Path(operation): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Vec<Value>>, AppError> {
    let request_id = Uuid::new_v4();
    let continue_on_fail = request
        .continue_on_fail
        .unwrap_or(state.config.continue_on_fail);
    let span = tracing::info_span!("execute", %request_id, %operation);

    async move {
        tracing::info!(
            "POST /execute/{} - {} item(s), continue_on_fail={}",
            operation,
            request.items.len(),
            continue_on_fail
        );
        let records =
            execute_operation(&state.service, &operation, &request.items, continue_on_fail)
                .await?;
        tracing::info!("Returning {} record(s)", records.len());
        Ok(Json(records))
    }
    .instrument(span)
    .await
}

/// POST /api/v1/credentials/test
///
/// Verifies the configured API key against the credit service.
pub async fn test_credentials(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let credits = state.transport.verify_credentials().await?;
    Ok(Json(json!({ "status": "ok", "credits": credits })))
}
