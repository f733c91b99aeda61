use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use ledger_core::{EntityKind, LedgerError, LedgerService, QueryRequest, ToolRegistry, ToolSpec};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = std::result::Result<Json<Value>, AppError>;

fn to_json(value: impl serde::Serialize) -> ApiResult {
    serde_json::to_value(value).map(Json).map_err(|e| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("failed to serialize response: {e}"),
    })
}

fn parse_table(table: &str) -> std::result::Result<EntityKind, AppError> {
    table
        .parse::<EntityKind>()
        .map_err(|e| AppError::not_found(e.to_string()))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    service: LedgerService,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(service: LedgerService) -> Self {
        let tools = Arc::new(ToolRegistry::with_ledger_tools(&service));
        Self { service, tools }
    }
}

pub fn build_router(service: LedgerService) -> Router {
    Router::new()
        .route("/api/v1/query", post(run_query))
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/tools/{name}", post(call_tool))
        .route("/api/v1/{table}", get(list_items).post(add_item))
        .route(
            "/api/v1/{table}/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(service))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: LedgerService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("ledger serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("ledger serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn run_query(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let request: QueryRequest = serde_json::from_value(body)
        .map_err(|e| AppError::bad_request(format!("invalid query request: {e}")))?;
    Ok(Json(state.service.dispatch(request).await?))
}

async fn list_items(State(state): State<AppState>, Path(table): Path<String>) -> ApiResult {
    let kind = parse_table(&table)?;
    to_json(state.service.handle_get_all(kind).await?)
}

async fn add_item(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<Value>,
) -> std::result::Result<(StatusCode, Json<Value>), AppError> {
    let kind = parse_table(&table)?;
    let record = state.service.handle_add(kind, Some(payload)).await?;
    Ok((StatusCode::CREATED, to_json(record)?))
}

async fn get_item(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
) -> ApiResult {
    let kind = parse_table(&table)?;
    to_json(state.service.handle_get_one(kind, id).await?)
}

async fn update_item(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
    Json(patch): Json<Value>,
) -> ApiResult {
    let kind = parse_table(&table)?;
    to_json(state.service.handle_update(kind, id, patch).await?)
}

async fn delete_item(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
) -> ApiResult {
    let kind = parse_table(&table)?;
    to_json(state.service.handle_delete(kind, id).await?)
}

async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSpec>> {
    Json(state.tools.specs())
}

async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> ApiResult {
    Ok(Json(state.tools.call(&name, args).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
