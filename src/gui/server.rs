//! Web server for the lifecycle dashboard

use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{Mutex, broadcast};
use tower_http::trace::TraceLayer;

use super::error::{ApiError, ApiResult};
use super::watcher::LocalWrites;
use crate::commands::{self, ExemplarList};
use crate::models::graph::LifecycleGraph;
use crate::models::{NewTool, ToolUpdate};
use crate::storage::Storage;
use crate::{Error, Result};

/// Shared state for the server
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Mutex<Storage>>,
    pub update_tx: broadcast::Sender<String>,
    pub title: String,
    pub database: PathBuf,
    pub local_writes: LocalWrites,
}

impl AppState {
    pub fn new(storage: Storage, title: impl Into<String>) -> Self {
        let (update_tx, _) = broadcast::channel(100);
        let database = storage.path().to_path_buf();
        Self {
            storage: Arc::new(Mutex::new(storage)),
            update_tx,
            title: title.into(),
            database,
            local_writes: LocalWrites::new(),
        }
    }

    /// Tell connected pages that the tool tables are stale.
    fn notify_tools_changed(&self, action: &str, id: i64) {
        self.local_writes.mark();
        let msg = json!({ "type": "tools_changed", "action": action, "id": id });
        // No receivers just means no page is open
        let _ = self.update_tx.send(msg.to_string());
    }
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/config", get(get_config))
        .route("/api/stages", get(get_stages))
        .route("/api/graph", get(get_graph))
        .route("/api/stages/:stage/substages", get(get_stage_substages))
        .route("/api/stages/:stage/tools", get(get_stage_tools))
        .route("/api/substages/:id/exemplars", get(get_exemplars))
        .route("/api/tools", get(list_tools).post(create_tool))
        .route(
            "/api/tools/:id",
            get(get_tool).put(update_tool).delete(delete_tool),
        )
        .route("/ws", get(super::websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the dashboard server and block until Ctrl+C.
pub async fn start_server(database: &Path, host: &str, port: u16, title: &str) -> Result<()> {
    let host_addr: std::net::IpAddr = host
        .parse()
        .map_err(|e| Error::Config(format!("invalid host address '{}': {}", host, e)))?;
    let addr = SocketAddr::from((host_addr, port));

    let storage = Storage::open(database)?;
    let state = AppState::new(storage, title);

    let watcher_tx = state.update_tx.clone();
    let watcher_path = database.to_path_buf();
    let local_writes = state.local_writes.clone();
    tokio::spawn(async move {
        if let Err(e) =
            super::watcher::watch_database(watcher_path, watcher_tx, local_writes).await
        {
            tracing::warn!(error = %e, "database watcher stopped");
        }
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, database = %database.display(), "dashboard listening");
    eprintln!("Serving {} at http://{}", title, addr);
    eprintln!("Press Ctrl+C to stop");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}

/// Serve the dashboard page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("index.html"))
}

/// Page title and build info
async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "title": state.title,
        "database": state.database,
        "version": env!("CARGO_PKG_VERSION"),
        "commit": commands::GIT_COMMIT,
        "built_at": commands::BUILD_TIMESTAMP,
    }))
}

/// All stages in cycle order, for the stage dropdown
async fn get_stages(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage.lock().await;
    let stages = storage.list_stages()?;
    Ok(Json(json!({ "stages": stages })))
}

#[derive(Debug, Default, Deserialize)]
struct GraphQuery {
    selected: Option<String>,
}

/// The lifecycle diagram. Never fails; a broken database renders as empty.
async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Json<LifecycleGraph> {
    let selected = query.selected.as_deref().filter(|s| !s.trim().is_empty());
    let storage = state.storage.lock().await;
    Json(commands::load_graph(&storage, selected))
}

async fn get_stage_substages(
    State(state): State<AppState>,
    UrlPath(stage): UrlPath<String>,
) -> ApiResult<Json<Value>> {
    let storage = state.storage.lock().await;
    let stage = storage.get_stage(&stage)?;
    let substages = storage.list_substages(Some(&stage.name))?;
    Ok(Json(json!({ "stage": stage.name, "substages": substages })))
}

async fn get_stage_tools(
    State(state): State<AppState>,
    UrlPath(stage): UrlPath<String>,
) -> ApiResult<Json<Value>> {
    let storage = state.storage.lock().await;
    let stage = storage.get_stage(&stage)?;
    let tools = storage.list_tools(Some(&stage.name))?;
    Ok(Json(json!({ "stage": stage.name, "tools": tools })))
}

async fn get_exemplars(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<i64>,
) -> ApiResult<Json<ExemplarList>> {
    let storage = state.storage.lock().await;
    let substage = storage.get_substage(id)?;
    Ok(Json(ExemplarList {
        exemplars: substage.exemplars(),
        substage: substage.name,
        stage: substage.stage,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ToolQuery {
    stage: Option<String>,
}

async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolQuery>,
) -> ApiResult<Json<Value>> {
    let storage = state.storage.lock().await;
    let stage = match query.stage.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(storage.get_stage(s)?.name),
        None => None,
    };
    let tools = storage.list_tools(stage.as_deref())?;
    Ok(Json(json!({ "count": tools.len(), "tools": tools })))
}

async fn create_tool(
    State(state): State<AppState>,
    Json(input): Json<NewTool>,
) -> ApiResult<impl IntoResponse> {
    let tool = {
        let mut storage = state.storage.lock().await;
        storage.create_tool(&input)?
    };
    tracing::info!(id = tool.id, name = %tool.name, stage = %tool.stage, "tool created");
    state.notify_tools_changed("created", tool.id);
    Ok((StatusCode::CREATED, Json(tool)))
}

async fn get_tool(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.get_tool(id)?))
}

async fn update_tool(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<i64>,
    Json(update): Json<ToolUpdate>,
) -> ApiResult<impl IntoResponse> {
    if update.is_empty() {
        return Err(ApiError(Error::InvalidInput(
            "No fields to update".to_string(),
        )));
    }
    let tool = {
        let mut storage = state.storage.lock().await;
        storage.update_tool(id, &update)?
    };
    tracing::info!(id, "tool updated");
    state.notify_tools_changed("updated", id);
    Ok(Json(tool))
}

async fn delete_tool(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<i64>,
) -> ApiResult<impl IntoResponse> {
    {
        let mut storage = state.storage.lock().await;
        storage.delete_tool(id)?;
    }
    tracing::info!(id, "tool deleted");
    state.notify_tools_changed("deleted", id);
    Ok(Json(json!({ "id": id, "deleted": true })))
}
