//! HTTP server: JSON routes over a shared [`Archive`], plus the curator.
//!
//! Provides [`router`] for embedding the routes elsewhere (tests bind it to an
//! ephemeral port) and [`serve`], which wires up storage, the embedding
//! provider and the [`GhostCurator`] and runs until ctrl-c.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::archive::curator::GhostCurator;
use crate::archive::lineage::LineageTrace;
use crate::archive::types::Reflection;
use crate::archive::{Archive, SearchResponse, SubmitResponse};
use crate::config::ArchiveConfig;
use crate::error::ArchiveError;

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    #[serde(alias = "text")]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct GhostThreadsQuery {
    pub limit: Option<usize>,
}

/// An [`ArchiveError`] rendered as `{"success": false, "error": ...}`.
///
/// Client faults carry their message. Server faults are logged with their
/// cause and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(ArchiveError);

impl From<ArchiveError> for ApiError {
    fn from(e: ArchiveError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ArchiveError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ArchiveError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ArchiveError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ArchiveError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            ArchiveError::Timeout(_) => {
                tracing::error!(error = %self.0, "request timed out");
                (StatusCode::GATEWAY_TIMEOUT, "embedding provider timed out".to_string())
            }
            ArchiveError::Provider(_) => {
                tracing::error!(error = %self.0, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding provider failed".to_string())
            }
            ArchiveError::Store(_) => {
                tracing::error!(error = %self.0, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
        };
        let body = serde_json::json!({ "success": false, "error": message });
        (status, Json(body)).into_response()
    }
}

/// The four archive routes.
pub fn router(archive: Arc<Archive>) -> Router {
    Router::new()
        .route("/api/input", post(submit_input))
        .route("/api/search", post(find_resonance))
        .route("/api/trace/{id}", get(trace_lineage))
        .route("/api/ghost-threads", get(ghost_threads))
        .with_state(archive)
}

async fn submit_input(
    State(archive): State<Arc<Archive>>,
    payload: Result<Json<InputRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) = payload?;
    let kind = request.kind.as_deref().unwrap_or("text");
    let content = request.content.unwrap_or_default();
    Ok(Json(archive.submit_input(&content, kind).await?))
}

async fn find_resonance(
    State(archive): State<Arc<Archive>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;
    let embedding = request.embedding.unwrap_or_default();
    Ok(Json(archive.find_resonance(embedding).await?))
}

async fn trace_lineage(
    State(archive): State<Arc<Archive>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<LineageTrace>, ApiError> {
    let Path(id) = id?;
    Ok(Json(archive.trace_lineage(id).await?))
}

async fn ghost_threads(
    State(archive): State<Arc<Archive>>,
    Query(query): Query<GhostThreadsQuery>,
) -> Result<Json<Vec<Reflection>>, ApiError> {
    Ok(Json(archive.ghost_threads(query.limit).await?))
}

/// Start the HTTP server and the curator, and run until ctrl-c.
pub async fn serve(config: ArchiveConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let archive = Arc::new(Archive::open(&config)?);

    let mut curator = GhostCurator::new(Arc::clone(&archive), config.curator.clone());
    if config.curator.enabled {
        curator.start()?;
    } else {
        tracing::info!("ghost curator disabled");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "resonance archive listening at http://{bind_addr}/api");

    axum::serve(listener, router(archive))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if curator.is_running() {
        curator.stop().await?;
    }
    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down HTTP server");
}
