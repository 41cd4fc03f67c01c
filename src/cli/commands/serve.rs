//! Local HTTP API.
//!
//! Serves moments, status and seek URLs for browser or editor integrations.

use crate::cli::Output;
use crate::config::{AnalysisMode, Settings};
use crate::orchestrator::{Analysis, AnalyzeOptions, Orchestrator};
use crate::video::parse_video_id;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ytmoments API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Moments", "GET  /moments/{video_id}?mode=&refresh=");
    Output::kv("Seek", "GET  /seek/{video_id}/{seconds}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/moments/{video_id}", get(moments))
        .route("/seek/{video_id}/{seconds}", get(seek))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize, Default)]
struct MomentsQuery {
    #[serde(default)]
    mode: Option<String>,
    /// Skip the cache and re-run the pipeline.
    #[serde(default)]
    refresh: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    busy: bool,
}

#[derive(Serialize)]
struct SeekResponse {
    video_id: String,
    seconds: f64,
    url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        busy: state.orchestrator.is_busy(),
    })
}

async fn moments(
    State(state): State<Arc<AppState>>,
    Path(input): Path<String>,
    Query(query): Query<MomentsQuery>,
) -> Response {
    let Some(video_id) = parse_video_id(&input) else {
        return error(StatusCode::BAD_REQUEST, format!("Not a YouTube video ID: {}", input));
    };
    let mode = match query.mode.as_deref().map(str::parse::<AnalysisMode>).transpose() {
        Ok(mode) => mode,
        Err(e) => return error(StatusCode::BAD_REQUEST, e),
    };

    let options = AnalyzeOptions {
        mode,
        use_cache: !query.refresh,
        ..Default::default()
    };

    match state.orchestrator.analyze(&video_id, options).await {
        Ok(Some(analysis)) => Json::<Analysis>(analysis).into_response(),
        Ok(None) => error(StatusCode::CONFLICT, "An analysis is already running"),
        Err(e) => {
            warn!("Analysis of {} failed: {}", video_id, e);
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn seek(State(state): State<Arc<AppState>>, Path((input, seconds)): Path<(String, f64)>) -> Response {
    let Some(video_id) = parse_video_id(&input) else {
        return error(StatusCode::BAD_REQUEST, format!("Not a YouTube video ID: {}", input));
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return error(StatusCode::BAD_REQUEST, "Seconds must be a non-negative number");
    }

    Json(SeekResponse {
        url: state.orchestrator.seek_url(&video_id, seconds),
        video_id,
        seconds,
    })
    .into_response()
}
