//! HTTP API server for integration with other systems.
//!
//! `POST /generate` returns scene code as JSON, or the rendered MP4 when
//! called with `?type=video`.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::rag::RagCodeGenerator;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let generator = Arc::new(RagCodeGenerator::initialize(&settings)?);
    let pipeline = Pipeline::new(&settings, generator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Animagen API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Code", "POST /generate");
    Output::kv("Video", "POST /generate?type=video");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(pipeline)).await?;

    Ok(())
}

fn router(pipeline: Pipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .layer(cors)
        .with_state(Arc::new(AppState { pipeline }))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct GenerateParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    prompt: String,
}

#[derive(Serialize)]
struct CodeResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>, stderr: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            stderr,
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateParams>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "prompt is required", None);
    }

    let video = params.kind.as_deref() == Some("video");
    info!(video, "POST /generate: {}", prompt);

    if video {
        generate_video(&state.pipeline, prompt).await
    } else {
        match state.pipeline.generate_code(prompt).await {
            Ok(generated) => Json(CodeResponse {
                result: generated.code,
            })
            .into_response(),
            Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
        }
    }
}

async fn generate_video(pipeline: &Pipeline, prompt: &str) -> Response {
    let outcome = match pipeline.generate_video(prompt).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
    };

    match outcome {
        RunOutcome::Rendered { video, .. } => match tokio::fs::read(&video).await {
            Ok(bytes) => ([(header::CONTENT_TYPE, "video/mp4")], bytes).into_response(),
            Err(e) => {
                error!("Failed to read {}: {}", video.display(), e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to read rendered video: {}", e),
                    None,
                )
            }
        },
        RunOutcome::Rejected { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Generated code does not look like a scene",
            None,
        ),
        RunOutcome::RenderFailed { status, output, .. } => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Renderer exited with status {:?}", status),
            Some(output.stderr),
        ),
        RunOutcome::ArtifactMissing { .. } => error_response(
            StatusCode::NOT_FOUND,
            "Video file was not found after rendering completed",
            None,
        ),
        RunOutcome::Failed { error, .. } => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error, None)
        }
    }
}
