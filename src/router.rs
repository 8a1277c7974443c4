use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::CaptionBackend;
use crate::handlers::workflow::{start_workflow, MAX_BODY_BYTES};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();
    let generated_dir = state.config.generated_dir.clone();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/start_workflow", post(start_workflow))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .nest_service("/generated", ServeDir::new(generated_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Development CORS: the form client runs on another origin.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "AgenticMarketers API is running",
        "status": "healthy",
        "agent_ready": state.caption.is_some(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let caption_backend = match state.config.caption_backend {
        CaptionBackend::OpenAi => "openai",
        CaptionBackend::AgentCore => "agentcore",
    };
    Json(serde_json::json!({
        "status": "healthy",
        "agent_ready": state.caption.is_some(),
        "image_generation_ready": state.photographer.is_some(),
        "caption_backend": caption_backend,
    }))
}
