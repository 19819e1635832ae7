use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    compiler::LegacyAnalysis,
    config::ServiceConfig,
    error::AnalysisError,
    models::AnalyzeTranscriptRequest,
    reasoning::RigReasoningClient,
    workflow::ClinicalReasoningPipeline,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn stage_error(message: &str, stage: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "stage": stage,
            "details": details
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ClinicalReasoningPipeline>,
}

pub fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let client = Arc::new(RigReasoningClient::new(&config.api_key, config.model.clone()));
    let pipeline = ClinicalReasoningPipeline::new(client, &config.pipeline)?;

    Ok(build_router(AppState {
        pipeline: Arc::new(pipeline),
    }))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/clinical/analyze", post(analyze_transcript))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Clinical Analysis Service",
        "version": "1.0.0",
        "description": "Seven-stage clinical reasoning over consultation transcripts with structured extraction",
        "endpoints": {
            "POST /clinical/analyze": "Analyze a transcript (add ?view=legacy for the legacy shape)",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default)]
    pub view: Option<String>,
}

async fn analyze_transcript(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    Json(request): Json<AnalyzeTranscriptRequest>,
) -> ApiResult<Value> {
    validate_transcript(&request.transcript)?;
    info!(
        transcript_chars = request.transcript.len(),
        view = ?query.view,
        "Starting clinical transcript analysis"
    );

    let result = state
        .pipeline
        .run(&request.transcript, request.patient_context, request.options)
        .await
        .map_err(analysis_error)?;

    let body = match query.view.as_deref() {
        Some("legacy") => serde_json::to_value(LegacyAnalysis::from(&result)),
        _ => serde_json::to_value(&result),
    }
    .map_err(|e| internal_error("Failed to serialize analysis", &e.to_string()))?;

    Ok(Json(body))
}

fn validate_transcript(transcript: &str) -> Result<(), ApiError> {
    if transcript.trim().is_empty() {
        return Err(bad_request_error("Transcript is required"));
    }
    Ok(())
}

fn analysis_error(e: AnalysisError) -> ApiError {
    error!("Clinical analysis failed: {}", e);
    match e.stage() {
        Some(stage) => stage_error("Reasoning stage failed", stage.as_str(), &e.to_string()),
        None => internal_error("Clinical analysis failed", &e.to_string()),
    }
}
