//! Axum route handlers for the Analysis API.

use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::analysis::analyzer::{AnalysisOutcome, AnalysisRequest, AnalysisStage};
use crate::analysis::prompts::PromptSpec;
use crate::analysis::report::{
    export_report, AnalysisReport, ReportView, EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME,
};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzeResponse {
    Report {
        run_id: Uuid,
        stage: AnalysisStage,
        /// The mapping exactly as the model returned it (what gets exported).
        report: AnalysisReport,
        view: ReportView,
    },
    Fallback {
        run_id: Uuid,
        stage: AnalysisStage,
        raw_text: String,
    },
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let stage = outcome.stage();
        match outcome {
            AnalysisOutcome::Report { run_id, report } => AnalyzeResponse::Report {
                run_id,
                stage,
                view: report.view(),
                report,
            },
            AnalysisOutcome::Fallback { run_id, fallback } => AnalyzeResponse::Fallback {
                run_id,
                stage,
                raw_text: fallback.raw_text,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub model: String,
    pub temperature: f32,
    #[serde(flatten)]
    pub prompt: PromptSpec,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
///
/// Validates both texts and the credential, calls the model once, and
/// returns either a structured report or the raw reply for fallback display.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let outcome = state.analyzer.analyze(&request).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/analysis/export
///
/// Echoes a report back as a pretty-printed JSON file download.
pub async fn handle_export(
    Json(report): Json<Map<String, Value>>,
) -> Result<Response, AppError> {
    let body = export_report(&AnalysisReport::from_map(report));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EXPORT_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
        )
        .body(Body::from(body))
        .context("Failed to build export response")?;

    Ok(response)
}

/// GET /api/v1/analysis/schema
///
/// Returns the instruction prompt and reply schema currently in use.
pub async fn handle_schema(State(state): State<AppState>) -> Json<SchemaResponse> {
    let analyzer = &state.analyzer;
    Json(SchemaResponse {
        model: analyzer.model().model.clone(),
        temperature: analyzer.model().temperature,
        prompt: analyzer.prompt_spec().clone(),
    })
}
