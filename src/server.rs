use crate::core::{
    group_suggestions, AnalysisResult, CodeAnalyzer, CommentStyle, EmptyInputError, Language,
    LanguageDetector, SuggestionItem,
};
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub struct AppState {
    pub analyzer: CodeAnalyzer,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please enter some code to analyze.")]
    EmptyInput,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyInput | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::EmptyInput => "empty_input",
            ApiError::BadRequest(_) => "bad_request",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<EmptyInputError> for ApiError {
    fn from(_: EmptyInputError) -> Self {
        ApiError::EmptyInput
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    pub code: String,
    pub comment_style: Option<CommentStyle>,
}

#[derive(Debug, Deserialize)]
pub struct DetectBody {
    pub code: String,
}

/// One generated output: `text` on success, `error` otherwise.
#[derive(Debug, Serialize)]
pub struct OutputBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<E: std::fmt::Display> From<Result<String, E>> for OutputBody {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(text) => Self {
                text: Some(text),
                error: None,
            },
            Err(err) => Self {
                text: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub language: Language,
    pub language_name: &'static str,
    pub comments: OutputBody,
    pub suggestions: OutputBody,
    pub suggestion_items: Vec<SuggestionItem>,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        let suggestion_items = result
            .suggestions
            .as_deref()
            .map(group_suggestions)
            .unwrap_or_default();

        Self {
            language: result.language,
            language_name: result.language.display_name(),
            comments: result.explanation.into(),
            suggestions: result.suggestions.into(),
            suggestion_items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/detect", post(detect))
        .route("/api/analyze", post(analyze))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.analyzer.model_name().to_string(),
    })
}

async fn detect(
    payload: Result<Json<DetectBody>, JsonRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(DetectResponse {
        language: LanguageDetector::detect(&body.code),
    }))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(body) = payload?;
    let style = body
        .comment_style
        .unwrap_or_else(|| state.analyzer.default_style());

    let result = state.analyzer.analyze(&body.code, style).await?;

    if let Err(err) = &result.explanation {
        warn!("Comment generation failed: {}", err);
    }
    if let Err(err) = &result.suggestions {
        warn!("Suggestion generation failed: {}", err);
    }

    Ok(Json(result.into()))
}
