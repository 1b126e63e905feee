//! Browser dashboard: upload a CSV, score it, inspect alerts and download
//! the scored file.
//!
//! Routes:
//! - `GET  /`              single-page UI
//! - `GET  /health`
//! - `GET  /api/config`    threshold, playbook and display limits
//! - `GET  /api/sample`    sample events CSV download
//! - `POST /api/score`     CSV body (empty body = sample data) -> JSON report
//! - `POST /api/score.csv` CSV body -> scored CSV download

pub mod handlers;

use crate::config::risk_config::RiskConfig;
use crate::utils::error::{ErrorCategory, RiskError};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 上傳檔案大小上限
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Rows analysed when no file is uploaded.
pub const SAMPLE_PREVIEW_ROWS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RiskConfig>,
    pub sample_path: PathBuf,
}

impl AppState {
    pub fn new(config: RiskConfig, sample_path: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            sample_path: sample_path.into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/config", get(handlers::get_config))
        .route("/api/sample", get(handlers::download_sample))
        .route("/api/score", post(handlers::score))
        .route("/api/score.csv", post(handlers::score_csv))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub suggestion: String,
}

impl IntoResponse for RiskError {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self);
        } else {
            tracing::warn!("⚠️ Rejected request: {}", self);
        }

        let body = ErrorResponse {
            error: self.user_friendly_message(),
            suggestion: self.recovery_suggestion(),
        };
        (status, Json(body)).into_response()
    }
}
