use crate::config::bootstrap;
use crate::config::cli::LocalStorage;
use crate::core::csv_io::{parse_csv, write_scored};
use crate::core::pipeline::SCORED_FILENAME;
use crate::core::recommendations::Playbook;
use crate::core::report::build_report;
use crate::core::scoring::HeuristicScorer;
use crate::dashboard::{AppState, SAMPLE_PREVIEW_ROWS};
use crate::domain::model::{Alert, DashboardView, EventTable, RadarChart, Record, RiskReport};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ScoreParams {
    /// UI 滑桿的門檻值，未提供時使用設定檔
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub threshold: f64,
    pub playbook: Playbook,
    pub max_preview_rows: usize,
    pub max_alerts: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Upload,
    Sample,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub title: &'static str,
    pub view: DashboardView,
    pub source: DataSource,
    pub scorer: String,
    pub threshold: f64,
    pub total_rows: usize,
    pub alert_count: usize,
    pub columns: Vec<String>,
    pub preview: Vec<Record>,
    pub alerts: Vec<Alert>,
    pub radar: Option<RadarChart>,
    pub radar_message: Option<&'static str>,
    pub generated_at: DateTime<Utc>,
}

impl ScoreResponse {
    fn from_report(report: RiskReport, source: DataSource, max_rows: usize, max_alerts: usize) -> Self {
        let preview_rows = report.scored.len().min(max_rows);
        let radar_message = report
            .radar
            .is_none()
            .then_some("Not enough numeric columns for a radar chart.");

        Self {
            title: report.view.title(),
            view: report.view,
            source,
            scorer: report.scorer,
            threshold: report.threshold,
            total_rows: report.scored.len(),
            alert_count: report.alerts.len(),
            columns: report.scored.headers(),
            preview: (0..preview_rows).map(|i| report.scored.record(i)).collect(),
            alerts: report.alerts.into_iter().take(max_alerts).collect(),
            radar: report.radar,
            radar_message,
            generated_at: report.generated_at,
        }
    }
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("ui/index.html"))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        threshold: state.config.threshold(),
        playbook: state.config.playbook(),
        max_preview_rows: state.config.max_preview_rows(),
        max_alerts: state.config.max_alerts(),
    })
}

async fn read_sample(state: &AppState) -> Result<Vec<u8>> {
    bootstrap::ensure_sample_events(&state.sample_path)?;
    let path = state.sample_path.to_string_lossy();
    LocalStorage::default().read_file(&path).await
}

pub async fn download_sample(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let bytes = read_sample(&state).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sample_events.csv\"",
            ),
        ],
        bytes,
    ))
}

/// 空的請求內容代表使用範例資料 (前 100 筆)
async fn load_events(state: &AppState, body: &Bytes) -> Result<(EventTable, DataSource)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        let table = parse_csv(&read_sample(state).await?)?;
        tracing::info!("📄 No upload, analysing sample data");
        return Ok((table.head(SAMPLE_PREVIEW_ROWS), DataSource::Sample));
    }
    Ok((parse_csv(body)?, DataSource::Upload))
}

fn score_events(state: &AppState, events: EventTable, params: &ScoreParams) -> Result<RiskReport> {
    let threshold = match params.threshold {
        Some(threshold) => {
            validate_range("threshold", threshold, 0.0, 1.0)?;
            threshold
        }
        None => state.config.threshold(),
    };

    let scorer = HeuristicScorer::new(state.config.weights());
    build_report(events, &scorer, threshold, &state.config.recommender())
}

pub async fn score(
    State(state): State<AppState>,
    Query(params): Query<ScoreParams>,
    body: Bytes,
) -> Result<Json<ScoreResponse>> {
    let (events, source) = load_events(&state, &body).await?;
    let report = score_events(&state, events, &params)?;

    Ok(Json(ScoreResponse::from_report(
        report,
        source,
        state.config.max_preview_rows(),
        state.config.max_alerts(),
    )))
}

pub async fn score_csv(
    State(state): State<AppState>,
    Query(params): Query<ScoreParams>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let (events, _) = load_events(&state, &body).await?;
    let report = score_events(&state, events, &params)?;
    let csv = write_scored(&report.scored)?;

    let disposition = format!("attachment; filename=\"{}\"", SCORED_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
