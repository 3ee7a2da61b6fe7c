//! REST API handlers for studyview-server.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

use studyview_core::{chart, edf, storage, trial_filter, Study, StudyviewError, Target, ThemeMode};

use crate::state::AppState;

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route(
            "/register_dashboard_app",
            get(get_dashboard_app).post(register_dashboard_app),
        )
        .route("/studies", get(list_studies))
        .route("/studies/{name}", get(get_study))
        .route("/studies/{name}/edf", get(get_study_edf))
        .route("/studies/{name}/edf/points", get(get_study_edf_points))
        .route("/compare/edf", get(compare_edf))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn error_response(e: StudyviewError) -> Response {
    let status = match &e {
        StudyviewError::StudyNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %e, "Request failed");
    }
    (status, e.to_string()).into_response()
}

/// Query params shared by the EDF endpoints.
#[derive(Deserialize, Default)]
struct EdfQuery {
    /// Target identifier, e.g. `objective:0` or `params:lr`. Defaults to objective 0.
    target: Option<String>,
    /// `light` (default) or `dark`.
    mode: Option<String>,
    /// Comma-separated study names (compare endpoint only).
    studies: Option<String>,
}

impl EdfQuery {
    fn target(&self) -> Result<Target, StudyviewError> {
        match &self.target {
            Some(id) => Target::from_identifier(id),
            None => Ok(Target::default()),
        }
    }

    fn mode(&self) -> Result<ThemeMode, StudyviewError> {
        match &self.mode {
            Some(m) => m.parse().map_err(StudyviewError::InvalidQuery),
            None => Ok(ThemeMode::default()),
        }
    }

    fn study_names(&self) -> Vec<String> {
        self.studies
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn check_target(study: &Study, target: &Target) -> Result<(), StudyviewError> {
    if target.is_valid_for(study) {
        Ok(())
    } else {
        Err(StudyviewError::InvalidTarget(format!(
            "{} is not available in study '{}'",
            target,
            study.name()
        )))
    }
}

fn load_study_edf(state: &AppState, name: &str, q: &EdfQuery) -> Result<edf::EdfCurve, StudyviewError> {
    let study = storage::load_study(&state.storage_dir(), name)?;
    let target = q.target()?;
    check_target(&study, &target)?;
    Ok(edf::build(&trial_filter::study_samples(&study, &target)))
}

fn build_study_figure(state: &AppState, name: &str, q: &EdfQuery) -> Result<serde_json::Value, StudyviewError> {
    let mode = q.mode()?;
    let curve = load_study_edf(state, name, q)?;
    chart::to_json_value(&chart::edf_plot(&curve, mode))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn hello() -> impl IntoResponse {
    Json(serde_json::json!({"data": "This is /studyview/hello endpoint!"}))
}

#[derive(Deserialize)]
struct RegisterRequest {
    storage_url: String,
    #[serde(default)]
    artifact_path: String,
}

async fn register_dashboard_app(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match state.register(&req.storage_url, &req.artifact_path) {
        Ok(reg) => (StatusCode::CREATED, Json(reg)).into_response(),
        Err(e) => {
            warn!(storage = %req.storage_url, error = %e, "Dashboard registration rejected");
            error_response(e)
        }
    }
}

async fn get_dashboard_app(State(state): State<AppState>) -> impl IntoResponse {
    let reg = state.registration();
    Json(serde_json::json!({
        "initialized": reg.is_some(),
        "registration": reg,
    }))
}

async fn list_studies(State(state): State<AppState>) -> impl IntoResponse {
    let dir = state.storage_dir();
    match storage::list_studies(&dir) {
        Ok(names) => {
            let mut result = vec![];
            for name in names {
                match storage::summarize_study(&dir, &name) {
                    Ok(summary) => result.push(summary),
                    Err(e) => warn!(study = %name, error = %e, "Skipping unreadable study"),
                }
            }
            Json(result).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_study(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match storage::load_study(&state.storage_dir(), &name) {
        Ok(study) => Json(study).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_study_edf(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<EdfQuery>,
) -> impl IntoResponse {
    match build_study_figure(&state, &name, &q) {
        Ok(fig) => Json(fig).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_study_edf_points(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<EdfQuery>,
) -> impl IntoResponse {
    match load_study_edf(&state, &name, &q) {
        Ok(curve) => Json(curve).into_response(),
        Err(e) => error_response(e),
    }
}

async fn compare_edf(State(state): State<AppState>, Query(q): Query<EdfQuery>) -> impl IntoResponse {
    match build_comparison(&state, &q) {
        Ok(fig) => Json(fig).into_response(),
        Err(e) => error_response(e),
    }
}

fn build_comparison(state: &AppState, q: &EdfQuery) -> Result<serde_json::Value, StudyviewError> {
    let dir = state.storage_dir();
    let mode = q.mode()?;
    let target = q.target()?;
    let studies = q
        .study_names()
        .iter()
        .map(|name| storage::load_study(&dir, name))
        .collect::<Result<Vec<_>, _>>()?;
    // Selectable targets come from the first study.
    if let Some(first) = studies.first() {
        check_target(first, &target)?;
    }
    let curves = studyview_core::edf_for_studies(&studies, &target);
    debug!(series = curves.len(), target = %target, "Built EDF comparison");
    chart::to_json_value(&chart::edf_multi_plot(&curves, mode))
}
