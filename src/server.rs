//! Browser UI routes.

use crate::orchestrator::Orchestrator;
use crate::render::{export, page};
use crate::state::Snapshot;
use axum::extract::{Form, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";
/// Page for the current run.
pub const INDEX_PATH: &str = "/";
/// Form target that starts a run.
pub const RESEARCH_PATH: &str = "/research";
/// Form target that returns to idle.
pub const RESET_PATH: &str = "/reset";
/// Markdown download of the finished report.
pub const REPORT_PATH: &str = "/report.md";
/// JSON snapshot of the current run.
pub const SNAPSHOT_PATH: &str = "/api/snapshot";

/// Shared state of the web UI.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the UI routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(INDEX_PATH, get(index))
        .route(RESEARCH_PATH, post(start_research))
        .route(RESET_PATH, post(reset))
        .route(REPORT_PATH, get(download_report))
        .route(SNAPSHOT_PATH, get(snapshot))
}

/// Build the full application for an orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    routes().with_state(AppState { orchestrator })
}

#[derive(Debug, Deserialize)]
struct ResearchForm {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    notes: String,
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn index(State(st): State<AppState>) -> Html<String> {
    Html(page::render(&st.orchestrator.snapshot()))
}

async fn start_research(State(st): State<AppState>, Form(form): Form<ResearchForm>) -> Response {
    match st.orchestrator.spawn(form.subject, form.notes) {
        Ok(_) => Redirect::to(INDEX_PATH).into_response(),
        Err(err) => {
            warn!(error = %err, "Research request rejected");
            (StatusCode::CONFLICT, Html(page::busy_page(&err.to_string()))).into_response()
        }
    }
}

async fn reset(State(st): State<AppState>) -> Response {
    match st.orchestrator.reset() {
        Ok(()) => Redirect::to(INDEX_PATH).into_response(),
        Err(err) => (StatusCode::CONFLICT, Html(page::busy_page(&err.to_string()))).into_response(),
    }
}

async fn download_report(State(st): State<AppState>) -> Response {
    let Snapshot {
        subject, report, ..
    } = st.orchestrator.snapshot();

    match report {
        Some(report) => (
            [
                (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, export::content_disposition(&subject)),
            ],
            report,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No report available").into_response(),
    }
}

async fn snapshot(State(st): State<AppState>) -> Json<Snapshot> {
    Json(st.orchestrator.snapshot())
}
