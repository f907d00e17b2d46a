use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{JobStatusView, OutcomeReport, ReportAck, TaskAssignment, TaskRequest};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/status", get(job_status))
        .route("/api/v1/tasks/request", post(request_task))
        .route("/api/v1/tasks/report", post(report_outcome))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// RequestTask: nunca bloquea; si no hay nada asignable devuelve WAIT
async fn request_task(
    State(state): State<AppState>,
    Json(_req): Json<TaskRequest>,
) -> Json<TaskAssignment> {
    let assignment = state.scheduler.request_task();
    debug!("respuesta a pedido de tarea: {:?}", assignment.kind);
    Json(assignment)
}

// ReportOutcome: siempre se acepta, aunque el scheduler lo ignore
async fn report_outcome(
    State(state): State<AppState>,
    Json(req): Json<OutcomeReport>,
) -> Json<ReportAck> {
    state.scheduler.report_outcome(req.task_id, req.kind);
    Json(ReportAck { ok: true })
}

async fn job_status(State(state): State<AppState>) -> Json<JobStatusView> {
    Json(state.scheduler.status())
}
