//! Upload queue status endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::processing::{Job, QueueStatus};
use crate::server::state::AppState;

/// GET /api/pdf/queue/status - Job counts per status
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.queue().status())
}

/// GET /api/pdf/queue/job/:job_id - One job
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>> {
    state
        .queue()
        .job(&job_id)
        .map(Json)
        .ok_or_else(|| Error::validation(format!("Job {} not found", job_id)))
}

/// GET /api/pdf/queue/jobs - All jobs in enqueue order
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.queue().jobs())
}
