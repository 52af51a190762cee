//! API routes for the extraction server

pub mod auth;
pub mod extract;
pub mod queue;
pub mod records;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Routes mounted under `/api/pdf`
pub fn pdf_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Uploads - with larger body limit
        .route(
            "/extract",
            post(extract::extract_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/extract-batch",
            post(extract::extract_batch).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Queue
        .route("/queue/status", get(queue::queue_status))
        .route("/queue/job/:job_id", get(queue::get_job))
        .route("/queue/jobs", get(queue::list_jobs))
        // Records
        .route("/all", get(records::list_records))
        .route("/:id", get(records::get_record))
        .route("/:id/csv", get(records::export_csv))
}

/// Routes mounted under `/api/auth`
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/check", get(auth::check))
}
