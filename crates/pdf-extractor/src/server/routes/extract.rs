//! PDF upload endpoints

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{BatchUploadResponse, ExtractedRecord, UploadedFile};

/// Read one multipart file field into an upload
async fn read_upload(field: Field<'_>) -> Result<UploadedFile> {
    let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| Error::validation(format!("Failed to read file '{}': {}", file_name, e)))?;

    Ok(UploadedFile::new(file_name, content_type, data))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
    Error::validation(format!("Failed to read multipart field: {}", e))
}

/// POST /api/pdf/extract - Extract one PDF synchronously
pub async fn extract_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedRecord>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            upload = Some(read_upload(field).await?);
            break;
        }
    }

    let file = upload.ok_or_else(|| Error::validation("No file uploaded"))?;
    if !file.is_pdf() {
        return Err(Error::validation("Only PDF files are allowed"));
    }

    let record = state.pipeline().process(&file).await?;
    Ok(Json(record))
}

/// POST /api/pdf/extract-batch - Queue several PDFs for background extraction
pub async fn extract_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchUploadResponse>> {
    let max_files = state.config().queue.max_batch_files;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("files") {
            continue;
        }
        if files.len() == max_files {
            return Err(Error::validation(format!(
                "Maximum {} files allowed per batch",
                max_files
            )));
        }
        files.push(read_upload(field).await?);
    }

    if files.is_empty() {
        return Err(Error::validation("No files uploaded"));
    }
    if let Some(file) = files.iter().find(|f| !f.is_pdf()) {
        tracing::warn!("Rejected batch: '{}' is not a PDF", file.file_name);
        return Err(Error::validation("Only PDF files are allowed"));
    }

    let count = files.len();
    let job_ids = state.queue().enqueue(files);
    tracing::info!("Queued {} files for batch extraction", count);

    Ok(Json(BatchUploadResponse {
        message: format!("{} file(s) queued for processing", count),
        job_ids,
        queue_status: state.queue().status(),
    }))
}
