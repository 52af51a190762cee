//! Stored record endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::export::{csv_file_name, record_to_csv};
use crate::server::state::AppState;
use crate::types::ExtractedRecord;

const NOT_FOUND_MESSAGE: &str = "Data not found";

fn find_record(state: &AppState, id: &str) -> Result<ExtractedRecord> {
    // An id that is not a UUID cannot match any record
    let Ok(id) = Uuid::parse_str(id) else {
        return Err(Error::NotFound(NOT_FOUND_MESSAGE.to_string()));
    };

    state
        .store()
        .get(&id)?
        .ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

/// GET /api/pdf/all - All records, newest first
pub async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<ExtractedRecord>>> {
    Ok(Json(state.store().list()?))
}

/// GET /api/pdf/:id - One record
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractedRecord>> {
    Ok(Json(find_record(&state, &id)?))
}

/// GET /api/pdf/:id/csv - One record as a CSV download
pub async fn export_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = find_record(&state, &id)?;
    let csv = record_to_csv(&record)?;

    // Non-ASCII names go in filename*, the plain filename gets an ASCII fallback
    let download_name = csv_file_name(&record.file_name);
    let ascii_name: String = download_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_name,
        percent_encode(&download_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// RFC 5987 value encoding
fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}
