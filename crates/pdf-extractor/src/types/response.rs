//! Response types for the upload endpoints

use serde::Serialize;

use crate::processing::QueueStatus;

/// Response from a batch upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResponse {
    /// Human-readable summary
    pub message: String,
    /// IDs of the queued jobs, in upload order
    pub job_ids: Vec<String>,
    /// Queue counts right after enqueueing
    pub queue_status: QueueStatus,
}
