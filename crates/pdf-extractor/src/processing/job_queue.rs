//! In-memory upload queue with a single background worker
//!
//! Jobs live only in memory. A terminal job is swept a fixed retention period
//! after it finishes, whether or not anyone polled its result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{ExtractedRecord, UploadedFile};

use super::worker::QueueWorker;

/// Something that turns one uploaded file into a stored record
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, file: &UploadedFile) -> Result<ExtractedRecord>;
}

/// Job status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A queued upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub file_name: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Upload payload, taken by the worker when processing starts
    #[serde(skip)]
    pub(super) file: Option<UploadedFile>,
}

impl Job {
    fn new(file: UploadedFile) -> Self {
        Self {
            id: new_job_id(),
            file_name: file.file_name.clone(),
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
            file: Some(file),
        }
    }
}

/// `job_<unix millis>_<9 random chars>`
fn new_job_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("job_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

/// Counts of jobs per status
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct QueueStatus {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Upload queue processing one job at a time in enqueue order
pub struct UploadQueue {
    /// Jobs in enqueue order
    pub(super) jobs: RwLock<Vec<Job>>,
    /// Set while a worker loop is alive
    pub(super) running: AtomicBool,
    /// Does the actual work for each job
    pub(super) processor: Arc<dyn JobProcessor>,
    /// How long terminal jobs stay visible
    retention: Duration,
    /// Pending post-terminal sweeps by job id
    sweeps: DashMap<String, AbortHandle>,
    shut_down: AtomicBool,
}

impl UploadQueue {
    /// Create an idle queue
    pub fn new(processor: Arc<dyn JobProcessor>, retention: Duration) -> Arc<Self> {
        Arc::new(Self {
            jobs: RwLock::new(Vec::new()),
            running: AtomicBool::new(false),
            processor,
            retention,
            sweeps: DashMap::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Append files as pending jobs and make sure the worker is running.
    ///
    /// Returns the new job ids in the order given.
    pub fn enqueue(self: &Arc<Self>, files: Vec<UploadedFile>) -> Vec<String> {
        let ids: Vec<String> = {
            let mut jobs = self.jobs.write();
            files
                .into_iter()
                .map(|file| {
                    let job = Job::new(file);
                    let id = job.id.clone();
                    tracing::info!("Queued job {} for '{}'", id, job.file_name);
                    jobs.push(job);
                    id
                })
                .collect()
        };

        self.ensure_worker();
        ids
    }

    /// Start the worker unless one is already running
    pub(super) fn ensure_worker(self: &Arc<Self>) {
        if self.shut_down.load(Ordering::SeqCst) {
            tracing::warn!("Upload queue is shut down, not starting worker");
            return;
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::debug!("Starting upload queue worker");
            tokio::spawn(QueueWorker::new(Arc::clone(self)).run());
        }
    }

    /// Snapshot of the per-status counts
    pub fn status(&self) -> QueueStatus {
        let jobs = self.jobs.read();
        let mut status = QueueStatus {
            total: jobs.len(),
            ..Default::default()
        };

        for job in jobs.iter() {
            match job.status {
                JobStatus::Pending => status.pending += 1,
                JobStatus::Processing => status.processing += 1,
                JobStatus::Completed => status.completed += 1,
                JobStatus::Failed => status.failed += 1,
            }
        }

        status
    }

    /// Snapshot of one job
    pub fn job(&self, id: &str) -> Option<Job> {
        self.jobs.read().iter().find(|j| j.id == id).cloned()
    }

    /// Snapshot of all jobs in enqueue order
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.read().clone()
    }

    /// Number of scheduled sweeps not yet run
    pub fn pending_sweeps(&self) -> usize {
        self.sweeps.len()
    }

    /// Mark the first pending job as processing and hand out its payload
    pub(super) fn claim_next(&self) -> Option<(String, UploadedFile)> {
        let mut jobs = self.jobs.write();
        let job = jobs.iter_mut().find(|j| j.status == JobStatus::Pending)?;

        job.status = JobStatus::Processing;
        let file = job.file.take()?;
        Some((job.id.clone(), file))
    }

    pub(super) fn has_pending(&self) -> bool {
        self.jobs.read().iter().any(|j| j.status == JobStatus::Pending)
    }

    /// Record the outcome of a job and schedule its sweep
    pub(super) fn finish(self: &Arc<Self>, id: &str, outcome: Result<ExtractedRecord>) {
        {
            let mut jobs = self.jobs.write();
            let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
                return;
            };

            match outcome {
                Ok(record) => {
                    tracing::info!("Job {} completed: record {}", id, record.id);
                    job.status = JobStatus::Completed;
                    job.result = Some(record);
                }
                Err(e) => {
                    tracing::error!("Job {} failed: {}", id, e);
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                }
            }
            job.completed_at = Some(Utc::now());
        }

        self.schedule_sweep(id.to_string());
    }

    /// Remove the job once the retention period has passed.
    ///
    /// The sweep is unconditional: a client that has not polled by then
    /// never sees the result.
    fn schedule_sweep(self: &Arc<Self>, id: String) {
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }

        let queue: Weak<Self> = Arc::downgrade(self);
        let retention = self.retention;
        let task_id = id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if let Some(queue) = queue.upgrade() {
                queue.jobs.write().retain(|j| j.id != task_id);
                queue.sweeps.remove(&task_id);
                tracing::debug!("Swept job {}", task_id);
            }
        });

        let abort = handle.abort_handle();
        if !handle.is_finished() {
            self.sweeps.insert(id, abort);
        }
    }

    /// Cancel every pending sweep and stop starting workers
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);

        let ids: Vec<String> = self.sweeps.iter().map(|e| e.key().clone()).collect();
        for id in &ids {
            if let Some((_, handle)) = self.sweeps.remove(id) {
                handle.abort();
            }
        }

        tracing::info!("Upload queue shut down, {} pending sweeps cancelled", ids.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::FlatContent;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Records processing order and peak concurrency
    #[derive(Default)]
    struct RecordingProcessor {
        active: AtomicUsize,
        peak: AtomicUsize,
        order: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobProcessor for RecordingProcessor {
        async fn process(&self, file: &UploadedFile) -> Result<ExtractedRecord> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.order.lock().push(file.file_name.clone());

            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if file.file_name.starts_with("bad") {
                return Err(Error::Extraction {
                    message: "Failed to extract data from PDF: broken".into(),
                    timed_out: false,
                });
            }
            Ok(ExtractedRecord::new(file.file_name.clone(), FlatContent::new()))
        }
    }

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(name, Some("application/pdf".into()), Bytes::from_static(b"%PDF-1.4"))
    }

    async fn wait_until_idle(queue: &UploadQueue) {
        for _ in 0..200 {
            let status = queue.status();
            if status.pending == 0 && status.processing == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("queue did not drain: {:?}", queue.status());
    }

    #[test]
    fn test_job_id_format() {
        let id = new_job_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "job");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[tokio::test]
    async fn test_processes_one_at_a_time_in_order() {
        let processor = Arc::new(RecordingProcessor::default());
        let queue = UploadQueue::new(processor.clone(), Duration::from_secs(3600));

        let ids = queue.enqueue(vec![upload("a.pdf"), upload("b.pdf"), upload("c.pdf")]);
        assert_eq!(ids.len(), 3);

        let mut max_processing = 0;
        for _ in 0..200 {
            let status = queue.status();
            max_processing = max_processing.max(status.processing);
            if status.completed == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(max_processing <= 1);
        assert_eq!(processor.peak.load(Ordering::SeqCst), 1);
        assert_eq!(*processor.order.lock(), vec!["a.pdf", "b.pdf", "c.pdf"]);

        let jobs = queue.jobs();
        let job_ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(job_ids, ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(jobs.iter().all(|j| j.status == JobStatus::Completed));
        assert!(jobs.iter().all(|j| j.completed_at.is_some() && j.result.is_some()));
        assert!(jobs.iter().all(|j| j.file.is_none()));
        queue.shutdown();
    }

    #[tokio::test]
    async fn test_failure_is_recorded_on_job() {
        let queue = UploadQueue::new(Arc::new(RecordingProcessor::default()), Duration::from_secs(3600));
        let ids = queue.enqueue(vec![upload("bad.pdf"), upload("good.pdf")]);
        wait_until_idle(&queue).await;

        let bad = queue.job(&ids[0]).unwrap();
        assert_eq!(bad.status, JobStatus::Failed);
        assert_eq!(bad.error.as_deref(), Some("Failed to extract data from PDF: broken"));
        assert!(bad.result.is_none());

        let good = queue.job(&ids[1]).unwrap();
        assert_eq!(good.status, JobStatus::Completed);

        let status = queue.status();
        assert_eq!(status, QueueStatus { total: 2, pending: 0, processing: 0, completed: 1, failed: 1 });
        queue.shutdown();
    }

    #[tokio::test]
    async fn test_idle_worker_restarts_on_enqueue() {
        let queue = UploadQueue::new(Arc::new(RecordingProcessor::default()), Duration::from_secs(3600));
        queue.enqueue(vec![upload("first.pdf")]);
        wait_until_idle(&queue).await;

        for _ in 0..100 {
            if !queue.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let ids = queue.enqueue(vec![upload("second.pdf")]);
        wait_until_idle(&queue).await;
        assert_eq!(queue.job(&ids[0]).unwrap().status, JobStatus::Completed);
        queue.shutdown();
    }

    #[tokio::test]
    async fn test_terminal_jobs_are_swept() {
        let queue = UploadQueue::new(Arc::new(RecordingProcessor::default()), Duration::from_millis(30));
        let ids = queue.enqueue(vec![upload("a.pdf")]);
        wait_until_idle(&queue).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(queue.job(&ids[0]).is_none());
        assert_eq!(queue.status().total, 0);
        assert_eq!(queue.pending_sweeps(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_sweeps() {
        let queue = UploadQueue::new(Arc::new(RecordingProcessor::default()), Duration::from_millis(100));
        let ids = queue.enqueue(vec![upload("a.pdf")]);
        wait_until_idle(&queue).await;
        assert_eq!(queue.pending_sweeps(), 1);

        queue.shutdown();
        assert_eq!(queue.pending_sweeps(), 0);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(queue.job(&ids[0]).is_some());
    }

    #[test]
    fn test_job_serializes_camel_case_without_payload() {
        let job = Job::new(upload("a.pdf"));
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["fileName"], "a.pdf");
        assert_eq!(value["status"], "pending");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("result").is_none());
        assert!(value.get("file").is_none());
    }
}
