//! Background worker draining the upload queue

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::error::Error;

use super::job_queue::UploadQueue;

/// Single worker loop; at most one runs per queue
pub(super) struct QueueWorker {
    queue: Arc<UploadQueue>,
}

impl QueueWorker {
    pub(super) fn new(queue: Arc<UploadQueue>) -> Self {
        Self { queue }
    }

    /// Process pending jobs in enqueue order until none remain
    pub(super) async fn run(self) {
        let queue = self.queue;

        loop {
            let Some((job_id, file)) = queue.claim_next() else {
                queue.running.store(false, Ordering::SeqCst);

                // An enqueue may have landed between the claim and the store
                if queue.has_pending()
                    && queue
                        .running
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                {
                    continue;
                }

                tracing::debug!("Upload queue drained, worker stopping");
                break;
            };

            tracing::info!("Processing job {} ('{}')", job_id, file.file_name);

            // Run on its own task so a panic fails the job instead of the worker
            let processor = Arc::clone(&queue.processor);
            let outcome = match tokio::spawn(async move { processor.process(&file).await }).await {
                Ok(outcome) => outcome,
                Err(e) => Err(Error::internal(format!("Job task failed: {}", e))),
            };

            queue.finish(&job_id, outcome);
        }
    }
}
