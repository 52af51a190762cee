//! Background processing of batch uploads

mod job_queue;
mod worker;

pub use job_queue::{Job, JobProcessor, JobStatus, QueueStatus, UploadQueue};
