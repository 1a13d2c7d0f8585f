//! Job orchestration: a bounded queue, per-job pipelines, and the shared status table.

pub mod pipeline;
pub mod queue;
pub mod status;

pub use pipeline::{JobContext, JobOutcome, JobSettings, Services, run_job};
pub use queue::JobQueue;
pub use status::{JobState, JobStatus, StatusBoard};
