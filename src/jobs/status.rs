use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use crate::foundation::error::ReelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Externally visible record of one job. Terminal records are kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub id: Uuid,
    pub state: JobState,
    /// 0..=100.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    pub fn queued(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Queued,
            progress: 0,
            message: None,
            output: None,
            subtitles: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `running` at `progress` with a stage message. Ignored once terminal.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Running;
        self.progress = progress.min(100).max(self.progress);
        self.message = Some(message.into());
        self.updated_at = Utc::now();
    }

    pub fn finish(&mut self, output: PathBuf, subtitles: Option<PathBuf>) {
        self.state = JobState::Done;
        self.progress = 100;
        self.message = Some("done".to_owned());
        self.output = Some(output);
        self.subtitles = subtitles;
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, err: &ReelError) {
        self.state = JobState::Error;
        self.message = Some(
            if err.is_cancelled() {
                "cancelled"
            } else {
                "failed"
            }
            .to_owned(),
        );
        self.error = Some(err.to_string());
        self.updated_at = Utc::now();
    }
}

#[derive(Debug)]
struct Tracked {
    status: JobStatus,
    cancel: Arc<AtomicBool>,
}

/// Shared job table. Written by the orchestrator, read by status queries.
#[derive(Clone, Debug, Default)]
pub struct StatusBoard {
    jobs: Arc<RwLock<HashMap<Uuid, Tracked>>>,
    changed: Arc<Notify>,
}

impl StatusBoard {
    /// Register a queued job and return its cancellation flag.
    pub async fn insert(&self, status: JobStatus) -> Arc<AtomicBool> {
        let cancel = Arc::new(AtomicBool::new(false));
        self.jobs.write().await.insert(
            status.id,
            Tracked {
                status,
                cancel: cancel.clone(),
            },
        );
        self.changed.notify_waiters();
        cancel
    }

    pub async fn get(&self, id: Uuid) -> Option<JobStatus> {
        self.jobs.read().await.get(&id).map(|t| t.status.clone())
    }

    /// Apply `f` to the job's record; no-op for unknown ids.
    pub async fn update(&self, id: Uuid, f: impl FnOnce(&mut JobStatus)) {
        if let Some(t) = self.jobs.write().await.get_mut(&id) {
            f(&mut t.status);
        }
        self.changed.notify_waiters();
    }

    /// Newest first.
    pub async fn list(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> = self
            .jobs
            .read()
            .await
            .values()
            .map(|t| t.status.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Flag a job for cancellation. A job still waiting for a worker ends immediately.
    ///
    /// Returns `false` for unknown or already terminal jobs.
    pub async fn cancel(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(t) = jobs.get_mut(&id) else {
            return false;
        };
        if t.status.state.is_terminal() {
            return false;
        }
        t.cancel.store(true, Ordering::SeqCst);
        if t.status.state == JobState::Queued {
            t.status.fail(&ReelError::Cancelled);
        }
        drop(jobs);
        self.changed.notify_waiters();
        true
    }

    /// Wait until the job reaches `done` or `error`. `None` for unknown ids.
    pub async fn wait_terminal(&self, id: Uuid) -> Option<JobStatus> {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();
            let status = self.get(id).await?;
            if status.state.is_terminal() {
                return Some(status);
            }
            notified.await;
        }
    }
}
