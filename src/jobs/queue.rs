use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::{Semaphore, mpsc};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::jobs::pipeline::{JobContext, JobSettings, Services, run_job};
use crate::jobs::status::{JobStatus, StatusBoard};
use crate::plan::{Plan, validate};

struct QueuedJob {
    id: Uuid,
    plan: Plan,
    cancel: Arc<AtomicBool>,
}

/// Bounded worker pool over a FIFO of validated plans.
///
/// Must be created inside a tokio runtime; a dispatcher task admits jobs in submission order as
/// worker permits free up.
#[derive(Clone)]
pub struct JobQueue {
    board: StatusBoard,
    tx: mpsc::UnboundedSender<QueuedJob>,
}

impl JobQueue {
    pub fn new(settings: JobSettings, services: Services, workers: usize) -> Self {
        let board = StatusBoard::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(Dispatch {
            settings,
            services,
            board: board.clone(),
        });
        tokio::spawn(dispatch(rx, Arc::new(Semaphore::new(workers.max(1))), ctx));
        Self { board, tx }
    }

    pub fn from_config(cfg: &ServiceConfig) -> ReelResult<Self> {
        Ok(Self::new(
            JobSettings::from_config(cfg)?,
            Services::from_config(cfg),
            cfg.workers,
        ))
    }

    /// Validate and queue `plan`. Invalid plans never get an id.
    pub async fn enqueue(&self, plan: Plan) -> ReelResult<Uuid> {
        validate(&plan)?;
        let id = Uuid::new_v4();
        let cancel = self.board.insert(JobStatus::queued(id)).await;
        self.tx
            .send(QueuedJob { id, plan, cancel })
            .map_err(|_| ReelError::Other(anyhow::anyhow!("job queue is shut down")))?;
        tracing::info!(job = %id, "job queued");
        Ok(id)
    }

    pub async fn status(&self, id: Uuid) -> Option<JobStatus> {
        self.board.get(id).await
    }

    /// `true` when the job existed and was not yet terminal.
    pub async fn cancel(&self, id: Uuid) -> bool {
        let flagged = self.board.cancel(id).await;
        if flagged {
            tracing::info!(job = %id, "cancellation requested");
        }
        flagged
    }

    /// All known jobs, newest first.
    pub async fn list(&self) -> Vec<JobStatus> {
        self.board.list().await
    }

    /// Resolves once the job is `done` or `error`.
    pub async fn wait(&self, id: Uuid) -> Option<JobStatus> {
        self.board.wait_terminal(id).await
    }
}

struct Dispatch {
    settings: JobSettings,
    services: Services,
    board: StatusBoard,
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<QueuedJob>,
    permits: Arc<Semaphore>,
    ctx: Arc<Dispatch>,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let ctx = ctx.clone();
        tokio::spawn(async move {
            execute(job, &ctx).await;
            drop(permit);
        });
    }
}

async fn execute(job: QueuedJob, d: &Dispatch) {
    let QueuedJob { id, plan, cancel } = job;
    if d.board
        .get(id)
        .await
        .is_none_or(|s| s.state.is_terminal())
    {
        tracing::debug!(job = %id, "skipping job cancelled while queued");
        return;
    }

    let ctx = JobContext {
        id,
        cancel,
        board: d.board.clone(),
    };
    let result = run_job(&ctx, &plan, &d.settings, &d.services).await;
    let cancelled = matches!(&result, Err(e) if e.is_cancelled());
    match &result {
        Ok(outcome) => {
            tracing::info!(job = %id, output = %outcome.output.display(), "job done");
            d.board
                .update(id, |s| {
                    s.finish(outcome.output.clone(), outcome.subtitles.clone())
                })
                .await;
        }
        Err(e) => {
            if cancelled {
                tracing::info!(job = %id, "job cancelled");
            } else {
                tracing::error!(job = %id, error = %e, "job failed");
            }
            d.board.update(id, |s| s.fail(e)).await;
        }
    }

    if !cancelled
        && let Some(url) = &plan.webhook
        && let Some(status) = d.board.get(id).await
    {
        match serde_json::to_value(&status) {
            Ok(payload) => d.services.notifier.notify(url, &payload).await,
            Err(e) => tracing::warn!(job = %id, error = %e, "cannot serialize webhook payload"),
        }
    }
}
