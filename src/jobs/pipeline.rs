//! One job, end to end: fetch → timeline → narration → transcription → compile → encode.
//!
//! Every stage boundary checks the cancellation flag. Downloaded assets are removed whatever the
//! outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use uuid::Uuid;

use crate::compile::{CompileInputs, compile_plan};
use crate::config::{RenderDefaults, ServiceConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::jobs::status::StatusBoard;
use crate::plan::{Narration, Plan};
use crate::services::{
    AssetFetcher, Encoder, FfmpegEncoder, HttpFetcher, HttpSynthesizer, Notifier, Synthesizer,
    Transcriber, WebhookNotifier, WhisperCli,
};
use crate::timeline::assemble_timeline;

/// External collaborators a job talks to.
#[derive(Clone)]
pub struct Services {
    pub encoder: Arc<dyn Encoder>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// Real adapters: system ffmpeg/whisper, HTTP for TTS, downloads and webhooks.
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self {
            encoder: Arc::new(FfmpegEncoder::default()),
            synthesizer: Arc::new(HttpSynthesizer::from_config(cfg)),
            transcriber: Arc::new(WhisperCli::default()),
            fetcher: Arc::new(HttpFetcher::default()),
            notifier: Arc::new(WebhookNotifier::default()),
        }
    }
}

/// Settings shared by every job of a queue.
#[derive(Clone, Debug)]
pub struct JobSettings {
    pub output_dir: PathBuf,
    pub defaults: RenderDefaults,
    pub shapes_enabled: bool,
}

impl JobSettings {
    pub fn from_config(cfg: &ServiceConfig) -> ReelResult<Self> {
        Ok(Self {
            output_dir: cfg.output_dir.clone(),
            defaults: cfg.render_defaults()?,
            shapes_enabled: cfg.shapes_enabled,
        })
    }

    pub fn work_dir(&self, id: Uuid) -> PathBuf {
        self.output_dir.join(format!("job_{id}"))
    }

    pub fn output_path(&self, id: Uuid, plan: &Plan) -> PathBuf {
        self.output_dir
            .join(format!("video_{id}.{}", plan.output_format.extension()))
    }
}

/// Per-run handle: identity, cancellation flag and the board progress is reported to.
#[derive(Clone, Debug)]
pub struct JobContext {
    pub id: Uuid,
    pub cancel: Arc<AtomicBool>,
    pub board: StatusBoard,
}

impl JobContext {
    fn checkpoint(&self) -> ReelResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(ReelError::Cancelled);
        }
        Ok(())
    }

    async fn stage(&self, progress: u8, message: &str) -> ReelResult<()> {
        self.checkpoint()?;
        tracing::info!(job = %self.id, progress, stage = message, "job stage");
        self.board
            .update(self.id, |s| s.advance(progress, message))
            .await;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobOutcome {
    pub output: PathBuf,
    pub subtitles: Option<PathBuf>,
}

/// Run every stage for `plan`. Downloads made on the way are deleted before returning.
#[tracing::instrument(skip_all, fields(job = %ctx.id))]
pub async fn run_job(
    ctx: &JobContext,
    plan: &Plan,
    settings: &JobSettings,
    services: &Services,
) -> ReelResult<JobOutcome> {
    let mut downloads = Vec::new();
    let result = run_stages(ctx, plan, settings, services, &mut downloads).await;
    remove_downloads(&downloads).await;
    result
}

async fn run_stages(
    ctx: &JobContext,
    plan: &Plan,
    settings: &JobSettings,
    services: &Services,
    downloads: &mut Vec<PathBuf>,
) -> ReelResult<JobOutcome> {
    let work_dir = absolute_path(&settings.work_dir(ctx.id))?;
    tokio::fs::create_dir_all(&work_dir)
        .await
        .with_context(|| format!("create work dir '{}'", work_dir.display()))?;

    ctx.stage(5, "fetching assets").await?;
    let plan = localize_plan(plan, &work_dir.join("downloads"), services, downloads).await?;

    ctx.stage(20, "assembling timeline").await?;
    let base_clip = assemble_timeline(&plan, &work_dir, services.encoder.as_ref()).await?;

    ctx.stage(40, "resolving narration").await?;
    let voice = resolve_narration(&plan, &work_dir, services).await?;

    let mut subtitles = None;
    if plan.transcribe
        && let Some(voice) = &voice
    {
        ctx.stage(55, "transcribing narration").await?;
        subtitles = Some(
            services
                .transcriber
                .transcribe(voice, &work_dir, &plan.whisper_model)
                .await?,
        );
    }

    ctx.stage(70, "compiling filter graph").await?;
    let total_duration = match plan.duration {
        Some(d) => d,
        None => probe_duration(&base_clip, &plan, services).await,
    };
    let music = plan.music.as_deref().filter(|_| plan.has_music()).map(Path::new);
    let output = absolute_path(&settings.output_path(ctx.id, &plan))?;
    let invocation = compile_plan(&CompileInputs {
        plan: &plan,
        work_dir: &work_dir,
        base_clip: &base_clip,
        music,
        voice: voice.as_deref(),
        subtitles: subtitles.as_deref().filter(|_| plan.burn_subtitles),
        total_duration,
        defaults: &settings.defaults,
        shapes_enabled: settings.shapes_enabled,
        output: &output,
    })?;

    ctx.stage(80, "encoding").await?;
    services.encoder.run(&invocation.args, &work_dir).await?;
    if let Err(e) = ctx.checkpoint() {
        discard_output(&invocation.output).await;
        return Err(e);
    }

    Ok(JobOutcome {
        output: invocation.output,
        subtitles,
    })
}

/// Per-job copy of the plan with every remote source replaced by a local download.
async fn localize_plan(
    plan: &Plan,
    dest: &Path,
    services: &Services,
    downloads: &mut Vec<PathBuf>,
) -> ReelResult<Plan> {
    let mut local = plan.clone();
    let fetcher = services.fetcher.as_ref();

    for item in &mut local.files {
        item.src = localize(fetcher, &item.src, dest, downloads).await?;
    }
    if local.has_music()
        && let Some(music) = &mut local.music
    {
        *music = localize(fetcher, music, dest, downloads).await?;
    }
    if let Some(Narration::File(file)) = &mut local.narration {
        match localize(fetcher, &file.path, dest, downloads).await {
            Ok(path) => file.path = path,
            Err(e) if file.required => return Err(e),
            Err(e) => tracing::warn!(error = %e, "optional narration file unavailable"),
        }
    }
    for overlay in &mut local.video_overlays {
        overlay.file = localize(fetcher, &overlay.file, dest, downloads).await?;
    }
    Ok(local)
}

async fn localize(
    fetcher: &dyn AssetFetcher,
    src: &str,
    dest: &Path,
    downloads: &mut Vec<PathBuf>,
) -> ReelResult<String> {
    let asset = fetcher.ensure_local(src, dest).await?;
    let path = absolute_path(&asset.path)?;
    if asset.downloaded {
        downloads.push(path.clone());
    }
    Ok(path.to_string_lossy().into_owned())
}

/// The encoder runs inside the job dir, so every path it sees must not depend on the caller's cwd.
fn absolute_path(path: &Path) -> ReelResult<PathBuf> {
    Ok(std::path::absolute(path).with_context(|| format!("resolve path '{}'", path.display()))?)
}

/// Narration audio, if any. Failures only abort the job when the narration is required.
async fn resolve_narration(
    plan: &Plan,
    work_dir: &Path,
    services: &Services,
) -> ReelResult<Option<PathBuf>> {
    let Some(narration) = &plan.narration else {
        return Ok(None);
    };
    let resolved = match narration {
        Narration::File(file) => {
            let path = PathBuf::from(&file.path);
            if path.is_file() {
                Ok(path)
            } else {
                Err(ReelError::asset(format!(
                    "narration file not found: {}",
                    file.path
                )))
            }
        }
        Narration::Tts(request) => services.synthesizer.synthesize(request, work_dir).await,
    };
    match resolved {
        Ok(path) => Ok(Some(path)),
        Err(e) if narration.is_required() => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "optional narration unavailable, continuing without it");
            Ok(None)
        }
    }
}

async fn probe_duration(base_clip: &Path, plan: &Plan, services: &Services) -> f64 {
    match services.encoder.probe(base_clip).await {
        Ok(info) => info
            .duration_secs()
            .unwrap_or_else(|| plan.estimated_duration()),
        Err(e) => {
            tracing::warn!(error = %e, "probe failed, using the estimated duration");
            plan.estimated_duration()
        }
    }
}

async fn discard_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "partial output removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot remove partial output"),
    }
}

async fn remove_downloads(downloads: &[PathBuf]) {
    for path in downloads {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "download removed"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot remove download"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jobs/pipeline.rs"]
mod tests;
