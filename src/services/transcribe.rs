use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::foundation::error::{ReelError, ReelResult};

const WHISPER_MODELS: &[&str] = &[
    "tiny", "base", "small", "medium", "large", "large-v1", "large-v2", "large-v3",
];

/// Speech to SRT subtitles.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, out_dir: &Path, model: &str) -> ReelResult<PathBuf>;
}

/// Model name accepted by the whisper CLI; anything else becomes `base`.
pub fn normalize_model(model: &str) -> &str {
    if WHISPER_MODELS.contains(&model) {
        model
    } else {
        tracing::warn!(model, "unknown whisper model, using base");
        "base"
    }
}

/// Where the CLI writes its subtitles for `audio`: `<out_dir>/<stem>.srt`.
pub fn srt_path_for(audio: &Path, out_dir: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_owned());
    out_dir.join(format!("{stem}.srt"))
}

/// The `whisper` command-line tool (`openai-whisper`).
#[derive(Clone, Debug)]
pub struct WhisperCli {
    program: PathBuf,
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("whisper"),
        }
    }
}

impl WhisperCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    #[tracing::instrument(skip(self), fields(audio = %audio.display()))]
    async fn transcribe(&self, audio: &Path, out_dir: &Path, model: &str) -> ReelResult<PathBuf> {
        if !audio.exists() {
            return Err(ReelError::asset(format!(
                "audio file not found: {}",
                audio.display()
            )));
        }
        let model = normalize_model(model);
        let started = std::time::Instant::now();

        let out = Command::new(&self.program)
            .arg(audio)
            .args(["--model", model, "--output_format", "srt", "--output_dir"])
            .arg(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ReelError::external(format!("failed to run whisper: {e}")))?;
        if !out.status.success() {
            return Err(ReelError::external(format!(
                "whisper exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let srt = srt_path_for(audio, out_dir);
        if !srt.exists() {
            return Err(ReelError::external(format!(
                "whisper did not produce {}",
                srt.display()
            )));
        }
        tracing::info!(
            srt = %srt.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transcription finished"
        );
        Ok(srt)
    }
}
