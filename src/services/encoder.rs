use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug, Default)]
pub struct EncoderOutput {
    pub stdout: String,
    pub stderr: String,
}

/// `ffprobe -show_streams -show_format` output, reduced to what the pipeline reads.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProbeInfo {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    #[serde(default)]
    pub format: ProbeFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
}

impl ProbeInfo {
    pub fn duration_secs(&self) -> Option<f64> {
        self.format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn has_stream(&self, kind: &str) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    }
}

/// Media encoder and prober. All compiled output feeds exactly one `run` per job.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run with `args` in `cwd`; a non-zero exit fails with stderr attached.
    async fn run(&self, args: &[String], cwd: &Path) -> ReelResult<EncoderOutput>;

    async fn probe(&self, path: &Path) -> ReelResult<ProbeInfo>;
}

/// System `ffmpeg` / `ffprobe` binaries.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run(&self, args: &[String], cwd: &Path) -> ReelResult<EncoderOutput> {
        tracing::debug!(?args, cwd = %cwd.display(), "running ffmpeg");
        let out = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error"])
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ReelError::external(format!("failed to run ffmpeg: {e}")))?;

        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
        if !out.status.success() {
            return Err(ReelError::external(format!(
                "ffmpeg exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        Ok(EncoderOutput { stdout, stderr })
    }

    async fn probe(&self, path: &Path) -> ReelResult<ProbeInfo> {
        let out = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ReelError::external(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(ReelError::external(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        serde_json::from_slice(&out.stdout)
            .map_err(|e| ReelError::external(format!("ffprobe json parse failed: {e}")))
    }
}
