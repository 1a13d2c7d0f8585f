use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::model::{TtsProvider, TtsRequest};

/// Speech synthesis. Writes one audio file into `out_dir` and returns its path.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &TtsRequest, out_dir: &Path) -> ReelResult<PathBuf>;
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct KokoroBody<'a> {
    pub text: &'a str,
    pub voice: &'a str,
    pub speed: f64,
    pub format: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct OpenAiSpeechBody<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub input: &'a str,
    pub response_format: &'a str,
    pub speed: f64,
}

/// Kokoro (plain JSON POST) and OpenAI-compatible `/audio/speech` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    kokoro_url: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: String,
}

impl HttpSynthesizer {
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            kokoro_url: cfg.kokoro_url.clone(),
            openai_api_key: cfg.openai_api_key.clone(),
            openai_base_url: cfg.openai_base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn request_for(&self, req: &TtsRequest) -> ReelResult<reqwest::RequestBuilder> {
        let format = req.format.extension();
        match req.provider {
            TtsProvider::Kokoro => {
                let endpoint = req
                    .endpoint
                    .as_deref()
                    .or(self.kokoro_url.as_deref())
                    .ok_or_else(|| {
                        ReelError::external(
                            "Kokoro TTS endpoint is not set (narration endpoint or KOKORO_TTS_URL)",
                        )
                    })?;
                Ok(self.client.post(endpoint).json(&KokoroBody {
                    text: &req.text,
                    voice: &req.voice,
                    speed: req.speed,
                    format,
                }))
            }
            TtsProvider::Openai => {
                let key = self
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| ReelError::external("OPENAI_API_KEY is not set"))?;
                let base = req
                    .endpoint
                    .as_deref()
                    .unwrap_or(&self.openai_base_url)
                    .trim_end_matches('/');
                Ok(self
                    .client
                    .post(format!("{base}/audio/speech"))
                    .bearer_auth(key)
                    .json(&OpenAiSpeechBody {
                        model: &req.model,
                        voice: &req.voice,
                        input: &req.text,
                        response_format: format,
                        speed: req.speed,
                    }))
            }
        }
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    #[tracing::instrument(skip_all, fields(provider = ?request.provider, chars = request.text.len()))]
    async fn synthesize(&self, request: &TtsRequest, out_dir: &Path) -> ReelResult<PathBuf> {
        let started = std::time::Instant::now();
        let resp = self
            .request_for(request)?
            .send()
            .await
            .map_err(|e| ReelError::external(format!("TTS request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReelError::external(format!(
                "TTS failed: {status} {}",
                body.trim()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ReelError::external(format!("TTS response read failed: {e}")))?;
        if bytes.is_empty() {
            return Err(ReelError::external("TTS returned empty audio data"));
        }

        let out = out_dir.join(format!("voice.{}", request.format.extension()));
        tokio::fs::write(&out, &bytes)
            .await
            .with_context(|| format!("write narration '{}'", out.display()))?;
        tracing::info!(
            path = %out.display(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "narration synthesized"
        );
        Ok(out)
    }
}
