use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Hard cap on a single downloaded asset.
pub const MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// A source resolved to a file on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalAsset {
    pub path: PathBuf,
    /// `true` when the file was fetched for this job and must be removed afterwards.
    pub downloaded: bool,
}

/// Turns a plan source (local path or URL) into a local file.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn ensure_local(&self, src: &str, dest_dir: &Path) -> ReelResult<LocalAsset>;
}

/// `http://` or `https://` source.
pub fn is_remote(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// File name for a download: random stem, extension kept from the URL path when it has one.
pub fn download_file_name(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or("");
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.bytes().all(|b| b.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    let stem = uuid::Uuid::new_v4().simple().to_string();
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            max_bytes: MAX_DOWNLOAD_BYTES,
        }
    }
}

impl HttpFetcher {
    pub fn with_limit(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> ReelResult<PathBuf> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReelError::external(format!("download '{url}': {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReelError::external(format!("download '{url}': HTTP {status}")));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(ReelError::external(format!(
                "download '{url}': {len} bytes exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("create download dir '{}'", dest_dir.display()))?;
        let out = dest_dir.join(download_file_name(url));
        let mut file = tokio::fs::File::create(&out)
            .await
            .with_context(|| format!("create '{}'", out.display()))?;

        let mut written: u64 = 0;
        loop {
            let chunk = match resp.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&out).await;
                    return Err(ReelError::external(format!("download '{url}': {e}")));
                }
            };
            written += chunk.len() as u64;
            if written > self.max_bytes {
                drop(file);
                let _ = tokio::fs::remove_file(&out).await;
                return Err(ReelError::external(format!(
                    "download '{url}': body exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
            file.write_all(&chunk)
                .await
                .with_context(|| format!("write '{}'", out.display()))?;
        }
        file.flush()
            .await
            .with_context(|| format!("flush '{}'", out.display()))?;

        tracing::info!(url, path = %out.display(), bytes = written, "asset downloaded");
        Ok(out)
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn ensure_local(&self, src: &str, dest_dir: &Path) -> ReelResult<LocalAsset> {
        if is_remote(src) {
            let path = self.download(src.trim(), dest_dir).await?;
            return Ok(LocalAsset {
                path,
                downloaded: true,
            });
        }
        let path = PathBuf::from(src);
        if !path.exists() {
            return Err(ReelError::asset(format!("file not found: {src}")));
        }
        Ok(LocalAsset {
            path,
            downloaded: false,
        })
    }
}
