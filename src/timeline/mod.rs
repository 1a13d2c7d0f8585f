//! Base clip assembly: every timeline item is normalized into one concat directive file and
//! encoded once into `slides.mp4`, the `[0:v]` input of the final render.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::photo::prescale_photo;
use crate::foundation::core::fmt_num;
use crate::foundation::error::{ReelError, ReelResult};
use crate::graph::expr;
use crate::plan::{MediaItem, MediaKind, Plan};
use crate::services::encoder::Encoder;

pub const CONCAT_LIST_FILE: &str = "concat_list.txt";
pub const BASE_CLIP_FILE: &str = "slides.mp4";

/// One line group of the concat directive file.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    /// Display time; `None` for video clips, which play for their own length.
    pub duration: Option<f64>,
}

/// Render the concat directive file.
///
/// A trailing photo gets its `file` line repeated once more without a duration; the demuxer
/// ignores the last `duration` directive otherwise.
pub fn build_concat_list(entries: &[ConcatEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&file_line(&entry.path));
        if let Some(d) = entry.duration {
            out.push_str(&format!("duration {d:.3}\n"));
        }
    }
    if let Some(last) = entries.last()
        && last.duration.is_some()
    {
        out.push_str(&file_line(&last.path));
    }
    out
}

fn file_line(path: &Path) -> String {
    format!("file {}\n", expr::quote(&path.to_string_lossy()))
}

/// Arguments of the single concat encode.
pub fn concat_args(plan: &Plan) -> ReelResult<Vec<String>> {
    let canvas = plan.canvas()?;
    let fps = plan.fps.to_string();
    let vf = format!("{},setsar=1", expr::fit(plan.fit, canvas));
    Ok([
        "-y",
        "-r",
        fps.as_str(),
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
        CONCAT_LIST_FILE,
        "-vf",
        vf.as_str(),
        "-pix_fmt",
        "yuv420p",
        "-c:v",
        "libx264",
        "-r",
        fps.as_str(),
        BASE_CLIP_FILE,
    ]
    .map(String::from)
    .to_vec())
}

/// Stream-copy trim of a video item. `None` when the item has no trim window.
pub fn trim_args(item: &MediaItem, src: &Path, out: &Path) -> Option<Vec<String>> {
    if item.trim_start.is_none() && item.trim_end.is_none() {
        return None;
    }
    let mut args = vec!["-y".to_owned()];
    args.extend(["-ss".to_owned(), fmt_num(item.trim_start.unwrap_or(0.0))]);
    if let Some(end) = item.trim_end {
        args.extend(["-to".to_owned(), fmt_num(end)]);
    }
    args.extend([
        "-i".to_owned(),
        src.to_string_lossy().into_owned(),
        "-c".to_owned(),
        "copy".to_owned(),
        out.to_string_lossy().into_owned(),
    ]);
    Some(args)
}

/// Build `slides.mp4` inside `work_dir` and return its path.
///
/// All sources must already be local. A missing one aborts before the encoder runs.
#[tracing::instrument(skip_all, fields(items = plan.files.len()))]
pub async fn assemble_timeline(
    plan: &Plan,
    work_dir: &Path,
    encoder: &dyn Encoder,
) -> ReelResult<PathBuf> {
    let canvas = plan.canvas()?;
    let work_dir = std::path::absolute(work_dir)
        .with_context(|| format!("resolve work dir '{}'", work_dir.display()))?;
    tokio::fs::create_dir_all(&work_dir)
        .await
        .with_context(|| format!("create work dir '{}'", work_dir.display()))?;

    let mut sources = Vec::with_capacity(plan.files.len());
    for item in &plan.files {
        let src = std::path::absolute(&item.src)
            .with_context(|| format!("resolve source '{}'", item.src))?;
        if !src.is_file() {
            return Err(ReelError::asset(format!(
                "source for '{}' not found: {}",
                item.id, item.src
            )));
        }
        sources.push(src);
    }

    let mut entries = Vec::with_capacity(plan.files.len());
    for (item, src) in plan.files.iter().zip(sources) {
        let entry = match item.kind {
            MediaKind::Video => {
                let clip = work_dir.join(format!("{}_clip.mp4", item.id));
                let path = match trim_args(item, &src, &clip) {
                    Some(args) => {
                        encoder.run(&args, &work_dir).await?;
                        clip
                    }
                    None => src,
                };
                ConcatEntry {
                    path,
                    duration: None,
                }
            }
            MediaKind::Photo => {
                let prepared = work_dir.join(format!("{}_prepared.png", item.id));
                let path = {
                    let (from, to) = (src.clone(), prepared.clone());
                    match tokio::task::spawn_blocking(move || prescale_photo(&from, &to, canvas))
                        .await
                    {
                        Ok(Ok(_)) => prepared,
                        Ok(Err(e)) => {
                            tracing::warn!(id = %item.id, error = %e, "photo pre-scale failed, using source");
                            src
                        }
                        Err(e) => {
                            tracing::warn!(id = %item.id, error = %e, "photo pre-scale task failed, using source");
                            src
                        }
                    }
                };
                ConcatEntry {
                    path,
                    duration: Some(plan.photo_duration(item)),
                }
            }
        };
        entries.push(entry);
    }

    let list = build_concat_list(&entries);
    let list_path = work_dir.join(CONCAT_LIST_FILE);
    tokio::fs::write(&list_path, &list)
        .await
        .with_context(|| format!("write concat list '{}'", list_path.display()))?;
    tracing::debug!(list = %list, "concat list written");

    encoder.run(&concat_args(plan)?, &work_dir).await?;
    let out = work_dir.join(BASE_CLIP_FILE);
    tracing::info!(path = %out.display(), "base clip assembled");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/assemble.rs"]
mod tests;
