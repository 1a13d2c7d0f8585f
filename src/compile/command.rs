use std::path::{Path, PathBuf};

use crate::compile::audio::AudioGraph;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::graph::chain::CompiledFragment;
use crate::graph::label::{StreamRef, resolve_placeholders};

/// Fixed encoder input order: base clip, then music, then narration, then overlay extras.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputLayout {
    pub music: Option<usize>,
    pub voice: Option<usize>,
}

impl InputLayout {
    pub fn new(has_music: bool, has_voice: bool) -> Self {
        let music = has_music.then_some(1);
        let voice = has_voice.then_some(1 + usize::from(has_music));
        Self { music, voice }
    }

    pub fn base(&self) -> StreamRef {
        StreamRef::video(0)
    }

    /// Music stream; only meaningful when music is present.
    pub fn music_ref(&self) -> StreamRef {
        StreamRef::audio(self.music.unwrap_or(1))
    }

    /// Narration stream; only meaningful when narration is present.
    pub fn voice_ref(&self) -> StreamRef {
        StreamRef::audio(self.voice.unwrap_or(1))
    }

    /// Index the first overlay extra input will get.
    pub fn first_extra(&self) -> usize {
        1 + usize::from(self.music.is_some()) + usize::from(self.voice.is_some())
    }
}

#[derive(Clone, Debug)]
pub struct InvocationRequest<'a> {
    pub base_clip: &'a Path,
    pub music: Option<&'a Path>,
    pub voice: Option<&'a Path>,
    pub effects: &'a CompiledFragment,
    pub overlays: &'a CompiledFragment,
    pub audio: &'a AudioGraph,
    pub canvas: Canvas,
    pub fps: u32,
    pub output: &'a Path,
}

/// The single encoder call a job ends with.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// Resolved `-filter_complex` value (empty when there is nothing to filter).
    pub filter_complex: String,
    pub video_map: String,
    pub audio_map: Option<String>,
    pub output: PathBuf,
}

/// Assemble the final argument list.
///
/// Overlay placeholders are resolved here, once, against the real input order. A fragment
/// compiled for a different `input_offset` is rejected rather than silently misnumbered.
pub fn build_invocation(req: &InvocationRequest<'_>) -> ReelResult<Invocation> {
    let layout = InputLayout::new(req.music.is_some(), req.voice.is_some());
    let first_extra = layout.first_extra();
    if !req.overlays.extra_inputs.is_empty() && req.overlays.input_offset != first_extra {
        return Err(ReelError::validation(format!(
            "overlay inputs were compiled for offset {} but attach at {first_extra}",
            req.overlays.input_offset
        )));
    }
    if !req.effects.extra_inputs.is_empty() {
        return Err(ReelError::validation(
            "effects fragment must not reference extra inputs",
        ));
    }

    let mut args: Vec<String> = vec!["-y".into(), "-i".into(), path_arg(req.base_clip)];
    for p in [req.music, req.voice].into_iter().flatten() {
        args.extend(["-i".into(), path_arg(p)]);
    }
    for p in &req.overlays.extra_inputs {
        args.extend(["-i".into(), path_arg(p)]);
    }

    let overlay_chain = resolve_placeholders(
        &req.overlays.chain,
        first_extra,
        req.overlays.extra_inputs.len(),
    )?;
    let filter_complex = [
        req.effects.chain.as_str(),
        overlay_chain.as_str(),
        req.audio.chain.as_deref().unwrap_or(""),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(";");

    let video_map = req.overlays.output.clone();
    if !filter_complex.is_empty() {
        args.extend(["-filter_complex".into(), filter_complex.clone()]);
    }
    args.extend(["-map".into(), map_target(&video_map)]);

    let audio_map = req.audio.map.clone();
    if let Some(map) = &audio_map {
        args.extend([
            "-map".into(),
            map.clone(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            "-shortest".into(),
        ]);
    }

    let (preset, crf) = if req.canvas.is_low_res() {
        ("ultrafast", "28")
    } else {
        ("veryfast", "26")
    };
    let fps = req.fps.to_string();
    args.extend(
        [
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-r",
            fps.as_str(),
            "-preset",
            preset,
            "-crf",
            crf,
        ]
        .map(String::from),
    );
    args.push(path_arg(req.output));

    Ok(Invocation {
        args,
        filter_complex,
        video_map,
        audio_map,
        output: req.output.to_path_buf(),
    })
}

/// Graph input pads map as bare specifiers (`0:v`), compiled labels keep their brackets.
fn map_target(label: &str) -> String {
    label
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|inner| is_input_pad(inner))
        .map(str::to_owned)
        .unwrap_or_else(|| label.to_owned())
}

fn is_input_pad(inner: &str) -> bool {
    inner
        .split_once(':')
        .is_some_and(|(idx, _)| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
}

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/compile/command.rs"]
mod tests;
