//! Storyboard input: a looser, author-facing document converted into a [`Plan`].

use std::path::Path;

use serde::Deserialize;

use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::model::{
    AudioFormat, Ducking, Effect, MediaItem, MediaKind, Narration, OutputFormat, Overlay, Plan,
    SubtitleStyle, TtsProvider, TtsRequest,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storyboard {
    #[serde(default)]
    pub canvas: Option<StoryCanvas>,
    pub timeline: Vec<TimelineItem>,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub tts: Option<StoryTts>,
    #[serde(default)]
    pub tts_text: Option<String>,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    #[serde(default)]
    pub subtitle_style: Option<SubtitleStyle>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryCanvas {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    #[serde(default)]
    pub id: Option<String>,
    pub src: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub trim_start: Option<f64>,
    #[serde(default)]
    pub trim_end: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryTtsProvider {
    Kokoro,
    Openai,
    #[default]
    None,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryTts {
    pub provider: StoryTtsProvider,
    pub endpoint: Option<String>,
    pub voice: Option<String>,
    pub model: Option<String>,
    pub format: Option<AudioFormat>,
    pub speed: Option<f64>,
}

impl Storyboard {
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Convert into a plan: 2s photos, mp4 output, ducking on, narration from `tts` + `ttsText`.
    ///
    /// Local sources are made absolute against the current directory; URLs pass through.
    pub fn into_plan(self) -> ReelResult<Plan> {
        if self.timeline.is_empty() {
            return Err(ReelError::validation(
                "storyboard must contain at least one timeline item",
            ));
        }
        let base = Plan::default();
        let canvas = self.canvas.unwrap_or_default();

        let files = self
            .timeline
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                Ok(MediaItem {
                    id: t.id.unwrap_or_else(|| format!("it{i}")),
                    src: absolutize(&t.src)?,
                    kind: t.kind,
                    duration: t.duration_sec,
                    trim_start: t.trim_start,
                    trim_end: t.trim_end,
                })
            })
            .collect::<ReelResult<Vec<_>>>()?;

        let narration = match (self.tts, self.tts_text) {
            (Some(tts), Some(text)) if !text.trim().is_empty() => {
                narration_from(tts, text)
            }
            _ => None,
        };

        Ok(Plan {
            files,
            width: canvas.width.unwrap_or(base.width),
            height: canvas.height.unwrap_or(base.height),
            fps: canvas.fps.unwrap_or(base.fps),
            duration_per_photo: 2.0,
            output_format: OutputFormat::Mp4,
            music: self.music,
            music_volume_db: -6.0,
            ducking: Ducking {
                enabled: true,
                ..Ducking::default()
            },
            narration,
            overlays: self.overlays,
            subtitle_style: self.subtitle_style,
            effects: self.effects,
            ..base
        })
    }
}

fn narration_from(tts: StoryTts, text: String) -> Option<Narration> {
    let provider = match tts.provider {
        StoryTtsProvider::Kokoro => TtsProvider::Kokoro,
        StoryTtsProvider::Openai => TtsProvider::Openai,
        StoryTtsProvider::None => return None,
    };
    let defaults = TtsRequest::default();
    Some(Narration::Tts(TtsRequest {
        provider,
        voice: tts.voice.unwrap_or(defaults.voice),
        text,
        format: tts.format.unwrap_or(defaults.format),
        model: tts.model.unwrap_or(defaults.model),
        speed: tts.speed.unwrap_or(defaults.speed),
        endpoint: tts.endpoint,
        required: false,
    }))
}

fn absolutize(src: &str) -> ReelResult<String> {
    if crate::services::fetch::is_remote(src) {
        return Ok(src.to_owned());
    }
    let abs = std::path::absolute(Path::new(src))
        .map_err(|e| ReelError::validation(format!("resolve timeline src '{src}': {e}")))?;
    Ok(abs.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/storyboard.rs"]
mod tests;
