use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;

/// Declarative description of one render job.
///
/// Parsed from camelCase JSON. Unknown `target` / `kind` / `source` tags fail to parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plan {
    pub files: Vec<MediaItem>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_per_photo: f64,
    pub output_format: OutputFormat,
    pub fit: FitMode,
    pub music: Option<String>,
    pub music_volume_db: f64,
    pub ducking: Ducking,
    pub narration: Option<Narration>,
    pub transcribe: bool,
    pub whisper_model: String,
    pub burn_subtitles: bool,
    pub subtitle_style: Option<SubtitleStyle>,
    pub overlays: Vec<Overlay>,
    pub effects: Vec<Effect>,
    pub video_overlays: Vec<VideoOverlay>,
    /// Explicit total duration in seconds; otherwise estimated from the timeline.
    pub duration: Option<f64>,
    pub webhook: Option<String>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            width: 1080,
            height: 1920,
            fps: 30,
            duration_per_photo: 2.0,
            output_format: OutputFormat::Mp4,
            fit: FitMode::Letterbox,
            music: None,
            music_volume_db: -6.0,
            ducking: Ducking::default(),
            narration: None,
            transcribe: false,
            whisper_model: "base".to_owned(),
            burn_subtitles: false,
            subtitle_style: None,
            overlays: Vec::new(),
            effects: Vec::new(),
            video_overlays: Vec::new(),
            duration: None,
            webhook: None,
        }
    }
}

impl Plan {
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_value(v: serde_json::Value) -> ReelResult<Self> {
        Ok(serde_json::from_value(v)?)
    }

    pub fn canvas(&self) -> ReelResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Display seconds of a photo item (`duration` or the plan default).
    pub fn photo_duration(&self, item: &MediaItem) -> f64 {
        item.duration.unwrap_or(self.duration_per_photo)
    }

    /// Total length implied by the timeline: photo durations plus trimmed video spans.
    ///
    /// Videos without an explicit trim window contribute their `duration` when given and nothing
    /// otherwise; the orchestrator prefers the probed length of the assembled clip.
    pub fn estimated_duration(&self) -> f64 {
        if let Some(d) = self.duration {
            return d;
        }
        self.files
            .iter()
            .map(|item| match item.kind {
                MediaKind::Photo => self.photo_duration(item),
                MediaKind::Video => match (item.trim_start, item.trim_end) {
                    (start, Some(end)) => (end - start.unwrap_or(0.0)).max(0.0),
                    _ => item.duration.unwrap_or(0.0),
                },
            })
            .sum()
    }

    pub fn has_music(&self) -> bool {
        self.music.as_deref().is_some_and(|m| !m.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    /// Local path or `http(s)` URL.
    pub src: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default, alias = "durationSec")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub trim_start: Option<f64>,
    #[serde(default)]
    pub trim_end: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Photo,
    Video,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Mov,
    Mkv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
        }
    }
}

/// How sources are fitted into the output box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale down to fit and pad the rest.
    #[default]
    Letterbox,
    /// Scale up to cover and crop the overflow.
    Crop,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ducking {
    pub enabled: bool,
    pub threshold: f64,
    pub ratio: f64,
    /// Milliseconds.
    pub attack: f64,
    /// Milliseconds.
    pub release: f64,
    /// Makeup gain applied by the sidechain compressor.
    pub music_duck_db: f64,
}

impl Default for Ducking {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.05,
            ratio: 8.0,
            attack: 5.0,
            release: 250.0,
            music_duck_db: 8.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Narration {
    File(NarrationFile),
    Tts(TtsRequest),
}

impl Narration {
    pub fn is_required(&self) -> bool {
        match self {
            Self::File(f) => f.required,
            Self::Tts(t) => t.required,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationFile {
    pub path: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsRequest {
    pub provider: TtsProvider,
    pub voice: String,
    pub text: String,
    pub format: AudioFormat,
    pub model: String,
    pub speed: f64,
    /// Overrides the provider's configured endpoint.
    pub endpoint: Option<String>,
    pub required: bool,
}

impl Default for TtsRequest {
    fn default() -> Self {
        Self {
            provider: TtsProvider::Kokoro,
            voice: "alloy".to_owned(),
            text: String::new(),
            format: AudioFormat::Mp3,
            model: "gpt-4o-mini-tts".to_owned(),
            speed: 1.0,
            endpoint: None,
            required: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    Kokoro,
    Openai,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleStyle {
    pub font: Option<String>,
    pub size: Option<u32>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub outline: Option<SubtitleOutline>,
    pub alignment: Option<SubtitleAlignment>,
    pub margin_v: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleOutline {
    pub enabled: Option<bool>,
    pub width: Option<u32>,
    pub color: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleAlignment {
    Top,
    #[default]
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A time-windowed overlay, tagged by `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum Overlay {
    Top(TextOverlay),
    Bottom(TextOverlay),
    Custom(TextOverlay),
    Rect(ShapeOverlay<RectShape>),
    Circle(ShapeOverlay<CircleShape>),
    Arrow(ShapeOverlay<ArrowShape>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Top,
    Bottom,
    Custom,
}

#[derive(Clone, Copy, Debug)]
pub enum ShapeVariant<'a> {
    Rect(&'a ShapeOverlay<RectShape>),
    Circle(&'a ShapeOverlay<CircleShape>),
    Arrow(&'a ShapeOverlay<ArrowShape>),
}

/// Two-family view of [`Overlay`] for stage dispatch.
#[derive(Clone, Copy, Debug)]
pub enum OverlayVariant<'a> {
    Text(TextAnchor, &'a TextOverlay),
    Shape(ShapeVariant<'a>),
}

impl Overlay {
    pub const TEXT_DEFAULT_SECS: f64 = 5.0;
    pub const SHAPE_DEFAULT_SECS: f64 = 3.0;

    pub fn variant(&self) -> OverlayVariant<'_> {
        match self {
            Self::Top(t) => OverlayVariant::Text(TextAnchor::Top, t),
            Self::Bottom(t) => OverlayVariant::Text(TextAnchor::Bottom, t),
            Self::Custom(t) => OverlayVariant::Text(TextAnchor::Custom, t),
            Self::Rect(s) => OverlayVariant::Shape(ShapeVariant::Rect(s)),
            Self::Circle(s) => OverlayVariant::Shape(ShapeVariant::Circle(s)),
            Self::Arrow(s) => OverlayVariant::Shape(ShapeVariant::Arrow(s)),
        }
    }

    /// `(start, end)` with the per-family default end applied.
    pub fn window(&self) -> (f64, f64) {
        let (start, end, fallback) = match self {
            Self::Top(t) | Self::Bottom(t) | Self::Custom(t) => {
                (t.start, t.end, Self::TEXT_DEFAULT_SECS)
            }
            Self::Rect(s) => (s.start, s.end, Self::SHAPE_DEFAULT_SECS),
            Self::Circle(s) => (s.start, s.end, Self::SHAPE_DEFAULT_SECS),
            Self::Arrow(s) => (s.start, s.end, Self::SHAPE_DEFAULT_SECS),
        };
        (start, end.unwrap_or(start + fallback))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOverlay {
    pub text: String,
    #[serde(alias = "startSec")]
    pub start: f64,
    #[serde(alias = "endSec")]
    pub end: Option<f64>,
    pub position: Option<Position>,
    pub style: Option<TextStyle>,
    pub animation: Option<TextAnimation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    /// Font file overriding the configured one.
    pub font: Option<String>,
    pub size: Option<u32>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub outline_width: Option<u32>,
    pub box_border: Option<u32>,
    pub text_transform: Option<TextTransform>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Uppercase,
    Lowercase,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnimation {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    #[serde(default)]
    pub words_per_second: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Typewriter,
    Fade,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeOverlay<S> {
    /// Geometry; `rect` and `circle` fall back to built-in sizes when absent.
    pub shape: Option<S>,
    #[serde(default, alias = "startSec")]
    pub start: f64,
    #[serde(default, alias = "endSec")]
    pub end: Option<f64>,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RectShape {
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub color: Option<String>,
    pub thickness: Option<f64>,
    pub fill_opacity: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircleShape {
    pub radius: Option<u32>,
    pub color: Option<String>,
    pub thickness: Option<f64>,
    pub fill_opacity: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowShape {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub head_size: Option<f64>,
}

/// Whole-frame transform, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Effect {
    Zoom(ZoomEffect),
    Vhs(VhsEffect),
    Retro(RetroEffect),
    Custom(CustomEffect),
}

impl Effect {
    /// `(start, end)` with `end` defaulting to `total`.
    pub fn window(&self, total: f64) -> (f64, f64) {
        let (start, end) = match self {
            Self::Zoom(e) => (e.start, e.end),
            Self::Vhs(e) => (e.start, e.end),
            Self::Retro(e) => (e.start, e.end),
            Self::Custom(e) => (e.start, e.end),
        };
        (start, end.unwrap_or(total))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomEffect {
    #[serde(alias = "startSec")]
    pub start: f64,
    #[serde(alias = "endSec")]
    pub end: Option<f64>,
    pub start_scale: f64,
    pub end_scale: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Default for ZoomEffect {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: None,
            start_scale: 1.0,
            end_scale: 1.2,
            cx: 0.5,
            cy: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VhsEffect {
    #[serde(alias = "startSec")]
    pub start: f64,
    #[serde(alias = "endSec")]
    pub end: Option<f64>,
    pub noise: f64,
    pub chroma: f64,
    pub contrast: f64,
    pub saturation: f64,
}

impl Default for VhsEffect {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: None,
            noise: 20.0,
            chroma: 2.0,
            contrast: 1.05,
            saturation: 1.15,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetroEffect {
    #[serde(alias = "startSec")]
    pub start: f64,
    #[serde(alias = "endSec")]
    pub end: Option<f64>,
    /// Vignette angle in radians.
    pub vignette: f64,
    pub grain: f64,
    pub saturation: f64,
    pub contrast: f64,
    pub gamma: f64,
}

impl Default for RetroEffect {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: None,
            vignette: std::f64::consts::PI / 5.0,
            grain: 5.0,
            saturation: 0.95,
            contrast: 1.05,
            gamma: 0.98,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEffect {
    #[serde(default, alias = "startSec")]
    pub start: f64,
    #[serde(default, alias = "endSec")]
    pub end: Option<f64>,
    /// Single filter expression, no graph syntax.
    pub filter: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOverlay {
    pub file: String,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl VideoOverlay {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "m4v"];

    pub fn has_supported_extension(&self) -> bool {
        Path::new(&self.file)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                Self::SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(e))
            })
    }
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Overlay,
    Screen,
    Multiply,
    Softlight,
    Hardlight,
    Lighten,
    Darken,
    Difference,
    Exclusion,
    ColorDodge,
    ColorBurn,
}

impl BlendMode {
    /// Composited positionally with `overlay=x:y` instead of a pixel blend.
    pub fn is_positional(self) -> bool {
        matches!(self, Self::Normal | Self::Overlay)
    }

    /// `all_mode` value understood by the `blend` filter.
    pub fn engine_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Overlay => "overlay",
            Self::Screen => "screen",
            Self::Multiply => "multiply",
            Self::Softlight => "softlight",
            Self::Hardlight => "hardlight",
            Self::Lighten => "lighten",
            Self::Darken => "darken",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::ColorDodge => "colordodge",
            Self::ColorBurn => "colorburn",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/model.rs"]
mod tests;
