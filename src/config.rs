//! Runtime configuration.
//!
//! Two layers:
//!
//! - [`RenderDefaults`]: look-and-feel defaults for overlays, subtitles and shapes. Loaded from a
//!   `defaults.json` file when one is present, otherwise the built-in values are used.
//! - [`ServiceConfig`]: process-level settings read from the environment (output directory,
//!   worker count, TTS endpoints).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

const DEFAULT_FONT_FILE: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderDefaults {
    /// Fraction of the canvas height kept clear at the top and bottom edges.
    pub safe_area_pct: f64,
    pub font_file: PathBuf,
    pub overlay_top: TextStyleDefaults,
    pub overlay_bottom: TextStyleDefaults,
    pub subtitles: SubtitleStyleDefaults,
    pub shapes: ShapeDefaults,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            safe_area_pct: 0.05,
            font_file: PathBuf::from(DEFAULT_FONT_FILE),
            overlay_top: TextStyleDefaults {
                size: 48,
                color: "#FFFFFF".to_owned(),
                background: "rgba(0,0,0,0.8)".to_owned(),
                outline_width: 3,
                box_border: 2,
                uppercase: true,
            },
            overlay_bottom: TextStyleDefaults {
                size: 36,
                color: "#FFFFFF".to_owned(),
                background: "rgba(0,0,0,0.8)".to_owned(),
                outline_width: 3,
                box_border: 2,
                uppercase: false,
            },
            subtitles: SubtitleStyleDefaults::default(),
            shapes: ShapeDefaults::default(),
        }
    }
}

impl RenderDefaults {
    /// Load defaults from `path`, falling back to the built-in set when the file is absent.
    ///
    /// A file that exists but does not parse is an error: silently ignoring a broken defaults
    /// file would change every render.
    pub fn load(path: Option<&Path>) -> ReelResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "defaults file not found, using built-ins");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReelError::validation(format!("read defaults '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ReelError::validation(format!("parse defaults '{}': {e}", path.display()))
        })
    }

    /// Safe-area fraction clamped to `[0, 0.15]`.
    pub fn safe_area(&self) -> f64 {
        if self.safe_area_pct.is_finite() {
            self.safe_area_pct.clamp(0.0, 0.15)
        } else {
            0.05
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleDefaults {
    pub size: u32,
    pub color: String,
    pub background: String,
    pub outline_width: u32,
    pub box_border: u32,
    /// Upper-case text unless the overlay asks for another transform.
    pub uppercase: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleStyleDefaults {
    pub font: String,
    pub size: u32,
    pub color: String,
    pub background: String,
    pub outline_width: u32,
    pub outline_color: String,
    pub margin_v: u32,
}

impl Default for SubtitleStyleDefaults {
    fn default() -> Self {
        Self {
            font: "DejaVu Sans".to_owned(),
            size: 28,
            color: "#FFFFFF".to_owned(),
            background: "rgba(0,0,0,0.55)".to_owned(),
            outline_width: 2,
            outline_color: "#000000".to_owned(),
            margin_v: 54,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeDefaults {
    pub rect_color: String,
    pub rect_fill_opacity: f64,
    pub circle_color: String,
    pub circle_radius: u32,
    pub arrow_color: String,
    pub arrow_head_size: u32,
    pub thickness: u32,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        Self {
            rect_color: "#FF4D4F".to_owned(),
            rect_fill_opacity: 0.15,
            circle_color: "#4D9EFF".to_owned(),
            circle_radius: 56,
            arrow_color: "#FFD400".to_owned(),
            arrow_head_size: 18,
            thickness: 6,
        }
    }
}

/// Process-level configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Root for per-job work directories and rendered outputs.
    pub output_dir: PathBuf,
    /// Maximum number of jobs rendering at once.
    pub workers: usize,
    /// Compile shape overlays (`rect`/`circle`/`arrow`).
    pub shapes_enabled: bool,
    pub font_file: Option<PathBuf>,
    pub defaults_file: Option<PathBuf>,
    pub kokoro_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            workers: 3,
            shapes_enabled: true,
            font_file: None,
            defaults_file: None,
            kokoro_url: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_owned(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(base.output_dir),
            workers: std::env::var("REELSMITH_WORKERS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(base.workers),
            shapes_enabled: std::env::var("REELSMITH_SHAPES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(base.shapes_enabled),
            font_file: std::env::var("FONT_FILE").ok().map(PathBuf::from),
            defaults_file: std::env::var("REELSMITH_DEFAULTS").ok().map(PathBuf::from),
            kokoro_url: std::env::var("KOKORO_TTS_URL").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_owned())
                .unwrap_or(base.openai_base_url),
        }
    }

    /// Render defaults with the `FONT_FILE` override applied.
    pub fn render_defaults(&self) -> ReelResult<RenderDefaults> {
        let mut defaults = RenderDefaults::load(self.defaults_file.as_deref())?;
        if let Some(font) = &self.font_file {
            defaults.font_file = font.clone();
        }
        Ok(defaults)
    }
}
