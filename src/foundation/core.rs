use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Affine, Point, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas. Both sides must be non-zero and even (yuv420p output).
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "canvas {width}x{height} must have even sides (required for yuv420p output)"
            )));
        }
        Ok(Self { width, height })
    }

    /// `true` when either side is at most 854px; such outputs use the fast encoder preset.
    pub fn is_low_res(self) -> bool {
        self.width <= 854 || self.height <= 854
    }
}

/// Half-open time window `[start, end)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    /// Frame-time predicate used by `enable=` options.
    pub fn between_expr(self) -> String {
        format!("between(t,{},{})", fmt_num(self.start), fmt_num(self.end))
    }

    /// Full `enable='...'` option.
    pub fn enable_opt(self) -> String {
        format!("enable='{}'", self.between_expr())
    }
}

/// Format a number the way filter expressions expect it: no trailing zeros, at most four
/// decimals, integral values without a decimal point.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_owned();
    }
    let rounded = (v * 10_000.0).round() / 10_000.0;
    // Avoid "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let s = format!("{rounded:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
