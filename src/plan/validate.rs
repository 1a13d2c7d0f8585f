use std::collections::HashSet;

use crate::foundation::error::{ReelError, ReelResult};
use crate::plan::model::{MediaKind, Narration, Overlay, OverlayVariant, Plan, ShapeVariant};

/// Reject malformed plans before a job exists.
///
/// Checks structural invariants only; file existence is checked by the stages that read them.
pub fn validate(plan: &Plan) -> ReelResult<()> {
    if plan.files.is_empty() {
        return Err(ReelError::validation(
            "plan must contain at least one media item",
        ));
    }
    plan.canvas()?;
    if plan.fps == 0 {
        return Err(ReelError::validation("fps must be positive"));
    }
    if !(plan.duration_per_photo.is_finite() && plan.duration_per_photo > 0.0) {
        return Err(ReelError::validation("durationPerPhoto must be positive"));
    }
    if !plan.music_volume_db.is_finite() {
        return Err(ReelError::validation("musicVolumeDb must be finite"));
    }
    if let Some(d) = plan.duration
        && !(d.is_finite() && d > 0.0)
    {
        return Err(ReelError::validation("duration must be positive"));
    }

    let mut ids = HashSet::new();
    for item in &plan.files {
        let id = item.id.trim();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(ReelError::validation(format!(
                "media item id '{}' must be a non-empty file-name-safe string",
                item.id
            )));
        }
        if !ids.insert(id) {
            return Err(ReelError::validation(format!(
                "duplicate media item id '{id}'"
            )));
        }
        if item.src.trim().is_empty() {
            return Err(ReelError::validation(format!(
                "media item '{id}' has an empty src"
            )));
        }
        match item.kind {
            MediaKind::Photo => {
                if let Some(d) = item.duration
                    && !(d.is_finite() && d > 0.0)
                {
                    return Err(ReelError::validation(format!(
                        "photo '{id}' duration must be positive"
                    )));
                }
            }
            MediaKind::Video => {
                let start = item.trim_start.unwrap_or(0.0);
                if start < 0.0 {
                    return Err(ReelError::validation(format!(
                        "video '{id}' trimStart must not be negative"
                    )));
                }
                if let Some(end) = item.trim_end
                    && end <= start
                {
                    return Err(ReelError::validation(format!(
                        "video '{id}' trimEnd must be after trimStart"
                    )));
                }
            }
        }
    }

    if let Some(n) = &plan.narration {
        match n {
            Narration::File(f) if f.path.trim().is_empty() => {
                return Err(ReelError::validation("narration file path is empty"));
            }
            Narration::Tts(t) if t.text.trim().is_empty() => {
                return Err(ReelError::validation("narration TTS text is empty"));
            }
            Narration::Tts(t) if !(t.speed.is_finite() && t.speed > 0.0) => {
                return Err(ReelError::validation("narration TTS speed must be positive"));
            }
            _ => {}
        }
    }

    for (i, overlay) in plan.overlays.iter().enumerate() {
        validate_overlay(i, overlay)?;
    }

    for (i, effect) in plan.effects.iter().enumerate() {
        // Open-ended windows are checked at compile time against the real duration.
        let (start, end) = effect.window(f64::INFINITY);
        if start < 0.0 || start >= end {
            return Err(ReelError::validation(format!(
                "effect #{i}: start must be non-negative and before end"
            )));
        }
        if let crate::plan::model::Effect::Custom(c) = effect {
            check_custom_filter(&c.filter)
                .map_err(|e| ReelError::validation(format!("effect #{i}: {e}")))?;
        }
    }

    for (i, vo) in plan.video_overlays.iter().enumerate() {
        if vo.file.trim().is_empty() {
            return Err(ReelError::validation(format!(
                "video overlay #{i}: file is empty"
            )));
        }
        if vo.start < 0.0 || vo.start >= vo.end {
            return Err(ReelError::validation(format!(
                "video overlay #{i}: start must be non-negative and before end"
            )));
        }
        if !(0.0..=1.0).contains(&vo.opacity) {
            return Err(ReelError::validation(format!(
                "video overlay #{i}: opacity must be within 0..1"
            )));
        }
        if let Some(s) = vo.scale
            && !(s.is_finite() && s > 0.0)
        {
            return Err(ReelError::validation(format!(
                "video overlay #{i}: scale must be positive"
            )));
        }
    }

    if let Some(url) = &plan.webhook
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        return Err(ReelError::validation("webhook must be an http(s) URL"));
    }

    Ok(())
}

fn validate_overlay(i: usize, overlay: &Overlay) -> ReelResult<()> {
    let (start, end) = overlay.window();
    if !(start.is_finite() && end.is_finite()) || start < 0.0 || start > end {
        return Err(ReelError::validation(format!(
            "overlay #{i}: start must be non-negative and not after end"
        )));
    }
    if let OverlayVariant::Shape(ShapeVariant::Arrow(a)) = overlay.variant()
        && a.shape.is_none()
    {
        return Err(ReelError::validation(format!(
            "overlay #{i}: arrow requires shape coordinates"
        )));
    }
    Ok(())
}

/// A custom effect is one filter expression; graph syntax would break the surrounding chain.
pub fn check_custom_filter(filter: &str) -> Result<(), String> {
    if filter.trim().is_empty() {
        return Err("custom filter is empty".to_owned());
    }
    if filter.contains([';', '[', ']']) {
        return Err(format!(
            "custom filter '{filter}' must not contain ';', '[' or ']'"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/validate.rs"]
mod tests;
