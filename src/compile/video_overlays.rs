use std::path::Path;

use crate::foundation::core::{Canvas, TimeWindow, fmt_num};
use crate::foundation::error::{ReelError, ReelResult};
use crate::graph::chain::FilterChain;
use crate::graph::expr;
use crate::graph::label::LabelAllocator;
use crate::plan::model::VideoOverlay;

/// Opacity ceiling for clips whose file name marks them as VHS texture.
const VHS_MAX_OPACITY: f64 = 0.35;

/// Append one extra input and two stages per full-motion overlay, in start order.
///
/// Each clip is scaled to the canvas on a side branch (`[ovs_N]`), then composited onto the
/// running chain (`[vov_N]`).
pub(crate) fn push_video_overlays(
    overlays: &[VideoOverlay],
    canvas: Canvas,
    chain: &mut FilterChain,
    labels: &mut LabelAllocator,
) -> ReelResult<()> {
    let mut sorted: Vec<&VideoOverlay> = overlays.iter().collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    for vo in sorted {
        let path = Path::new(&vo.file);
        if !path.is_file() {
            return Err(ReelError::asset(format!(
                "video overlay file not found: {}",
                path.display()
            )));
        }
        if !vo.has_supported_extension() {
            tracing::warn!(
                file = %path.display(),
                supported = ?VideoOverlay::SUPPORTED_EXTENSIONS,
                "video overlay has an unrecognized extension"
            );
        }

        let pad = chain.add_input(path);
        let step = labels.next_step();
        let prepared = LabelAllocator::at("ovs_", step);
        let out = LabelAllocator::at("vov_", step);
        let window = TimeWindow::new(vo.start, vo.end);

        chain.side(&pad, &prepare_filters(vo, canvas).join(","), &prepared);
        let composite = if vo.blend_mode.is_positional() {
            let (x, y) = vo.position.map(|p| (p.x, p.y)).unwrap_or((0.0, 0.0));
            expr::overlay_at(&fmt_num(x), &fmt_num(y), window)
        } else {
            expr::blend(vo.blend_mode.engine_name(), window)
        };
        chain.merge(&prepared.to_string(), &composite, out);

        tracing::debug!(
            file = %path.display(),
            mode = vo.blend_mode.engine_name(),
            start = vo.start,
            end = vo.end,
            "added video overlay"
        );
    }
    Ok(())
}

fn is_vhs_texture(file: &str) -> bool {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("vhs"))
        .unwrap_or(false)
}

fn prepare_filters(vo: &VideoOverlay, canvas: Canvas) -> Vec<String> {
    let mut filters = vec![format!("scale={}:{}", canvas.width, canvas.height)];

    // Pixel blends need both inputs at canvas size, so only positional modes rescale.
    if vo.blend_mode.is_positional()
        && let Some(s) = vo.scale
        && (s - 1.0).abs() > f64::EPSILON
    {
        let s = fmt_num(s);
        filters.push(format!("scale=iw*{s}:ih*{s}"));
    }

    let vhs = is_vhs_texture(&vo.file);
    if vhs {
        filters.push("hue=s=0".to_owned());
    }
    let opacity = if vhs {
        vo.opacity.min(VHS_MAX_OPACITY)
    } else {
        vo.opacity
    };
    if opacity < 1.0 {
        filters.push(format!(
            "format=yuva420p,colorchannelmixer=aa={}",
            fmt_num(opacity.max(0.0))
        ));
    }
    filters
}
