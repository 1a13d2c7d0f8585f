use crate::foundation::core::{Canvas, TimeWindow};
use crate::foundation::error::{ReelError, ReelResult};
use crate::graph::chain::{CompiledFragment, FilterChain};
use crate::graph::expr;
use crate::graph::label::LabelAllocator;
use crate::plan::model::{Effect, Plan};
use crate::plan::validate::check_custom_filter;

const PREFIX: &str = "vfx_";

/// Whole-frame effects as a chain prefix starting at `base`, one `[vfx_N]` stage per effect.
///
/// Open-ended effects run to `total_duration`. No effects means a pass-through fragment.
pub fn compile_effects(
    plan: &Plan,
    base: &str,
    total_duration: f64,
    labels: &mut LabelAllocator,
) -> ReelResult<CompiledFragment> {
    let mut chain = FilterChain::new(base, 0);
    if plan.effects.is_empty() {
        return Ok(chain.finish());
    }
    let canvas: Canvas = plan.canvas()?;

    for (i, effect) in plan.effects.iter().enumerate() {
        let (start, end) = effect.window(total_duration);
        if !(start >= 0.0 && start < end) {
            return Err(ReelError::validation(format!(
                "effect #{i}: empty window {start}..{end} (total duration {total_duration})"
            )));
        }
        let window = TimeWindow::new(start, end);

        let filter = match effect {
            Effect::Zoom(z) => expr::zoom(canvas, window, z.start_scale, z.end_scale, z.cx, z.cy),
            Effect::Vhs(v) => expr::vhs(window, v.noise, v.chroma, v.contrast, v.saturation),
            Effect::Retro(r) => expr::retro(
                window,
                r.vignette,
                r.grain,
                r.saturation,
                r.contrast,
                r.gamma,
            ),
            Effect::Custom(c) => {
                check_custom_filter(&c.filter)
                    .map_err(|e| ReelError::validation(format!("effect #{i}: {e}")))?;
                expr::custom(&c.filter, window)
            }
        };
        chain.then(&filter, labels.next(PREFIX));
    }

    chain.then(&expr::pix_format("yuv420p"), labels.next(PREFIX));
    let frag = chain.finish();
    tracing::debug!(chain = %frag.chain, output = %frag.output, "compiled effects");
    Ok(frag)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/effects.rs"]
mod tests;
