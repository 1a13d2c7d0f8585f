use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::color::Rgba;
use crate::assets::shapes;
use crate::compile::subtitles::force_style;
use crate::compile::video_overlays::push_video_overlays;
use crate::config::{RenderDefaults, TextStyleDefaults};
use crate::foundation::core::{Canvas, Point, TimeWindow, fmt_num};
use crate::foundation::error::{ReelError, ReelResult};
use crate::graph::chain::{CompiledFragment, FilterChain};
use crate::graph::expr::{self, DrawText};
use crate::graph::label::LabelAllocator;
use crate::plan::model::{
    AnimationKind, ArrowShape, CircleShape, Overlay, OverlayVariant, Plan, RectShape, ShapeOverlay,
    ShapeVariant, TextAnchor, TextOverlay, TextTransform,
};

/// Words revealed per second by the typewriter animation when the overlay does not say.
const DEFAULT_WORDS_PER_SECOND: f64 = 3.0;
/// Overlays this short or shorter are shown without animation.
const MIN_ANIMATED_SECS: f64 = 2.0;

#[derive(Clone, Debug)]
pub struct OverlayRequest<'a> {
    pub plan: &'a Plan,
    /// Job directory receiving text carriers and shape PNGs.
    pub work_dir: &'a Path,
    /// Label to start from, usually the effects output.
    pub base: &'a str,
    pub subtitle_file: Option<&'a Path>,
    /// Overrides the style built from the plan's `subtitleStyle`.
    pub force_style: Option<&'a str>,
    /// Encoder inputs attached before this fragment's extras (base clip, music, narration).
    pub prior_inputs: usize,
    pub defaults: &'a RenderDefaults,
    pub shapes_enabled: bool,
}

/// Compile subtitles, full-motion overlays, text and shapes onto `request.base`.
///
/// Stage order is fixed; later stages draw over earlier ones. The chain always ends with a
/// `format=yuv420p` stage into `[vout_N]`.
pub fn compile_overlays(
    request: &OverlayRequest<'_>,
    labels: &mut LabelAllocator,
) -> ReelResult<CompiledFragment> {
    let plan = request.plan;
    let canvas = plan.canvas()?;
    let mut chain = FilterChain::new(request.base, request.prior_inputs);

    if plan.burn_subtitles
        && let Some(srt) = request.subtitle_file
    {
        if !srt.is_file() {
            return Err(ReelError::asset(format!(
                "subtitle file not found: {}",
                srt.display()
            )));
        }
        let style = match request.force_style {
            Some(s) => s.to_owned(),
            None => force_style(plan.subtitle_style.as_ref(), &request.defaults.subtitles),
        };
        chain.then(&expr::subtitles(srt, &style), labels.next("v"));
    }

    push_video_overlays(&plan.video_overlays, canvas, &mut chain, labels)?;

    let ctx = StageContext {
        canvas,
        work_dir: request.work_dir,
        defaults: request.defaults,
    };

    for overlay in &plan.overlays {
        if let OverlayVariant::Text(anchor, text) = overlay.variant() {
            push_text(&ctx, anchor, text, overlay.window(), &mut chain, labels)?;
        }
    }

    if request.shapes_enabled {
        for overlay in &plan.overlays {
            if let OverlayVariant::Shape(shape) = overlay.variant() {
                push_shape(&ctx, shape, overlay, &mut chain, labels)?;
            }
        }
    } else if plan
        .overlays
        .iter()
        .any(|o| matches!(o.variant(), OverlayVariant::Shape(_)))
    {
        tracing::info!("shape overlays disabled, skipping");
    }

    chain.then(&expr::pix_format("yuv420p"), labels.next("vout_"));
    let frag = chain.finish();
    tracing::debug!(
        chain = %frag.chain,
        output = %frag.output,
        extra_inputs = frag.extra_inputs.len(),
        "compiled overlays"
    );
    Ok(frag)
}

struct StageContext<'a> {
    canvas: Canvas,
    work_dir: &'a Path,
    defaults: &'a RenderDefaults,
}

impl StageContext<'_> {
    /// Vertical margin below the top edge / above the bottom edge.
    fn edge_margin(&self) -> f64 {
        (f64::from(self.canvas.height) * self.defaults.safe_area() + 10.0).round()
    }
}

fn push_text(
    ctx: &StageContext<'_>,
    anchor: TextAnchor,
    ov: &TextOverlay,
    (start, end): (f64, f64),
    chain: &mut FilterChain,
    labels: &mut LabelAllocator,
) -> ReelResult<()> {
    if ov.text.trim().is_empty() {
        tracing::debug!(?anchor, "skipping empty text overlay");
        return Ok(());
    }
    let step = labels.next_step();
    let window = TimeWindow::new(start, end);
    let base: &TextStyleDefaults = match anchor {
        TextAnchor::Bottom => &ctx.defaults.overlay_bottom,
        TextAnchor::Top | TextAnchor::Custom => &ctx.defaults.overlay_top,
    };
    let style = ov.style.clone().unwrap_or_default();

    let transform = style.text_transform.unwrap_or(if base.uppercase {
        TextTransform::Uppercase
    } else {
        TextTransform::None
    });
    let text = match transform {
        TextTransform::Uppercase => ov.text.to_uppercase(),
        TextTransform::Lowercase => ov.text.to_lowercase(),
        TextTransform::None => ov.text.clone(),
    };

    let text_file = ctx.work_dir.join(format!("overlay_text_{step}.txt"));
    write_text_carrier(&text_file, &text)?;

    let font_file = style
        .font
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.defaults.font_file.clone());

    let (x, y) = match anchor {
        TextAnchor::Top => ("(w-text_w)/2".to_owned(), fmt_num(ctx.edge_margin())),
        TextAnchor::Bottom => (
            "(w-text_w)/2".to_owned(),
            format!("h-text_h-{}", fmt_num(ctx.edge_margin())),
        ),
        TextAnchor::Custom => match ov.position {
            Some(p) => (fmt_num(p.x), fmt_num(p.y)),
            None => (
                fmt_num((f64::from(ctx.canvas.width) * 0.5).round()),
                fmt_num((f64::from(ctx.canvas.height) * 0.1).round()),
            ),
        },
    };

    let drawtext = DrawText {
        font_file: &font_file,
        text_file: &text_file,
        size: style.size.unwrap_or(base.size),
        font_color: Rgba::parse(style.color.as_deref().unwrap_or(&base.color)).to_engine_color(),
        box_color: Rgba::parse(style.background.as_deref().unwrap_or(&base.background))
            .to_engine_color(),
        box_border: style.box_border.unwrap_or(base.box_border),
        border_width: style.outline_width.unwrap_or(base.outline_width),
        x,
        y,
        alpha: text_alpha(ov, &text, window),
        window,
    };
    chain.then(&expr::drawtext(&drawtext), LabelAllocator::at("v", step));
    Ok(())
}

/// Alpha expression for overlays longer than two seconds; shorter ones are drawn flat.
pub(crate) fn text_alpha(ov: &TextOverlay, text: &str, window: TimeWindow) -> Option<String> {
    let d = window.duration();
    if d <= MIN_ANIMATED_SECS {
        return None;
    }
    match ov.animation.as_ref().map(|a| (a.kind, a.words_per_second)) {
        Some((AnimationKind::Typewriter, wps)) => {
            let wps = wps
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(DEFAULT_WORDS_PER_SECOND);
            let words = text.split_whitespace().count().max(1) as f64;
            let ramp = (0.7 * d).min(words / wps);
            Some(expr::typewriter_alpha(window, ramp))
        }
        Some((AnimationKind::Fade, _)) | None => {
            Some(expr::fade_alpha(window, fade_secs(d)))
        }
    }
}

/// Fade-in (and fade-out) length for a visible span of `d` seconds.
pub fn fade_secs(d: f64) -> f64 {
    (0.12 * d).min(0.6)
}

fn write_text_carrier(path: &Path, text: &str) -> ReelResult<()> {
    std::fs::write(path, text.replace('\r', ""))
        .with_context(|| format!("write overlay text '{}'", path.display()))?;
    Ok(())
}

fn push_shape(
    ctx: &StageContext<'_>,
    shape: ShapeVariant<'_>,
    overlay: &Overlay,
    chain: &mut FilterChain,
    labels: &mut LabelAllocator,
) -> ReelResult<()> {
    let step = labels.next_step();
    let (start, end) = overlay.window();
    let window = TimeWindow::new(start, end);

    let (png, x, y) = match shape {
        ShapeVariant::Rect(ov) => rect_png(ctx, ov, step)?,
        ShapeVariant::Circle(ov) => circle_png(ctx, ov, step)?,
        ShapeVariant::Arrow(ov) => arrow_png(ctx, ov, step)?,
    };

    let pad = chain.add_input(png);
    chain.merge(
        &pad,
        &expr::overlay_at(&fmt_num(x), &fmt_num(y), window),
        LabelAllocator::at("v", step),
    );
    Ok(())
}

fn rect_png(
    ctx: &StageContext<'_>,
    ov: &ShapeOverlay<RectShape>,
    step: u32,
) -> ReelResult<(PathBuf, f64, f64)> {
    let d = &ctx.defaults.shapes;
    let sh = ov.shape.clone().unwrap_or_default();
    let w = sh.w.unwrap_or(300).max(2);
    let h = sh.h.unwrap_or(120).max(2);
    let color = Rgba::parse(sh.color.as_deref().unwrap_or(&d.rect_color));
    let thickness = sh.thickness.unwrap_or(f64::from(d.thickness)).max(0.0);
    let fill = sh
        .fill_opacity
        .unwrap_or(d.rect_fill_opacity)
        .clamp(0.0, 1.0);

    let png = ctx.work_dir.join(format!("shape_rect_{step}.png"));
    shapes::draw_rect_png(&png, w, h, thickness as f32, color, fill)?;

    let x = ov
        .position
        .map(|p| p.x)
        .unwrap_or_else(|| ((f64::from(ctx.canvas.width) - f64::from(w)) / 2.0).round());
    let y = ov.position.map(|p| p.y).unwrap_or_else(|| ctx.edge_margin());
    Ok((png, x, y))
}

fn circle_png(
    ctx: &StageContext<'_>,
    ov: &ShapeOverlay<CircleShape>,
    step: u32,
) -> ReelResult<(PathBuf, f64, f64)> {
    let d = &ctx.defaults.shapes;
    let sh = ov.shape.clone().unwrap_or_default();
    let radius = sh.radius.unwrap_or(d.circle_radius).max(5);
    let color = Rgba::parse(sh.color.as_deref().unwrap_or(&d.circle_color));
    let thickness = sh.thickness.unwrap_or(f64::from(d.thickness)).max(0.0);
    let fill = sh.fill_opacity.unwrap_or(0.0).clamp(0.0, 1.0);

    let png = ctx.work_dir.join(format!("shape_circle_{step}.png"));
    shapes::draw_circle_png(&png, radius, thickness as f32, color, fill)?;

    // Position is the centre.
    let cx = ov
        .position
        .map(|p| p.x)
        .unwrap_or_else(|| (f64::from(ctx.canvas.width) / 2.0).round());
    let cy = ov
        .position
        .map(|p| p.y)
        .unwrap_or_else(|| (f64::from(ctx.canvas.height) / 2.0).round());
    let r = f64::from(radius);
    Ok((png, cx - r, cy - r))
}

fn arrow_png(
    ctx: &StageContext<'_>,
    ov: &ShapeOverlay<ArrowShape>,
    step: u32,
) -> ReelResult<(PathBuf, f64, f64)> {
    let d = &ctx.defaults.shapes;
    let sh = ov
        .shape
        .as_ref()
        .ok_or_else(|| ReelError::validation("arrow overlay requires shape coordinates"))?;
    let color = Rgba::parse(sh.color.as_deref().unwrap_or(&d.arrow_color));
    let thickness = sh.thickness.unwrap_or(f64::from(d.thickness)).max(1.0);
    let head = sh
        .head_size
        .unwrap_or(f64::from(d.arrow_head_size))
        .max(6.0);

    // Canvas spans the shaft's bounding box plus room for the head on every side.
    let min_x = sh.x1.min(sh.x2);
    let min_y = sh.y1.min(sh.y2);
    let w = (sh.x2 - sh.x1).abs().max(1.0) + head * 2.0;
    let h = (sh.y2 - sh.y1).abs().max(1.0) + head * 2.0;
    let from = Point::new(sh.x1 - min_x + head, sh.y1 - min_y + head);
    let tip = Point::new(sh.x2 - min_x + head, sh.y2 - min_y + head);

    let png = ctx.work_dir.join(format!("shape_arrow_{step}.png"));
    shapes::draw_arrow_png(
        &png,
        w.ceil() as u32,
        h.ceil() as u32,
        from,
        tip,
        thickness as f32,
        head,
        color,
    )?;
    Ok((png, min_x - head, min_y - head))
}

#[cfg(test)]
#[path = "../../tests/unit/compile/overlays.rs"]
mod tests;
