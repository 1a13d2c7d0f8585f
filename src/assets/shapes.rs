//! Rasterize overlay primitives (rectangle, circle, arrow) to standalone PNG files.
//!
//! Drawing goes through `tiny_skia` (re-exported by `resvg`); encoding goes through `image`.

use std::path::Path;

use anyhow::Context as _;
use resvg::tiny_skia::{self, FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::assets::color::Rgba;
use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{ReelError, ReelResult};

/// Half-angle between the shaft and each arrow-head stroke.
const ARROW_HEAD_ANGLE_DEG: f64 = 25.0;

/// Rectangle of `w`x`h` with a stroke of `stroke` px drawn inside the bounds.
pub fn draw_rect_png(
    path: &Path,
    w: u32,
    h: u32,
    stroke: f32,
    color: Rgba,
    fill_opacity: f64,
) -> ReelResult<()> {
    let mut pixmap = new_pixmap(w, h)?;
    let (wf, hf) = (w as f32, h as f32);

    if fill_opacity > 0.0
        && let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, wf, hf)
    {
        pixmap.fill_rect(rect, &paint(color, fill_opacity), Transform::identity(), None);
    }

    if stroke > 0.0 {
        let half = stroke / 2.0;
        if let Some(rect) =
            tiny_skia::Rect::from_xywh(half, half, (wf - stroke).max(0.0), (hf - stroke).max(0.0))
        {
            let outline = PathBuilder::from_rect(rect);
            pixmap.stroke_path(
                &outline,
                &paint(color, 1.0),
                &stroke_style(stroke, LineCap::Butt),
                Transform::identity(),
                None,
            );
        }
    }

    save_png(&pixmap, path)
}

/// Circle of `radius` centred in a `max(4, 2*radius)` square canvas.
pub fn draw_circle_png(
    path: &Path,
    radius: u32,
    stroke: f32,
    color: Rgba,
    fill_opacity: f64,
) -> ReelResult<()> {
    let d = (radius * 2).max(4);
    let mut pixmap = new_pixmap(d, d)?;
    let r = radius as f32;

    if fill_opacity > 0.0
        && let Some(disc) = PathBuilder::from_circle(r, r, r)
    {
        pixmap.fill_path(
            &disc,
            &paint(color, fill_opacity),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    if stroke > 0.0
        && let Some(ring) = PathBuilder::from_circle(r, r, (r - stroke / 2.0).max(0.5))
    {
        pixmap.stroke_path(
            &ring,
            &paint(color, 1.0),
            &stroke_style(stroke, LineCap::Butt),
            Transform::identity(),
            None,
        );
    }

    save_png(&pixmap, path)
}

/// Arrow from `(x1, y1)` to the tip `(x2, y2)` on a `w`x`h` canvas.
#[allow(clippy::too_many_arguments)]
pub fn draw_arrow_png(
    path: &Path,
    w: u32,
    h: u32,
    from: Point,
    tip: Point,
    thickness: f32,
    head_size: f64,
    color: Rgba,
) -> ReelResult<()> {
    let mut pixmap = new_pixmap(w, h)?;
    let (left, right) = arrow_head_points(from, tip, head_size);

    let mut pb = PathBuilder::new();
    pb.move_to(from.x as f32, from.y as f32);
    pb.line_to(tip.x as f32, tip.y as f32);
    pb.move_to(tip.x as f32, tip.y as f32);
    pb.line_to(left.x as f32, left.y as f32);
    pb.move_to(tip.x as f32, tip.y as f32);
    pb.line_to(right.x as f32, right.y as f32);

    if thickness > 0.0
        && let Some(arrow) = pb.finish()
    {
        pixmap.stroke_path(
            &arrow,
            &paint(color, 1.0),
            &stroke_style(thickness, LineCap::Round),
            Transform::identity(),
            None,
        );
    }

    save_png(&pixmap, path)
}

/// End points of the two arrow-head strokes.
///
/// The reversed shaft direction is rotated by ±25° and scaled by `head_size`. A zero-length
/// shaft uses a length of 1 so the direction stays finite.
pub fn arrow_head_points(from: Point, tip: Point, head_size: f64) -> (Point, Point) {
    let d: Vec2 = tip - from;
    let len = d.hypot().max(1.0);
    let back = Point::new(-d.x / len, -d.y / len);

    let angle = ARROW_HEAD_ANGLE_DEG.to_radians();
    let r1 = Affine::rotate(angle) * back;
    let r2 = Affine::rotate(-angle) * back;

    (
        tip + r1.to_vec2() * head_size,
        tip + r2.to_vec2() * head_size,
    )
}

fn new_pixmap(w: u32, h: u32) -> ReelResult<Pixmap> {
    Pixmap::new(w, h).ok_or_else(|| {
        ReelError::validation(format!("cannot allocate a {w}x{h} shape canvas"))
    })
}

fn paint(color: Rgba, opacity: f64) -> Paint<'static> {
    let mut p = Paint::default();
    let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    p.set_color_rgba8(color.r, color.g, color.b, a);
    p.anti_alias = true;
    p
}

fn stroke_style(width: f32, cap: LineCap) -> Stroke {
    Stroke {
        width,
        line_cap: cap,
        ..Stroke::default()
    }
}

fn save_png(pixmap: &Pixmap, path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create shape directory '{}'", parent.display()))?;
    }

    // tiny-skia stores premultiplied pixels; PNG wants straight alpha.
    let mut straight = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        straight.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    image::save_buffer_with_format(
        path,
        &straight,
        pixmap.width(),
        pixmap.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write shape png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/shapes.rs"]
mod tests;
