//! Pure formatters, one per filter kind. Numbers go through [`fmt_num`].

use std::path::Path;

use crate::foundation::core::{Canvas, TimeWindow, fmt_num};
use crate::plan::model::FitMode;

/// Wrap a value in single quotes for the graph parser, closing and escaping embedded quotes.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Path inside a `subtitles=` option: backslashes doubled, colons escaped.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
}

pub fn volume_db(db: f64) -> String {
    format!("volume={}dB", fmt_num(db))
}

pub fn pix_format(fmt: &str) -> String {
    format!("format={fmt}")
}

/// Scale into the canvas box preserving aspect, then pad (letterbox) or crop.
pub fn fit(mode: FitMode, canvas: Canvas) -> String {
    let (w, h) = (canvas.width, canvas.height);
    match mode {
        FitMode::Letterbox => format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
        ),
        FitMode::Crop => {
            format!("scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}")
        }
    }
}

pub fn subtitles(path: &Path, force_style: &str) -> String {
    format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_path(path),
        force_style.replace('\'', "\\'")
    )
}

/// `overlay=x:y` gated to `window`.
pub fn overlay_at(x: &str, y: &str, window: TimeWindow) -> String {
    format!("overlay={x}:{y}:{}", window.enable_opt())
}

/// Pixel blend of two equally sized streams, gated to `window`.
pub fn blend(mode: &str, window: TimeWindow) -> String {
    format!("blend=all_mode='{mode}':{}", window.enable_opt())
}

/// `drawtext` options in emission order.
#[derive(Clone, Debug)]
pub struct DrawText<'a> {
    pub font_file: &'a Path,
    pub text_file: &'a Path,
    pub size: u32,
    pub font_color: String,
    pub box_color: String,
    pub box_border: u32,
    pub border_width: u32,
    pub x: String,
    pub y: String,
    /// Alpha expression, without quotes.
    pub alpha: Option<String>,
    pub window: TimeWindow,
}

pub fn drawtext(d: &DrawText<'_>) -> String {
    let mut s = format!(
        "drawtext=fontfile={}:textfile={}:fontsize={}:fontcolor={}:box=1:boxcolor={}:boxborderw={}:borderw={}:x={}:y={}",
        quote(&d.font_file.to_string_lossy()),
        quote(&d.text_file.to_string_lossy()),
        d.size,
        d.font_color,
        d.box_color,
        d.box_border,
        d.border_width,
        d.x,
        d.y,
    );
    if let Some(alpha) = &d.alpha {
        s.push_str(&format!(":alpha='{alpha}'"));
    }
    s.push(':');
    s.push_str(&d.window.enable_opt());
    s
}

/// Linear fade in over `fade` seconds after `start` and out over `fade` seconds before `end`.
pub fn fade_alpha(window: TimeWindow, fade: f64) -> String {
    let s = fmt_num(window.start);
    let e = fmt_num(window.end);
    let f = fmt_num(fade);
    let hold_end = fmt_num(window.end - fade);
    let ramp_end = fmt_num(window.start + fade);
    format!(
        "if(lt(t,{s}),0,if(lt(t,{ramp_end}),(t-{s})/{f},if(lt(t,{hold_end}),1,if(lt(t,{e}),({e}-t)/{f},0))))"
    )
}

/// Alpha ramping from 0 to 1 over `ramp` seconds after `start`, then held.
pub fn typewriter_alpha(window: TimeWindow, ramp: f64) -> String {
    let s = fmt_num(window.start);
    let r = fmt_num(ramp);
    let ramp_end = fmt_num(window.start + ramp);
    format!("if(lt(t,{s}),0,if(lt(t,{ramp_end}),(t-{s})/{r},1))")
}

/// Time-varying zoom factor: linear from `from` to `to` across the window, 1 outside it.
pub fn zoom_factor(window: TimeWindow, from: f64, to: f64) -> String {
    let s = fmt_num(window.start);
    let e = fmt_num(window.end);
    format!(
        "if(between(t,{s},{e}),{a}+({b}-{a})*(t-{s})/max({e}-{s},0.001),1)",
        a = fmt_num(from),
        b = fmt_num(to),
    )
}

/// Per-frame rescale followed by a canvas-sized crop centred on `(cx, cy)` (fractions).
pub fn zoom(canvas: Canvas, window: TimeWindow, from: f64, to: f64, cx: f64, cy: f64) -> String {
    let z = zoom_factor(window, from, to);
    let (w, h) = (canvas.width, canvas.height);
    format!(
        "scale=w='iw*{z}':h='ih*{z}':eval=frame,crop={w}:{h}:x='max(0,({cx}*in_w-{w}/2))':y='max(0,({cy}*in_h-{h}/2))'",
        cx = fmt_num(cx),
        cy = fmt_num(cy),
    )
}

pub fn vhs(window: TimeWindow, noise: f64, chroma: f64, contrast: f64, saturation: f64) -> String {
    let en = window.enable_opt();
    let noise = noise.clamp(0.0, 100.0);
    let chroma = chroma.clamp(0.0, 5.0);
    let chroma_y = (chroma - 1.0).clamp(0.0, 3.0);
    format!(
        "format=yuv420p,eq=contrast={}:saturation={}:{en},noise=alls={}:allf=t:{en},chromashift=cx={}:cy={}:{en}",
        fmt_num(contrast),
        fmt_num(saturation),
        fmt_num(noise),
        fmt_num(chroma),
        fmt_num(chroma_y),
    )
}

pub fn retro(
    window: TimeWindow,
    vignette: f64,
    grain: f64,
    saturation: f64,
    contrast: f64,
    gamma: f64,
) -> String {
    let en = window.enable_opt();
    format!(
        "eq=saturation={}:contrast={}:gamma={}:{en},vignette=angle={}:{en},noise=alls={}:allf=t:{en}",
        fmt_num(saturation),
        fmt_num(contrast),
        fmt_num(gamma),
        fmt_num(vignette),
        fmt_num(grain.max(0.0)),
    )
}

/// User filter, gated to `window` unless it already carries `enable=`.
pub fn custom(filter: &str, window: TimeWindow) -> String {
    let filter = filter.trim();
    if filter.contains("enable=") {
        filter.to_owned()
    } else if filter.contains('=') {
        format!("{filter}:{}", window.enable_opt())
    } else {
        format!("{filter}={}", window.enable_opt())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/expr.rs"]
mod tests;
