use std::path::Path;

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;

/// Downscale a still so it fits inside the canvas box and write it as PNG.
///
/// Aspect ratio is kept; images already inside the box are re-encoded unchanged. Returns the
/// written size.
pub fn prescale_photo(src: &Path, dest: &Path, canvas: Canvas) -> ReelResult<(u32, u32)> {
    let img = image::open(src).with_context(|| format!("decode photo '{}'", src.display()))?;
    let (w, h) = (img.width(), img.height());

    let out = if w > canvas.width || h > canvas.height {
        img.resize(canvas.width, canvas.height, FilterType::Triangle)
    } else {
        img
    };
    let size = (out.width(), out.height());

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create photo directory '{}'", parent.display()))?;
    }
    out.to_rgba8()
        .save_with_format(dest, image::ImageFormat::Png)
        .with_context(|| format!("write prepared photo '{}'", dest.display()))?;
    Ok(size)
}
