use crate::assets::color::Rgba;
use crate::config::SubtitleStyleDefaults;
use crate::plan::model::{SubtitleAlignment, SubtitleStyle};

/// `force_style` value for the `subtitles` filter.
///
/// Fields missing from `style` come from `defaults`. Always uses an opaque box
/// (`BorderStyle=3`) so `BackColour` is visible.
pub fn force_style(style: Option<&SubtitleStyle>, defaults: &SubtitleStyleDefaults) -> String {
    let fallback = SubtitleStyle::default();
    let s = style.unwrap_or(&fallback);
    let outline = s.outline.clone().unwrap_or_default();

    let font = s.font.as_deref().unwrap_or(&defaults.font);
    let size = s.size.unwrap_or(defaults.size);
    let color = Rgba::parse(s.color.as_deref().unwrap_or(&defaults.color));
    let back = Rgba::parse(s.background.as_deref().unwrap_or(&defaults.background));
    let outline_color = Rgba::parse(outline.color.as_deref().unwrap_or(&defaults.outline_color));
    let outline_width = if outline.enabled.unwrap_or(true) {
        outline.width.unwrap_or(defaults.outline_width)
    } else {
        0
    };
    let alignment = match s.alignment.unwrap_or_default() {
        SubtitleAlignment::Bottom => 2,
        SubtitleAlignment::Top => 8,
    };
    let margin_v = s.margin_v.unwrap_or(defaults.margin_v);

    [
        format!("FontName={font}"),
        format!("FontSize={size}"),
        format!("PrimaryColour={}", color.to_subtitle_color()),
        format!("Outline={outline_width}"),
        format!("OutlineColour={}", outline_color.to_subtitle_color()),
        "BorderStyle=3".to_owned(),
        format!("BackColour={}", back.to_subtitle_color()),
        format!("Alignment={alignment}"),
        format!("MarginV={margin_v}"),
    ]
    .join(",")
}
