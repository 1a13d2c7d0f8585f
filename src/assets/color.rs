use serde::Serialize;

/// Straight-alpha color: 8-bit channels, alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Opaque white, returned for anything [`Rgba::parse`] does not recognize.
    pub const FALLBACK: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: if a.is_finite() { a.clamp(0.0, 1.0) } else { 1.0 },
        }
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `rgb(r,g,b)` or `rgba(r,g,b,a)`.
    ///
    /// Never fails: unrecognized literals silently become [`Rgba::FALLBACK`].
    pub fn parse(literal: &str) -> Self {
        Self::try_parse(literal).unwrap_or(Self::FALLBACK)
    }

    pub fn try_parse(literal: &str) -> Option<Self> {
        let s = literal.trim();
        if s.is_empty() {
            return None;
        }
        parse_hex6(s).or_else(|| parse_rgba_fn(s))
    }

    /// `0xRRGGBB@A.AAA`, the form `drawtext`/`drawbox` color options take.
    pub fn to_engine_color(self) -> String {
        format!(
            "0x{:02X}{:02X}{:02X}@{:.3}",
            self.r, self.g, self.b, self.a
        )
    }

    /// Inverse of [`Rgba::to_engine_color`].
    pub fn from_engine_color(s: &str) -> Option<Self> {
        let body = s.trim().strip_prefix("0x")?;
        let (hex, alpha) = body.split_once('@')?;
        let c = parse_hex6(hex)?;
        let a: f64 = alpha.parse().ok()?;
        Some(Self::rgba(c.r, c.g, c.b, a))
    }

    /// `&HAABBGGRR&` for subtitle styling. Alpha is inverted: `00` is opaque, `FF` transparent.
    pub fn to_subtitle_color(self) -> String {
        let inv = 255 - (self.a * 255.0).round().clamp(0.0, 255.0) as u8;
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}&",
            inv, self.b, self.g, self.r
        )
    }
}

fn parse_hex6(s: &str) -> Option<Rgba> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?))
}

fn parse_rgba_fn(s: &str) -> Option<Rgba> {
    let lower = s.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba")
        .or_else(|| lower.strip_prefix("rgb"))?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    fn channel(p: &str) -> Option<u8> {
        if p.is_empty() || p.len() > 3 || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let v: u32 = p.parse().ok()?;
        Some(v.min(255) as u8)
    }

    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        Some(p) => p.parse::<f64>().ok()?,
        None => 1.0,
    };
    Some(Rgba::rgba(r, g, b, a))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
