//! Color utility functions shared across the application.
//!
//! Label colors are specified either as `#RRGGBB` hex strings or as CSS-style
//! `hsl(h, s%, l%)` strings. Both are parsed into 8-bit RGB triples here.

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Convert HSL to RGB via the equivalent HSV value.
///
/// `s` and `l` are in range 0.0-1.0, the result is in range 0.0-1.0.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let v = l + s * l.min(1.0 - l);
    let sv = if v <= 0.0 { 0.0 } else { 2.0 * (1.0 - l / v) };
    hsv_to_rgb(h.rem_euclid(360.0), sv, v)
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parse a `#RRGGBB` hex color.
pub fn parse_hex(spec: &str) -> Option<[u8; 3]> {
    let hex = spec.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Parse an `hsl(h, s%, l%)` color.
pub fn parse_hsl(spec: &str) -> Option<[u8; 3]> {
    let inner = spec.trim().strip_prefix("hsl(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let h: f32 = parts.next()?.parse().ok()?;
    let s: f32 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    let l: f32 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(h, s / 100.0, l / 100.0);
    Some([to_u8(r), to_u8(g), to_u8(b)])
}

/// Parse either supported color notation.
pub fn parse_color(spec: &str) -> Option<[u8; 3]> {
    parse_hex(spec).or_else(|| parse_hsl(spec))
}
