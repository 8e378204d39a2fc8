use palette::{Hsl, IntoColor, Srgb};

/// 8-bit sRGB triple.
pub type Rgb8 = [u8; 3];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_rgb8((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

// ---------------------------------------------------------------------------
// Heat ramp: normalized value → colour
// ---------------------------------------------------------------------------

/// Blue (0) through green to red (1). Values outside `0..=1` are clamped,
/// NaN maps to black.
pub fn heat(t: f64) -> Rgb8 {
    if t.is_nan() {
        return [0, 0, 0];
    }
    let t = t.clamp(0.0, 1.0) as f32;
    hsl_to_rgb8(240.0 * (1.0 - t), 0.85, 0.5 * t.sqrt().max(0.1))
}

/// Map a value onto [`heat`] given the data range.
pub fn heat_scaled(value: f64, min: f64, max: f64) -> Rgb8 {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return heat(if value > 0.0 { 1.0 } else { 0.0 });
    }
    heat((value - min) / span)
}

fn hsl_to_rgb8(hue: f32, saturation: f32, lightness: f32) -> Rgb8 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_u8(rgb.red), to_u8(rgb.green), to_u8(rgb.blue)]
}
