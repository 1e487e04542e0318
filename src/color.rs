use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MagnitudeBand;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Magnitude colours
// ---------------------------------------------------------------------------

/// Red for major events through orange and yellow down to green.
pub fn band_color(band: MagnitudeBand) -> Color32 {
    let hue = match band {
        MagnitudeBand::Major => 0.0,
        MagnitudeBand::Moderate => 24.0,
        MagnitudeBand::Light => 48.0,
        MagnitudeBand::Minor => 120.0,
    };
    let lightness = if band == MagnitudeBand::Minor { 0.4 } else { 0.5 };
    hsl_to_color32(hue, 1.0, lightness)
}

/// Colour for a raw magnitude; non-finite values are grey.
pub fn magnitude_color(magnitude: f64) -> Color32 {
    MagnitudeBand::of(magnitude).map_or(Color32::GRAY, band_color)
}

/// Map marker radius in points, growing with magnitude.
pub fn marker_radius(magnitude: f64) -> f32 {
    if !magnitude.is_finite() {
        return 2.5;
    }
    (magnitude * 1.5).clamp(2.5, 10.0) as f32
}

// ---------------------------------------------------------------------------
// Region palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}
