use image::Rgba;
use palette::{FromColor, Hsl, Srgb};

const OVERLAY_SATURATION: f32 = 0.9;
const OVERLAY_LIGHTNESS: f32 = 0.5;

/// Generates `n` overlay colors spread evenly around the hue circle.
///
/// Saturation and lightness are fixed, so the colors stay readable on top of a
/// grayscale background whatever its brightness.
pub(crate) fn generate_contrasting_colors(n: usize, alpha: u8) -> Vec<Rgba<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * 360.0) / n as f32;
            let hsl = Hsl::new(hue, OVERLAY_SATURATION, OVERLAY_LIGHTNESS);
            let rgb: Srgb<u8> = Srgb::from_color(hsl).into_format();
            Rgba([rgb.red, rgb.green, rgb.blue, alpha])
        })
        .collect()
}
