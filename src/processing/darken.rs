use image::RgbaImage;

/// Darkening overlay: blends every channel toward opaque black with weight
/// `opacity_percent / 100`. The level is applied to R/G/B and A alike, so
/// 100 blacks out the image entirely. This mirrors a colorize-with-blend
/// overlay, not conventional alpha compositing, and callers skip the call
/// for a zero percent rather than relying on it being a no-op.
pub fn apply_darken(image: &mut RgbaImage, opacity_percent: f32) {
    if opacity_percent <= 0.0 {
        return;
    }
    let level = (opacity_percent / 100.0).clamp(0.0, 1.0);
    let keep = 1.0 - level;
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [
            (r as f32 * keep).round() as u8,
            (g as f32 * keep).round() as u8,
            (b as f32 * keep).round() as u8,
            (a as f32 * keep + 255.0 * level).round() as u8,
        ];
    }
}
