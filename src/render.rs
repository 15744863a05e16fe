use tiny_skia::{FilterQuality, Paint, Pattern, Pixmap, Rect, SpreadMode, Transform};

use crate::config::{BackgroundMode, Color};
use crate::placement::{FitMode, Placement};

/// Per-output background pass: solid fill first, then the image when one is
/// present and the mode has a fit variant. `SolidColor` and `Invalid` modes
/// leave the solid fill as-is.
pub fn render_background(
    canvas: &mut Pixmap,
    image: Option<&Pixmap>,
    mode: BackgroundMode,
    color: Color,
    buffer_width: u32,
    buffer_height: u32,
) {
    render_solid_color(canvas, color);
    if let (Some(image), Some(fit)) = (image, mode.fit()) {
        render_background_image(canvas, image, fit, buffer_width, buffer_height);
    }
}

pub fn render_solid_color(canvas: &mut Pixmap, color: Color) {
    canvas.fill(color.to_paint_color());
}

/// Paints `image` onto `canvas` under the given fit mode. One paint call per
/// invocation; the placement transform is a per-call value, so nothing leaks
/// into later drawing.
pub fn render_background_image(
    canvas: &mut Pixmap,
    image: &Pixmap,
    mode: FitMode,
    buffer_width: u32,
    buffer_height: u32,
) {
    let placement = Placement::compute(
        mode,
        image.width(),
        image.height(),
        buffer_width,
        buffer_height,
    );
    let Some(buffer_rect) =
        Rect::from_xywh(0.0, 0.0, buffer_width as f32, buffer_height as f32)
    else {
        return;
    };

    let spread = if mode == FitMode::Tile {
        SpreadMode::Repeat
    } else {
        SpreadMode::Pad
    };
    let mut paint = Paint::default();
    paint.shader = Pattern::new(
        image.as_ref(),
        spread,
        FilterQuality::Bilinear,
        1.0,
        placement.transform(),
    );
    paint.anti_alias = false;

    // Stretch/Fill/Tile cover the whole buffer; Fit/Center paint only where
    // the image lands so the solid fill shows through elsewhere.
    let rect = match mode {
        FitMode::Stretch | FitMode::Fill | FitMode::Tile => buffer_rect,
        FitMode::Fit | FitMode::Center => {
            let (scaled_w, scaled_h) = placement.scaled_size(image.width(), image.height());
            let Some(clipped) = Rect::from_ltrb(
                placement.x.max(0.0),
                placement.y.max(0.0),
                (placement.x + scaled_w).min(buffer_width as f32),
                (placement.y + scaled_h).min(buffer_height as f32),
            ) else {
                return;
            };
            clipped
        }
    };

    canvas.fill_rect(rect, &paint, Transform::identity(), None);
}
