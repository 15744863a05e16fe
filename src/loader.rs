use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use image::RgbaImage;
use jpeg_decoder::{Decoder as JpegDecoder, PixelFormat};
use tiny_skia::Pixmap;
use tracing::{debug, error};

use crate::processing::{blur, darken};

/// Loads a background image, applies optional blur and darkening, and uploads
/// it to a pixmap ready for compositing.
///
/// Every failure path logs one error and returns `None`; the caller decides
/// whether to fall back to a solid fill. A returned pixmap always has
/// strictly positive dimensions.
pub fn load_background_image(
    path: &Path,
    blur_sigma: f32,
    opacity_percent: f32,
) -> Option<Pixmap> {
    match load_inner(path, blur_sigma, opacity_percent) {
        Ok(pixmap) => Some(pixmap),
        Err(err) => {
            error!(
                "failed to load background image {}: {err:#}",
                path.display()
            );
            None
        }
    }
}

fn load_inner(path: &Path, blur_sigma: f32, opacity_percent: f32) -> Result<Pixmap> {
    let mut image = decode_rgba8_apply_exif(path)?;

    if blur_sigma > 0.0 {
        image = blur::apply_blur(&image, blur_sigma);
    }
    if opacity_percent > 0.0 {
        darken::apply_darken(&mut image, opacity_percent);
    }

    upload_to_pixmap(&image)
}

// Decodes an image to RGBA8 and applies EXIF orientation if available.
// Orientation handling is best-effort; if metadata is missing, the original
// orientation is preserved.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage> {
    let image = decode_rgba8(path)?;
    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(image, orientation))
}

fn decode_rgba8(path: &Path) -> Result<RgbaImage> {
    let is_jpeg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
    if is_jpeg {
        match decode_jpeg(path) {
            Ok(image) => return Ok(image),
            Err(err) => {
                debug!(
                    "JPEG fast path failed for {}: {err:#}; falling back",
                    path.display()
                );
            }
        }
    }

    Ok(image::ImageReader::open(path)
        .with_context(|| format!("failed to open background image at {}", path.display()))?
        .with_guessed_format()
        .context("sniffing image format")?
        .decode()
        .with_context(|| format!("failed to decode background image at {}", path.display()))?
        .to_rgba8())
}

// JPEG path with explicit pixel-format handling; CMYK inputs are converted
// to RGB here since the generic decode may misrender them.
fn decode_jpeg(path: &Path) -> Result<RgbaImage> {
    use jpeg_decoder::Error as JpegError;

    let file = File::open(path)
        .with_context(|| format!("failed to open background image at {}", path.display()))?;
    let mut decoder = JpegDecoder::new(BufReader::new(file));
    let pixels = decoder.decode().map_err(|err| match err {
        JpegError::Unsupported(feature) => anyhow!("unsupported JPEG feature: {feature:?}"),
        other => anyhow!(other),
    })?;
    let info = decoder
        .info()
        .ok_or_else(|| anyhow!("missing image info while decoding JPEG {}", path.display()))?;
    let width = info.width as u32;
    let height = info.height as u32;

    let rgba = match info.pixel_format {
        PixelFormat::RGB24 => {
            let mut rgba = Vec::with_capacity(pixels.len() / 3 * 4);
            for chunk in pixels.chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
            rgba
        }
        PixelFormat::L8 => {
            let mut rgba = Vec::with_capacity(pixels.len() * 4);
            for &v in &pixels {
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
            rgba
        }
        PixelFormat::CMYK32 => {
            let mut rgba = Vec::with_capacity(pixels.len());
            for chunk in pixels.chunks_exact(4) {
                let [r, g, b] = cmyk_to_rgb([chunk[0], chunk[1], chunk[2], chunk[3]]);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
            rgba
        }
        PixelFormat::L16 => {
            bail!("16-bit grayscale JPEGs are not supported by the fast path");
        }
    };

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("failed to construct RGBA image for {}", path.display()))
}

fn cmyk_to_rgb(cmyk: [u8; 4]) -> [u8; 3] {
    let c = cmyk[0] as f32 / 255.0;
    let m = cmyk[1] as f32 / 255.0;
    let y = cmyk[2] as f32 / 255.0;
    let k = cmyk[3] as f32 / 255.0;
    let c = c * (1.0 - k) + k;
    let m = m * (1.0 - k) + k;
    let y = y * (1.0 - k) + k;
    [
        ((1.0 - c) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((1.0 - m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((1.0 - y) * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    if let Some(field) = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        if let Some(val) = field.value.get_uint(0) {
            let o = val as u16;
            debug!("exif orientation {} for {}", o, path.display());
            return Some(o);
        }
    }
    None
}

// Map common EXIF orientations. Unsupported cases fall through as-is.
fn apply_orientation(mut image: RgbaImage, orientation: u16) -> RgbaImage {
    match orientation {
        1 => {}
        2 => {
            image = image::imageops::flip_horizontal(&image);
        }
        3 => {
            image = image::imageops::rotate180(&image);
        }
        4 => {
            image = image::imageops::flip_vertical(&image);
        }
        5 => {
            // transpose: rotate90 + flip_horizontal
            image = image::imageops::rotate90(&image);
            image = image::imageops::flip_horizontal(&image);
        }
        6 => {
            image = image::imageops::rotate90(&image);
        }
        7 => {
            // transverse: rotate270 + flip_horizontal
            image = image::imageops::rotate270(&image);
            image = image::imageops::flip_horizontal(&image);
        }
        8 => {
            image = image::imageops::rotate270(&image);
        }
        _ => {}
    }
    image
}

// Premultiplied upload into the drawing engine's surface type.
fn upload_to_pixmap(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height()).ok_or_else(|| {
        anyhow!(
            "failed to allocate {}x{} surface",
            image.width(),
            image.height()
        )
    })?;
    for (src, dst) in image.pixels().zip(pixmap.pixels_mut()) {
        *dst = tiny_skia::ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use image::Rgba;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    #[test]
    fn applies_orientation_six() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();
        let img = decode_rgba8_apply_exif(&path).unwrap();
        assert_eq!(img.dimensions(), (1, 2));
    }

    #[test]
    fn orientation_mapping_rotates_and_flips() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let rotated = apply_orientation(img.clone(), 6);
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0, 255]);

        let flipped = apply_orientation(img.clone(), 2);
        assert_eq!(flipped.dimensions(), (2, 1));
        assert_eq!(flipped.get_pixel(0, 0).0, [0, 0, 255, 255]);

        let untouched = apply_orientation(img.clone(), 1);
        assert_eq!(untouched, img);
    }

    #[test]
    fn cmyk_conversion_hits_known_values() {
        // no ink at all is white; full key is black
        assert_eq!(cmyk_to_rgb([0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb([0, 0, 0, 255]), [0, 0, 0]);
        // pure cyan drops red only
        assert_eq!(cmyk_to_rgb([255, 0, 0, 0]), [0, 255, 255]);
        // half key halves everything
        let [r, g, b] = cmyk_to_rgb([0, 0, 0, 128]);
        assert!(r.abs_diff(127) <= 1);
        assert!(g.abs_diff(127) <= 1);
        assert!(b.abs_diff(127) <= 1);
    }

    #[test]
    fn upload_preserves_opaque_pixels() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([12, 34, 56, 255]));
        let pixmap = upload_to_pixmap(&img).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (3, 2));
        let px = pixmap.pixel(2, 1).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (12, 34, 56, 255));
    }
}
