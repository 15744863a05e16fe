use image::{RgbaImage, imageops};

/// Gaussian blur with the given sigma in both axes. A non-positive sigma is
/// a no-op clone.
pub fn apply_blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageops::blur(image, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn zero_sigma_is_identity() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 1, Rgba([200, 40, 10, 255]));
        assert_eq!(apply_blur(&img, 0.0), img);
    }

    #[test]
    fn blur_preserves_dimensions() {
        let img = RgbaImage::new(7, 3);
        let blurred = apply_blur(&img, 2.5);
        assert_eq!(blurred.dimensions(), (7, 3));
    }

    #[test]
    fn blur_spreads_a_point() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        img.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let blurred = apply_blur(&img, 1.5);
        assert!(blurred.get_pixel(4, 4)[0] < 255);
        assert!(blurred.get_pixel(3, 4)[0] > 0);
    }
}
