//! Frame validation via brightness analysis.
//!
//! A capture taken while the game is minimised, covered or mid-transition
//! comes back (nearly) black; such frames abort the session.

use image::RgbaImage;

/// Calculates the average brightness (luminance) of an image.
///
/// Uses the ITU-R BT.601 luma formula: Y = 0.299*R + 0.587*G + 0.114*B
/// Returns a value from 0.0 (black) to 255.0 (white).
pub fn calculate_brightness(img: &RgbaImage) -> f32 {
    if img.width() == 0 || img.height() == 0 {
        return 0.0;
    }

    let pixel_count = (img.width() as f64) * (img.height() as f64);
    let total: f64 = img
        .pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .sum();

    (total / pixel_count) as f32
}

/// Whether a frame should be rejected as a failed capture.
pub fn is_black_frame(img: &RgbaImage, threshold: f32) -> bool {
    calculate_brightness(img) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_brightness_extremes() {
        let black = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let white = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        assert_eq!(calculate_brightness(&black), 0.0);
        assert!((calculate_brightness(&white) - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_brightness_uses_luma_weights() {
        let green = RgbaImage::from_pixel(2, 2, Rgba([0, 100, 0, 255]));
        assert!((calculate_brightness(&green) - 58.7).abs() < 0.01);
    }

    #[test]
    fn test_empty_image_is_black() {
        let empty = RgbaImage::new(0, 0);
        assert_eq!(calculate_brightness(&empty), 0.0);
        assert!(is_black_frame(&empty, 5.0));
    }

    #[test]
    fn test_black_frame_threshold() {
        let dim = RgbaImage::from_pixel(3, 3, Rgba([4, 4, 4, 255]));
        let lit = RgbaImage::from_pixel(3, 3, Rgba([6, 6, 6, 255]));
        assert!(is_black_frame(&dim, 5.0));
        assert!(!is_black_frame(&lit, 5.0));
    }
}
