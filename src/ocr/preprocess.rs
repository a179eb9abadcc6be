use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

use crate::config::{OcrConfig, ZoneRect};

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0–1.0) to absolute pixel coordinates against
/// the image's actual size, clamps to image bounds, and returns the crop.
pub fn crop_region(img: &RgbaImage, zone: &ZoneRect) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = ((zone.x * w as f32) as u32).min(w);
    let y0 = ((zone.y * h as f32) as u32).min(h);
    let rw = ((zone.width * w as f32) as u32).min(w - x0);
    let rh = ((zone.height * h as f32) as u32).min(h - y0);

    imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Enlarges small UI text before recognition.
pub fn upscale(img: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let new_w = ((w as f32 * factor).round() as u32).max(1);
    let new_h = ((h as f32 * factor).round() as u32).max(1);
    imageops::resize(img, new_w, new_h, FilterType::CatmullRom)
}

/// Converts to grayscale and applies a linear contrast gain (saturating).
pub fn grayscale_with_contrast(img: &RgbaImage, gain: f32) -> GrayImage {
    let mut gray = imageops::grayscale(img);
    for pixel in gray.pixels_mut() {
        let boosted = (pixel[0] as f32 * gain).round().clamp(0.0, 255.0);
        *pixel = Luma([boosted as u8]);
    }
    gray
}

/// Converts to a binary mask by keeping only bright pixels.
///
/// Pixels above `threshold` become black (text), all others white.
pub fn threshold_bright_pixels(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if img.get_pixel(x, y)[0] > threshold {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Full chain for one zone: crop, upscale, grayscale, contrast, threshold.
///
/// Returns the upscaled color crop (for debugging) and the binary mask.
pub fn prepare_zone(img: &RgbaImage, zone: &ZoneRect, config: &OcrConfig) -> (RgbaImage, GrayImage) {
    let cropped = crop_region(img, zone);
    if cropped.width() == 0 || cropped.height() == 0 {
        return (cropped, GrayImage::new(0, 0));
    }
    let enlarged = upscale(&cropped, config.scale);
    let gray = grayscale_with_contrast(&enlarged, config.contrast);
    let binary = threshold_bright_pixels(&gray, config.threshold);
    (enlarged, binary)
}
