//! Frame normalization.
//!
//! Raw captures come in whatever size the window currently has. Every frame is
//! scaled (aspect preserved) into a fixed canonical canvas and centered on a
//! black background so one zone calibration fits all frames.

use anyhow::{Context, Result};
use chrono::Local;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// A normalized capture taken at one moment of a scroll session.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Position in the session (0 = capture before the first scroll)
    pub index: usize,
    pub image: RgbaImage,
}

impl Frame {
    /// Normalizes a raw capture into a frame.
    pub fn from_raw(index: usize, raw: &RgbaImage, width: u32, height: u32) -> Self {
        Self {
            index,
            image: letterbox(raw, width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Scales `img` to fit `target_width` x `target_height`, centered on black.
pub fn letterbox(img: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(target_width, target_height, Rgba([0, 0, 0, 255]));

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return canvas;
    }

    let current_ratio = w as f64 / h as f64;
    let target_ratio = target_width as f64 / target_height as f64;

    let (new_width, new_height) = if current_ratio > target_ratio {
        // Wider than the target: fit width
        let new_height = (target_width as f64 / current_ratio).round() as u32;
        (target_width, new_height.clamp(1, target_height))
    } else {
        let new_width = (target_height as f64 * current_ratio).round() as u32;
        (new_width.clamp(1, target_width), target_height)
    };

    let resized = imageops::resize(img, new_width, new_height, FilterType::Triangle);
    let x_offset = (target_width - new_width) / 2;
    let y_offset = (target_height - new_height) / 2;
    imageops::replace(&mut canvas, &resized, x_offset as i64, y_offset as i64);

    canvas
}

/// Client-area rectangle inside a captured window texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientCrop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Converts a BGRA texture (rows `row_pitch` bytes apart) into an RGBA image
/// of the `crop` area. Pixels outside the texture stay transparent black.
pub fn bgra_to_rgba(
    data: &[u8],
    row_pitch: usize,
    (tex_width, tex_height): (u32, u32),
    crop: ClientCrop,
) -> RgbaImage {
    let mut img = RgbaImage::new(crop.width, crop.height);
    let rows = crop.height.min(tex_height.saturating_sub(crop.y));
    let cols = crop.width.min(tex_width.saturating_sub(crop.x));

    for y in 0..rows {
        let row_start = (crop.y + y) as usize * row_pitch + crop.x as usize * 4;
        let Some(row) = data.get(row_start..row_start + cols as usize * 4) else {
            break;
        };
        for (x, bgra) in row.chunks_exact(4).enumerate() {
            img.put_pixel(x as u32, y, Rgba([bgra[2], bgra[1], bgra[0], bgra[3]]));
        }
    }
    img
}

/// Writes frames as `<prefix>_<timestamp>_<n>.png` into `dir`.
pub fn save_frames(frames: &[Frame], dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create capture directory {}", dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut paths = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = dir.join(format!("{}_{}_{:03}.png", prefix, timestamp, frame.index + 1));
        frame
            .image
            .save(&path)
            .with_context(|| format!("Failed to save frame {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Loads every PNG in `dir`, ordered by file name, as normalized frames.
pub fn load_frames(dir: &Path, width: u32, height: u32) -> Result<Vec<Frame>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let raw = image::open(path)
            .with_context(|| format!("Failed to load {}", path.display()))?
            .to_rgba8();
        frames.push(Frame::from_raw(index, &raw, width, height));
    }
    Ok(frames)
}
