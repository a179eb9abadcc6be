//! Zone extraction: one frame plus one calibrated rectangle in, one text token out.
//!
//! Extraction is best-effort. Any failure along the way (empty crop, Tesseract
//! error, nothing recognized) yields an empty string, which the reconciler
//! treats as a missing field.

use anyhow::{Context, Result};
use image::{GrayImage, RgbaImage};
use std::path::{Path, PathBuf};

use super::engine::{Charset, TextRecognizer};
use super::preprocess::prepare_zone;
use crate::capture::Frame;
use crate::config::{FieldKind, OcrConfig, ZoneRect};
use crate::reconcile::ZoneReader;

/// Keeps ASCII digits only ("12M" -> "12").
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub struct ZoneExtractor<'a> {
    recognizer: &'a dyn TextRecognizer,
    config: OcrConfig,
    debug_dir: Option<PathBuf>,
}

impl<'a> ZoneExtractor<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, config: &OcrConfig) -> Self {
        let debug_dir = config
            .save_debug_regions
            .then(crate::paths::get_debug_regions_dir);
        Self {
            recognizer,
            config: config.clone(),
            debug_dir,
        }
    }

    /// Overrides where intermediate crops are written (`None` disables them).
    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    /// Reads the text inside `zone`. Numeric zones return digits only.
    pub fn extract(&self, img: &RgbaImage, zone: &ZoneRect, numeric: bool) -> String {
        let label = if numeric { "numeric" } else { "text" };
        self.extract_labeled(img, zone, numeric, label)
    }

    fn extract_labeled(&self, img: &RgbaImage, zone: &ZoneRect, numeric: bool, label: &str) -> String {
        match self.try_extract(img, zone, numeric, label) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("OCR failed for {} zone: {:#}", label, e);
                String::new()
            }
        }
    }

    fn try_extract(&self, img: &RgbaImage, zone: &ZoneRect, numeric: bool, label: &str) -> Result<String> {
        let (enlarged, binary) = prepare_zone(img, zone, &self.config);
        if binary.width() == 0 || binary.height() == 0 {
            return Ok(String::new());
        }

        let charset = if numeric { Charset::Numeric } else { Charset::Any };
        let lines = self.recognizer.recognize(&binary, charset)?;

        if let Some(dir) = &self.debug_dir {
            if let Err(e) = save_debug_images(dir, label, &enlarged, &binary) {
                log::warn!("Could not save debug images for {}: {:#}", label, e);
            }
        }

        let first = lines
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        Ok(if numeric {
            digits_only(first)
        } else {
            first.to_string()
        })
    }
}

impl ZoneReader for ZoneExtractor<'_> {
    fn read_zone(&self, frame: &Frame, field: FieldKind, _row: usize, zone: &ZoneRect) -> String {
        self.extract_labeled(&frame.image, zone, field.is_numeric(), field.as_str())
    }
}

/// Diagnostic dump of the enlarged crop and its binary mask.
fn save_debug_images(
    dir: &Path,
    label: &str,
    original: &RgbaImage,
    binary: &GrayImage,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    original.save(dir.join(format!("original_{}.png", label)))?;
    binary.save(dir.join(format!("binary_{}.png", label)))?;
    Ok(())
}
