use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::process::Command;
use tempfile::tempdir;

use super::setup::{ensure_tesseract, TesseractPaths};
use crate::config::OcrConfig;

/// Character restriction for one recognition call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    /// Unrestricted recognition (names, guilds)
    Any,
    /// Digits plus the thousands suffix (ranks, scores)
    Numeric,
}

/// Turns a preprocessed crop into recognized lines of text, top to bottom.
pub trait TextRecognizer {
    fn recognize(&self, img: &GrayImage, charset: Charset) -> Result<Vec<String>>;
}

/// Tesseract run as a child process, one call per crop.
///
/// Created once per process and shared by reference with the extractor.
pub struct TesseractEngine {
    paths: TesseractPaths,
    language: String,
    numeric_charset: String,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, config: &OcrConfig) -> Self {
        Self {
            paths,
            language: config.language.clone(),
            numeric_charset: config.numeric_charset.clone(),
        }
    }

    /// Locates Tesseract (downloading trained data if needed) and builds an engine.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let paths = ensure_tesseract(&config.language)?;
        Ok(Self::new(paths, config))
    }

    /// Recognizes `img` as a single text line and returns the lines Tesseract
    /// reported, top to bottom.
    pub fn recognize_lines(&self, img: &GrayImage, charset: Charset) -> Result<Vec<String>> {
        let work_dir = tempdir().context("Failed to create OCR work directory")?;
        let input = work_dir.path().join("crop.png");
        let output_base = work_dir.path().join("result");
        img.save(&input).context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.paths.executable);
        command
            .arg(&input)
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.paths.tessdata)
            .args(["-l", self.language.as_str(), "--psm", "7"]);
        if charset == Charset::Numeric {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={}", self.numeric_charset));
        }
        let run = command.arg("tsv").output().with_context(|| {
            format!("Failed to launch {}", self.paths.executable.display())
        })?;
        if !run.status.success() {
            return Err(anyhow!(
                "Tesseract exited with {}: {}",
                run.status,
                String::from_utf8_lossy(&run.stderr).trim()
            ));
        }

        // Tesseract appends the config name to the output base
        let tsv = std::fs::read_to_string(output_base.with_extension("tsv"))
            .context("Tesseract produced no TSV output")?;
        Ok(parse_tsv_output(&tsv))
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, img: &GrayImage, charset: Charset) -> Result<Vec<String>> {
        self.recognize_lines(img, charset)
    }
}

/// Parses Tesseract TSV output into text lines.
///
/// Only word rows (level 5) with a non-negative confidence are kept; words are
/// grouped by (block, paragraph, line) and joined with single spaces.
pub fn parse_tsv_output(tsv: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<&str> = Vec::new();

    // Skip header
    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // level page block par line word left top width height conf text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();
        if level != 5 || text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        if current_key.is_some_and(|k| k != key) {
            lines.push(current_words.join(" "));
            current_words.clear();
        }
        current_key = Some(key);
        current_words.push(text);
    }
    if !current_words.is_empty() {
        lines.push(current_words.join(" "));
    }

    lines
}
