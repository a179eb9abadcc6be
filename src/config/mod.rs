//! Configuration types.
//!
//! `AppConfig` is loaded from config.json at startup and carries timing,
//! scroll geometry and OCR parameters. Zone sets and click positions are
//! calibrated per leaderboard type and live in their own files.

pub mod positions;
pub mod zones;

pub use positions::{Point, PositionMap};
pub use zones::{FieldKind, ZoneRect, ZoneSet};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Drag geometry for scrolling the leaderboard, in client-area pixels.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// X position shared by the start and end of every drag
    pub x: f32,
    /// Where each drag starts
    pub start_y: f32,
    /// Where the first drag ends
    pub end_y: f32,
    /// How much further up each subsequent drag ends
    pub end_y_step: f32,
    /// Duration of one drag (milliseconds)
    pub drag_duration_ms: u64,
    /// Pause after a drag before capturing (milliseconds)
    pub settle_delay_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            x: 375.0,
            start_y: 1000.0,
            end_y: 500.0,
            end_y_step: 0.20,
            drag_duration_ms: 500,
            settle_delay_ms: 2000,
        }
    }
}

/// Named clicks performed to reach the leaderboard and to leave it afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub enter: Vec<String>,
    pub exit: Vec<String>,
    /// Wait after each navigation click (milliseconds)
    pub step_delay_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enter: vec![
                "Mode".to_string(),
                "EntrerRoyaumeOnirique".to_string(),
                "EntrerClassementOnirique".to_string(),
            ],
            exit: vec!["Retour".to_string(); 3],
            step_delay_ms: 3000,
        }
    }
}

/// Preprocessing and recognition parameters for zone extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Upscale factor applied to each crop
    pub scale: f32,
    /// Linear contrast gain applied to the grayscale crop
    pub contrast: f32,
    /// Pixels brighter than this become text (black), the rest background
    pub threshold: u8,
    /// Characters allowed when reading rank and score fields
    pub numeric_charset: String,
    /// Tesseract language
    pub language: String,
    /// Write intermediate crops to the debug directory
    pub save_debug_regions: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            scale: 2.5,
            contrast: 1.5,
            threshold: 240,
            numeric_charset: "0123456789M".to_string(),
            language: "eng".to_string(),
            save_debug_regions: true,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Substring of the game window title
    pub window_title: String,
    /// Frames are letterboxed to this size before extraction
    pub canonical_width: u32,
    pub canonical_height: u32,
    /// Number of drags per capture session
    pub scroll_count: u32,
    pub scroll: ScrollConfig,
    /// Pause after activating the window before a capture (milliseconds)
    pub activation_delay_ms: u64,
    /// Pause after a calibrated click (milliseconds)
    pub click_delay_ms: u64,
    /// Frames whose mean brightness is below this are treated as failed captures
    pub black_frame_threshold: f32,
    /// Position clicked once before scrolling so the list starts at the top
    pub reset_position: String,
    pub navigation: NavigationConfig,
    pub ocr: OcrConfig,
    /// Dump every captured frame as PNG
    pub save_frames: bool,
    /// Overrides the default database location
    pub database_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "AFK Journey".to_string(),
            canonical_width: 750,
            canonical_height: 1334,
            scroll_count: 24,
            scroll: ScrollConfig::default(),
            activation_delay_ms: 200,
            click_delay_ms: 1000,
            black_frame_threshold: 5.0,
            reset_position: "J-1".to_string(),
            navigation: NavigationConfig::default(),
            ocr: OcrConfig::default(),
            save_frames: true,
            database_path: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path` or returns defaults.
    pub fn load(path: &Path) -> AppConfig {
        log::info!("Looking for config at: {}", path.display());

        if !path.exists() {
            log::info!("config.json not found. Using default config.");
            return AppConfig::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config.json: {}. Using defaults.", e);
                    AppConfig::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config.json: {}. Using defaults.", e);
                AppConfig::default()
            }
        }
    }

    /// Every position name a capture run will click.
    pub fn required_positions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.push(&self.reset_position);
        names.extend(self.navigation.enter.iter().map(String::as_str));
        names.extend(self.navigation.exit.iter().map(String::as_str));
        names.sort_unstable();
        names.dedup();
        names
    }
}
