//! Capture pipeline: configuration → navigation → session → OCR → store.
//!
//! Configuration is checked before the game window is touched, and nothing is
//! written to the ranking store unless the whole session succeeded and at
//! least one entry was read.

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::automation::session::{CaptureSession, SessionSettings};
use crate::capture::frame::{load_frames, save_frames};
use crate::capture::{WindowAutomation, WindowHandle};
use crate::config::{AppConfig, PositionMap, ZoneSet};
use crate::error::{CaptureFailure, RankError, Result};
use crate::ocr::{TextRecognizer, ZoneExtractor};
use crate::reconcile::{reconcile, PlayerEntry};
use crate::store::{LeaderboardKind, RankingStore, Snapshot};

/// Files and directories used by one capture run.
#[derive(Clone, Debug)]
pub struct CapturePaths {
    pub zones: PathBuf,
    pub positions: PathBuf,
    /// Where frames are dumped, `None` to skip
    pub captures_dir: Option<PathBuf>,
    /// Where intermediate OCR crops go, `None` to skip
    pub debug_dir: Option<PathBuf>,
}

impl CapturePaths {
    /// Default executable-relative locations for `kind`.
    pub fn for_kind(kind: LeaderboardKind, config: &AppConfig) -> Self {
        Self {
            zones: crate::paths::get_zones_path(kind),
            positions: crate::paths::get_mapping_path(kind),
            captures_dir: config.save_frames.then(crate::paths::get_captures_dir),
            debug_dir: config
                .ocr
                .save_debug_regions
                .then(crate::paths::get_debug_regions_dir),
        }
    }
}

pub struct Pipeline<'a> {
    pub config: &'a AppConfig,
    pub automation: &'a dyn WindowAutomation,
    pub recognizer: &'a dyn TextRecognizer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        automation: &'a dyn WindowAutomation,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        Self {
            config,
            automation,
            recognizer,
        }
    }

    /// Captures `kind` with the default file locations and today's date.
    pub fn run_capture(
        &self,
        store: &mut RankingStore,
        kind: LeaderboardKind,
        scroll_count: Option<u32>,
    ) -> Result<Snapshot> {
        let paths = CapturePaths::for_kind(kind, self.config);
        self.run_capture_with(store, kind, scroll_count, &paths, Local::now().date_naive())
    }

    pub fn run_capture_with(
        &self,
        store: &mut RankingStore,
        kind: LeaderboardKind,
        scroll_count: Option<u32>,
        paths: &CapturePaths,
        today: NaiveDate,
    ) -> Result<Snapshot> {
        let zones = ZoneSet::load(kind, &paths.zones)?;
        let positions = PositionMap::load(kind, &paths.positions, &self.config.required_positions())?;
        let reset_point = positions.get(&self.config.reset_position).ok_or_else(|| {
            RankError::config_missing(
                kind.as_str(),
                format!("missing positions: {}", self.config.reset_position),
            )
        })?;

        let settings = SessionSettings::from_config(self.config, reset_point);
        let session = CaptureSession::attach(self.automation, &self.config.window_title, settings)?;
        let handle = session.handle();

        log::info!("Opening the {} leaderboard", kind);
        self.navigate(handle, &positions, &self.config.navigation.enter)?;

        let scroll_count = scroll_count.unwrap_or(self.config.scroll_count);
        let frames = session.run(scroll_count)?;

        if let Err(e) = self.navigate(handle, &positions, &self.config.navigation.exit) {
            log::warn!("Could not leave the leaderboard: {}", e);
        }

        if let Some(dir) = &paths.captures_dir {
            match save_frames(&frames, dir, &format!("{}_capture", kind)) {
                Ok(saved) => log::info!("Saved {} frames to {}", saved.len(), dir.display()),
                Err(e) => log::warn!("Failed to save frames: {:#}", e),
            }
        }

        let extractor = ZoneExtractor::new(self.recognizer, &self.config.ocr)
            .with_debug_dir(paths.debug_dir.clone());
        let entries = reconcile(&frames, &zones, &extractor);
        if entries.is_empty() {
            return Err(CaptureFailure::NoEntries.into());
        }

        let date_ref = today.pred_opt().unwrap_or(today);
        store.save_ranking(kind, &entries, today, date_ref)?;

        Ok(Snapshot {
            kind,
            date: today,
            date_ref,
            entries,
        })
    }

    /// Clicks each named position in order, waiting after every click.
    fn navigate(&self, handle: WindowHandle, positions: &PositionMap, steps: &[String]) -> Result<()> {
        let delay = Duration::from_millis(self.config.navigation.step_delay_ms);
        for name in steps {
            let point = positions.get(name).ok_or_else(|| {
                RankError::config_missing("navigation", format!("missing positions: {}", name))
            })?;
            log::debug!("Navigation click: {}", name);
            self.automation
                .click(handle, point)
                .map_err(|e| CaptureFailure::Automation {
                    action: "navigation click",
                    source: e,
                })?;
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

/// Re-reads frames saved by an earlier run (PNG files in `dir`, by file name).
pub fn extract_saved_frames(
    dir: &Path,
    zones: &ZoneSet,
    config: &AppConfig,
    recognizer: &dyn TextRecognizer,
    debug_dir: Option<PathBuf>,
) -> Result<Vec<PlayerEntry>> {
    let frames = load_frames(dir, config.canonical_width, config.canonical_height)
        .map_err(|e| RankError::Io(std::io::Error::other(format!("{:#}", e))))?;
    log::info!("Loaded {} frames from {}", frames.len(), dir.display());

    let extractor = ZoneExtractor::new(recognizer, &config.ocr).with_debug_dir(debug_dir);
    Ok(reconcile(&frames, zones, &extractor))
}
