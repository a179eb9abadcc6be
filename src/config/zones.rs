//! OCR zone sets.
//!
//! A zone set holds, for each field kind, one rectangle per visible
//! leaderboard row. Rectangles are fractions of the frame size so a set
//! calibrated once applies to every normalized frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{RankError, Result};
use crate::store::LeaderboardKind;

/// A rectangle in relative coordinates (0.0 to 1.0).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    #[serde(rename = "x_percent", alias = "x")]
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    #[serde(rename = "y_percent", alias = "y")]
    pub y: f32,
    /// Width as fraction of frame width
    #[serde(rename = "width_percent", alias = "width")]
    pub width: f32,
    /// Height as fraction of frame height
    #[serde(rename = "height_percent", alias = "height")]
    pub height: f32,
}

/// Which field of a leaderboard row a zone covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Rank,
    Name,
    Guild,
    Score,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Rank => "rank",
            FieldKind::Name => "name",
            FieldKind::Guild => "guild",
            FieldKind::Score => "score",
        }
    }

    /// Rank and score are read with the numeric character set.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Rank | FieldKind::Score)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field zone lists; index `i` in every list names the `i`-th visible row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub rank: Vec<ZoneRect>,
    pub name: Vec<ZoneRect>,
    pub guild: Vec<ZoneRect>,
    pub score: Vec<ZoneRect>,
}

impl ZoneSet {
    /// Loads and validates the zone set for `kind` from `path`.
    ///
    /// A missing, unreadable or inconsistent file is reported as missing
    /// configuration so the run stops before any capture.
    pub fn load(kind: LeaderboardKind, path: &Path) -> Result<ZoneSet> {
        if !path.exists() {
            return Err(RankError::config_missing(
                kind.as_str(),
                format!("OCR zone file {} not found", path.display()),
            ));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            RankError::config_missing(
                kind.as_str(),
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        let zones: ZoneSet = serde_json::from_str(&contents).map_err(|e| {
            RankError::config_missing(
                kind.as_str(),
                format!("failed to parse {}: {}", path.display(), e),
            )
        })?;

        zones
            .validate()
            .map_err(|detail| RankError::config_missing(kind.as_str(), detail))?;

        log::info!(
            "Loaded {} OCR rows for {} from {}",
            zones.row_count(),
            kind,
            path.display()
        );
        Ok(zones)
    }

    /// Checks that every field has the same, non-zero number of rows.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let rows = self.rank.len();
        if rows == 0 {
            return Err("zone set defines no rows".to_string());
        }
        for field in [FieldKind::Name, FieldKind::Guild, FieldKind::Score] {
            let len = self.zones(field).len();
            if len != rows {
                return Err(format!(
                    "{} zones define {} rows but rank zones define {}",
                    field, len, rows
                ));
            }
        }
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rank.len()
    }

    pub fn zones(&self, field: FieldKind) -> &[ZoneRect] {
        match field {
            FieldKind::Rank => &self.rank,
            FieldKind::Name => &self.name,
            FieldKind::Guild => &self.guild,
            FieldKind::Score => &self.score,
        }
    }

    pub fn zone(&self, field: FieldKind, row: usize) -> Option<&ZoneRect> {
        self.zones(field).get(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ZONES_JSON: &str = r#"{
        "rank":  [{"x_percent": 0.05, "y_percent": 0.20, "width_percent": 0.10, "height_percent": 0.04}],
        "name":  [{"x_percent": 0.15, "y_percent": 0.20, "width_percent": 0.30, "height_percent": 0.02}],
        "guild": [{"x": 0.15, "y": 0.22, "width": 0.30, "height": 0.02}],
        "score": [{"x_percent": 0.75, "y_percent": 0.20, "width_percent": 0.15, "height_percent": 0.04}]
    }"#;

    #[test]
    fn test_load_accepts_percent_and_short_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dreamland.json");
        fs::write(&path, ZONES_JSON).unwrap();

        let zones = ZoneSet::load(LeaderboardKind::Dreamland, &path).unwrap();
        assert_eq!(zones.row_count(), 1);
        assert_eq!(zones.guild[0].y, 0.22);
        assert_eq!(zones.zone(FieldKind::Score, 0).unwrap().x, 0.75);
        assert!(zones.zone(FieldKind::Score, 1).is_none());
    }

    #[test]
    fn test_missing_file_is_config_missing() {
        let dir = tempdir().unwrap();
        let err = ZoneSet::load(LeaderboardKind::Arena, &dir.path().join("arena.json"))
            .unwrap_err();
        assert!(matches!(err, RankError::ConfigMissing { ref kind, .. } if kind == "arena"));
    }

    #[test]
    fn test_mismatched_row_counts_rejected() {
        let rect = ZoneRect { x: 0.0, y: 0.0, width: 0.1, height: 0.1 };
        let zones = ZoneSet {
            rank: vec![rect, rect],
            name: vec![rect, rect],
            guild: vec![rect],
            score: vec![rect, rect],
        };
        let err = zones.validate().unwrap_err();
        assert!(err.contains("guild"));
    }

    #[test]
    fn test_empty_zone_set_rejected() {
        assert!(ZoneSet::default().validate().is_err());
    }
}
