//! Calibrated click positions.
//!
//! Positions are client-area pixel coordinates produced by the external
//! calibration tool, stored as `{ "metadata": {...}, "positions": { name: {x, y} } }`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RankError, Result};
use crate::store::LeaderboardKind;

/// A point in client-area pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PositionMap {
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub positions: HashMap<String, Point>,
}

impl PositionMap {
    /// Loads the position map for `kind` and checks that every `required` name is present.
    pub fn load(kind: LeaderboardKind, path: &Path, required: &[&str]) -> Result<PositionMap> {
        if !path.exists() {
            return Err(RankError::config_missing(
                kind.as_str(),
                format!("position file {} not found", path.display()),
            ));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            RankError::config_missing(
                kind.as_str(),
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        let map: PositionMap = serde_json::from_str(&contents).map_err(|e| {
            RankError::config_missing(
                kind.as_str(),
                format!("failed to parse {}: {}", path.display(), e),
            )
        })?;

        map.check_required(kind, required)?;
        log::info!("Loaded {} positions for {}", map.positions.len(), kind);
        Ok(map)
    }

    pub fn check_required(&self, kind: LeaderboardKind, required: &[&str]) -> Result<()> {
        let mut missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !self.positions.contains_key(*name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(RankError::config_missing(
            kind.as_str(),
            format!("missing positions: {}", missing.join(", ")),
        ))
    }

    pub fn get(&self, name: &str) -> Option<Point> {
        self.positions.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_position_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dreamland.json");
        fs::write(
            &path,
            r#"{
                "metadata": {"ranking_type": "dreamland", "version": "1.0.0"},
                "positions": {"J-1": {"x": 600, "y": 180}, "Retour": {"x": 40, "y": 60}}
            }"#,
        )
        .unwrap();

        let map = PositionMap::load(LeaderboardKind::Dreamland, &path, &["J-1", "Retour"]).unwrap();
        assert_eq!(map.get("J-1"), Some(Point::new(600.0, 180.0)));
        assert_eq!(map.get("Mode"), None);
    }

    #[test]
    fn test_missing_required_position() {
        let mut map = PositionMap::default();
        map.positions.insert("J-1".to_string(), Point::new(1.0, 2.0));

        let err = map
            .check_required(LeaderboardKind::Dreamland, &["J-1", "Retour", "Mode"])
            .unwrap_err();
        match err {
            RankError::ConfigMissing { detail, .. } => {
                assert_eq!(detail, "missing positions: Mode, Retour")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
