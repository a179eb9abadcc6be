//! Entry reconciliation.
//!
//! Consecutive frames of a scroll session overlap, so the same rank is usually
//! seen more than once. Rank is the deduplication key and the first frame that
//! yields a valid row for a rank wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::capture::Frame;
use crate::config::{FieldKind, ZoneRect, ZoneSet};
use crate::ocr::digits_only;

/// Reads one field of one row from a frame; an empty string means nothing was read.
pub trait ZoneReader {
    fn read_zone(&self, frame: &Frame, field: FieldKind, row: usize, zone: &ZoneRect) -> String;
}

/// One row as read from a frame, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEntry {
    pub rank: Option<u32>,
    pub name: String,
    pub guild: String,
    pub score: String,
}

impl RawEntry {
    /// Validates the row: a positive rank and a non-empty name are required.
    /// A score without digits becomes "0".
    pub fn into_player(self) -> Option<PlayerEntry> {
        let rank = self.rank.filter(|r| *r > 0)?;
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let score = digits_only(&self.score);
        Some(PlayerEntry {
            rank,
            name: name.to_string(),
            guild: self.guild.trim().to_string(),
            score: if score.is_empty() {
                "0".to_string()
            } else {
                score
            },
        })
    }
}

/// A validated leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub rank: u32,
    pub name: String,
    pub guild: String,
    pub score: String,
}

fn parse_rank(text: &str) -> Option<u32> {
    digits_only(text).parse().ok()
}

/// Reads one row of a frame. Returns `None` without reading the other fields
/// when the rank zone yields no number.
fn read_row(frame: &Frame, zones: &ZoneSet, row: usize, reader: &dyn ZoneReader) -> Option<RawEntry> {
    let read = |field: FieldKind| {
        zones
            .zone(field, row)
            .map(|zone| reader.read_zone(frame, field, row, zone))
            .unwrap_or_default()
    };

    let rank = parse_rank(&read(FieldKind::Rank))?;
    Some(RawEntry {
        rank: Some(rank),
        name: read(FieldKind::Name),
        guild: read(FieldKind::Guild),
        score: read(FieldKind::Score),
    })
}

/// Merges the rows of all frames into one rank-ordered list.
pub fn reconcile(frames: &[Frame], zones: &ZoneSet, reader: &dyn ZoneReader) -> Vec<PlayerEntry> {
    let mut by_rank: BTreeMap<u32, PlayerEntry> = BTreeMap::new();

    for frame in frames {
        for row in 0..zones.row_count() {
            let Some(raw) = read_row(frame, zones, row, reader) else {
                log::debug!("Frame {} row {}: no rank, skipped", frame.index, row + 1);
                continue;
            };

            let Some(player) = raw.into_player() else {
                log::debug!("Frame {} row {}: incomplete entry dropped", frame.index, row + 1);
                continue;
            };

            if let Some(existing) = by_rank.get(&player.rank) {
                log::debug!(
                    "Rank {} already read as {:?}, ignoring {:?}",
                    player.rank,
                    existing.name,
                    player.name
                );
                continue;
            }
            by_rank.insert(player.rank, player);
        }
    }

    log::info!(
        "Reconciled {} entries from {} frames",
        by_rank.len(),
        frames.len()
    );
    by_rank.into_values().collect()
}
