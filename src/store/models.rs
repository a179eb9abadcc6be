use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RankError;
use crate::reconcile::PlayerEntry;

/// Logical leaderboard a snapshot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    Dreamland,
    Arena,
    SupremeArena,
    Guild,
}

impl LeaderboardKind {
    pub const ALL: [LeaderboardKind; 4] = [
        LeaderboardKind::Dreamland,
        LeaderboardKind::Arena,
        LeaderboardKind::SupremeArena,
        LeaderboardKind::Guild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::Dreamland => "dreamland",
            LeaderboardKind::Arena => "arena",
            LeaderboardKind::SupremeArena => "supreme_arena",
            LeaderboardKind::Guild => "guild",
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardKind {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LeaderboardKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| RankError::UnknownLeaderboard(s.to_string()))
    }
}

impl ToSql for LeaderboardKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LeaderboardKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: RankError| FromSqlError::Other(Box::new(e)))
    }
}

/// A reconciled leaderboard, tagged with the day it was captured and the
/// in-game day its standings reflect.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub kind: LeaderboardKind,
    pub date: NaiveDate,
    pub date_ref: NaiveDate,
    pub entries: Vec<PlayerEntry>,
}

/// Parameters of `RankingStore::latest_ranking`.
#[derive(Clone, Debug)]
pub struct LatestRankingQuery {
    pub kind: LeaderboardKind,
    pub limit: u32,
    /// Case-insensitive substring match on the guild
    pub guild: Option<String>,
    /// Reference date to show instead of the most recent one
    pub target_date: Option<NaiveDate>,
}

impl LatestRankingQuery {
    pub fn new(kind: LeaderboardKind) -> Self {
        Self {
            kind,
            limit: 100,
            guild: None,
            target_date: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn guild(mut self, guild: impl Into<String>) -> Self {
        self.guild = Some(guild.into());
        self
    }

    pub fn target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LatestRankingRow {
    pub rank: u32,
    pub name: String,
    pub guild: String,
    pub score: String,
    /// Previous rank minus current rank; positive means the player climbed
    pub rank_change: i64,
    pub avg_rank: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryRow {
    /// Reference date of the snapshot
    pub date: NaiveDate,
    pub kind: LeaderboardKind,
    pub rank: u32,
    pub score: String,
    /// Mean rank over the 30 days up to `date`, one decimal
    pub avg_rank: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GuildMemberRow {
    pub name: String,
    pub guild: String,
    pub kind: LeaderboardKind,
    pub rank: u32,
    pub score: String,
    /// Capture date of the record
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in LeaderboardKind::ALL {
            assert_eq!(kind.as_str().parse::<LeaderboardKind>().unwrap(), kind);
        }
        assert_eq!(
            " Supreme_Arena ".parse::<LeaderboardKind>().unwrap(),
            LeaderboardKind::SupremeArena
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "raid".parse::<LeaderboardKind>().unwrap_err();
        assert!(matches!(err, RankError::UnknownLeaderboard(ref s) if s == "raid"));
    }

    #[test]
    fn test_kind_serializes_as_stored_string() {
        assert_eq!(
            serde_json::to_string(&LeaderboardKind::SupremeArena).unwrap(),
            "\"supreme_arena\""
        );
    }

    #[test]
    fn test_snapshot_serializes_dates_as_iso_strings() {
        let snapshot = Snapshot {
            kind: LeaderboardKind::Dreamland,
            date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            date_ref: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            entries: vec![PlayerEntry {
                rank: 1,
                name: "Alice".to_string(),
                guild: "G1".to_string(),
                score: "100".to_string(),
            }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["kind"], "dreamland");
        assert_eq!(json["date"], "2024-06-02");
        assert_eq!(json["date_ref"], "2024-06-01");
        assert_eq!(json["entries"][0]["name"], "Alice");

        let row = HistoryRow {
            date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            kind: LeaderboardKind::Arena,
            rank: 2,
            score: "9".to_string(),
            avg_rank: 6.0,
        };
        assert_eq!(serde_json::to_value(&row).unwrap()["date"], "2024-05-31");
    }
}
