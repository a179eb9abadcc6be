//! SQLite ranking store.
//!
//! Three tables: `ranking_dates` (one row per captured date and leaderboard
//! type), `players` (identity by exact name, current guild) and `rankings`
//! (rank and score facts linking the two). A single connection serves the
//! writer and the read-only queries.

mod migrations;
pub mod models;
mod queries;
mod rankings;

pub use migrations::CURRENT_SCHEMA_VERSION;
pub use models::{
    GuildMemberRow, HistoryRow, LatestRankingQuery, LatestRankingRow, LeaderboardKind, Snapshot,
};

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::Result;
use migrations::run_migrations;

pub struct RankingStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RankingStore {
    /// Opens (creating if needed) the database file at `path` and migrates it.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        log::info!("Ranking store opened at {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(mut conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        if path.is_some() {
            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                log::error!("Failed to enable WAL mode: {err}");
            }
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&mut conn)?;
        Ok(Self { conn, path })
    }

    /// File backing the store, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deletes every snapshot, ranking and player, and resets id counters.
    pub fn reset(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM rankings;
             DELETE FROM players;
             DELETE FROM ranking_dates;
             DELETE FROM sqlite_sequence;",
        )?;
        tx.commit()?;
        log::warn!("Ranking store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RankError;
    use crate::reconcile::PlayerEntry;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn count(store: &RankingStore, table: &str) -> i64 {
        store
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_open_creates_schema_and_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rankings.db");

        {
            let store = RankingStore::open(&path).unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
            let version: i32 = store
                .conn
                .pragma_query_value(None, "user_version", |row| row.get(0))
                .unwrap();
            assert_eq!(version, CURRENT_SCHEMA_VERSION);
        }

        let store = RankingStore::open(&path).unwrap();
        assert_eq!(count(&store, "players"), 0);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rankings.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", 99).unwrap();
        }

        match RankingStore::open(&path) {
            Err(RankError::SchemaTooNew { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, CURRENT_SCHEMA_VERSION);
            }
            _ => panic!("expected SchemaTooNew"),
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let entries = vec![PlayerEntry {
            rank: 1,
            name: "A".to_string(),
            guild: "G".to_string(),
            score: "10".to_string(),
        }];
        store
            .save_ranking(LeaderboardKind::Dreamland, &entries, day, day.pred_opt().unwrap())
            .unwrap();

        store.reset().unwrap();
        assert_eq!(count(&store, "rankings"), 0);
        assert_eq!(count(&store, "players"), 0);
        assert_eq!(count(&store, "ranking_dates"), 0);

        // Id counters restart
        let id = store
            .save_ranking(LeaderboardKind::Dreamland, &entries, day, day.pred_opt().unwrap())
            .unwrap();
        assert_eq!(id, 1);
    }
}
