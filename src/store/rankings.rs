use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{LeaderboardKind, RankingStore};
use crate::error::Result;
use crate::reconcile::PlayerEntry;

impl RankingStore {
    /// Stores `entries` as the snapshot for (`date`, `kind`).
    ///
    /// An existing snapshot for the same pair keeps its row (its reference date
    /// is updated) but all of its rankings are replaced. Players are matched by
    /// exact name; a changed guild overwrites the stored one. Everything runs
    /// in one transaction: on error nothing is changed.
    ///
    /// Returns the snapshot row id.
    pub fn save_ranking(
        &mut self,
        kind: LeaderboardKind,
        entries: &[PlayerEntry],
        date: NaiveDate,
        date_ref: NaiveDate,
    ) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM ranking_dates WHERE date = ?1 AND type = ?2",
                params![date, kind],
                |row| row.get(0),
            )
            .optional()?;

        let ranking_date_id = match existing {
            Some(id) => {
                log::info!("Replacing {} ranking for {}", kind, date);
                tx.execute(
                    "UPDATE ranking_dates SET date_j1 = ?1 WHERE id = ?2",
                    params![date_ref, id],
                )?;
                id
            }
            None => {
                log::info!("Creating {} ranking for {}", kind, date);
                tx.execute(
                    "INSERT INTO ranking_dates (date, type, date_j1) VALUES (?1, ?2, ?3)",
                    params![date, kind, date_ref],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "DELETE FROM rankings WHERE ranking_date_id = ?1",
            params![ranking_date_id],
        )?;

        {
            let mut insert_player =
                tx.prepare("INSERT OR IGNORE INTO players (name, guild) VALUES (?1, ?2)")?;
            let mut select_player = tx.prepare("SELECT id FROM players WHERE name = ?1")?;
            let mut update_guild =
                tx.prepare("UPDATE players SET guild = ?1 WHERE id = ?2 AND guild IS NOT ?1")?;
            let mut insert_ranking = tx.prepare(
                "INSERT INTO rankings (ranking_date_id, player_id, rank, score)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for entry in entries {
                insert_player.execute(params![entry.name, entry.guild])?;
                let player_id: i64 =
                    select_player.query_row(params![entry.name], |row| row.get(0))?;
                if update_guild.execute(params![entry.guild, player_id])? > 0 {
                    log::debug!("{} moved to guild {:?}", entry.name, entry.guild);
                }
                insert_ranking.execute(params![ranking_date_id, player_id, entry.rank, entry.score])?;
            }
        }

        tx.commit()?;
        log::info!(
            "Saved {} {} entries for {} (reference {})",
            entries.len(),
            kind,
            date,
            date_ref
        );
        Ok(ranking_date_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn entry(rank: u32, name: &str, guild: &str, score: &str) -> PlayerEntry {
        PlayerEntry {
            rank,
            name: name.to_string(),
            guild: guild.to_string(),
            score: score.to_string(),
        }
    }

    fn snapshot_rows(store: &RankingStore, id: i64) -> Vec<(u32, String, String)> {
        let mut stmt = store
            .conn
            .prepare(
                "SELECT r.rank, p.name, r.score FROM rankings r
                 JOIN players p ON p.id = r.player_id
                 WHERE r.ranking_date_id = ?1 ORDER BY r.rank",
            )
            .unwrap();
        stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    fn player_names(store: &RankingStore) -> Vec<String> {
        let mut stmt = store
            .conn
            .prepare("SELECT name FROM players ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_resave_replaces_records_but_keeps_players() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let kind = LeaderboardKind::Dreamland;

        let first = store
            .save_ranking(
                kind,
                &[entry(1, "A", "G", "10"), entry(2, "B", "G", "9")],
                day(2),
                day(1),
            )
            .unwrap();
        let second = store
            .save_ranking(kind, &[entry(1, "C", "G", "12")], day(2), day(1))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            snapshot_rows(&store, second),
            vec![(1, "C".to_string(), "12".to_string())]
        );
        assert_eq!(player_names(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_resave_updates_reference_date_in_place() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let kind = LeaderboardKind::Arena;
        let id = store.save_ranking(kind, &[entry(1, "A", "G", "1")], day(3), day(2)).unwrap();
        store.save_ranking(kind, &[entry(1, "A", "G", "1")], day(3), day(1)).unwrap();

        let date_ref: NaiveDate = store
            .conn
            .query_row(
                "SELECT date_j1 FROM ranking_dates WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(date_ref, day(1));
    }

    #[test]
    fn test_same_date_other_kind_is_a_separate_snapshot() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let a = store
            .save_ranking(LeaderboardKind::Dreamland, &[entry(1, "A", "G", "1")], day(3), day(2))
            .unwrap();
        let b = store
            .save_ranking(LeaderboardKind::Arena, &[entry(1, "B", "G", "1")], day(3), day(2))
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(snapshot_rows(&store, a).len(), 1);
        assert_eq!(snapshot_rows(&store, b).len(), 1);
    }

    #[test]
    fn test_guild_is_overwritten_on_new_sighting() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let kind = LeaderboardKind::Dreamland;
        store.save_ranking(kind, &[entry(1, "A", "Old", "1")], day(2), day(1)).unwrap();
        store.save_ranking(kind, &[entry(1, "A", "New", "1")], day(3), day(2)).unwrap();

        let guild: String = store
            .conn
            .query_row("SELECT guild FROM players WHERE name = 'A'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(guild, "New");
        assert_eq!(player_names(&store), vec!["A"]);
    }

    #[test]
    fn test_failed_save_rolls_back_and_keeps_previous_snapshot() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let kind = LeaderboardKind::Dreamland;
        let id = store
            .save_ranking(kind, &[entry(1, "A", "G", "10")], day(2), day(1))
            .unwrap();

        // Duplicate rank violates UNIQUE(ranking_date_id, rank)
        let result = store.save_ranking(
            kind,
            &[entry(1, "X", "G", "5"), entry(1, "Y", "G", "4")],
            day(2),
            day(1),
        );
        assert!(matches!(result, Err(crate::error::RankError::Persistence(_))));

        assert_eq!(
            snapshot_rows(&store, id),
            vec![(1, "A".to_string(), "10".to_string())]
        );
        assert_eq!(player_names(&store), vec!["A"]);
    }
}
