use chrono::{Days, Local, NaiveDate};
use rusqlite::params;

use super::{
    GuildMemberRow, HistoryRow, LatestRankingQuery, LatestRankingRow, LeaderboardKind,
    RankingStore,
};
use crate::error::Result;

/// Length of the rolling window used for average ranks.
const AVG_WINDOW_DAYS: u64 = 30;

const LATEST_RANKING_SQL: &str = "
    WITH current_date_row AS (
        SELECT id, date_j1
        FROM ranking_dates
        WHERE type = ?1 AND (?2 IS NULL OR date_j1 = ?2)
        ORDER BY date_j1 DESC, date DESC
        LIMIT 1
    ),
    previous_date_row AS (
        SELECT id
        FROM ranking_dates
        WHERE type = ?1 AND date_j1 < (SELECT date_j1 FROM current_date_row)
        ORDER BY date_j1 DESC, date DESC
        LIMIT 1
    ),
    avg_ranks AS (
        SELECT r.player_id, AVG(r.rank) AS avg_rank
        FROM rankings r
        JOIN ranking_dates rd ON rd.id = r.ranking_date_id
        WHERE rd.type = ?1 AND rd.date_j1 >= ?3
        GROUP BY r.player_id
    )
    SELECT r.rank,
           p.name,
           p.guild,
           r.score,
           COALESCE(prev_r.rank - r.rank, 0) AS rank_change,
           COALESCE(avg_r.avg_rank, r.rank) AS avg_rank
    FROM rankings r
    JOIN players p ON p.id = r.player_id
    LEFT JOIN rankings prev_r
        ON prev_r.player_id = r.player_id
        AND prev_r.ranking_date_id = (SELECT id FROM previous_date_row)
    LEFT JOIN avg_ranks avg_r ON avg_r.player_id = r.player_id
    WHERE r.ranking_date_id = (SELECT id FROM current_date_row)
      AND (?4 IS NULL OR instr(LOWER(p.guild), LOWER(?4)) > 0)
    ORDER BY r.rank
    LIMIT ?5";

const PLAYER_HISTORY_SQL: &str = "
    SELECT rd.date_j1,
           rd.type,
           r.rank,
           r.score,
           (SELECT ROUND(AVG(r2.rank), 1)
            FROM rankings r2
            JOIN ranking_dates rd2 ON rd2.id = r2.ranking_date_id
            WHERE r2.player_id = r.player_id
              AND rd2.type = rd.type
              AND rd2.date_j1 BETWEEN date(rd.date_j1, '-30 days') AND rd.date_j1
           ) AS avg_rank
    FROM rankings r
    JOIN ranking_dates rd ON rd.id = r.ranking_date_id
    JOIN players p ON p.id = r.player_id
    WHERE p.name = ?1
    ORDER BY rd.date_j1 DESC, rd.date DESC
    LIMIT ?2";

const GUILD_MEMBERS_SQL: &str = "
    WITH last_rankings AS (
        SELECT p.name,
               p.guild,
               rd.type,
               r.rank,
               r.score,
               rd.date,
               ROW_NUMBER() OVER (
                   PARTITION BY p.id
                   ORDER BY rd.date DESC, rd.date_j1 DESC, rd.id DESC
               ) AS rn
        FROM players p
        JOIN rankings r ON r.player_id = p.id
        JOIN ranking_dates rd ON rd.id = r.ranking_date_id
        WHERE p.guild = ?1 AND (?2 IS NULL OR rd.type = ?2)
    )
    SELECT name, guild, type, rank, score, date
    FROM last_rankings
    WHERE rn = 1
    ORDER BY rank, name";

impl RankingStore {
    /// Most recent standings of `query.kind`, with day-over-day rank change and
    /// a 30-day average rank anchored on today.
    pub fn latest_ranking(&self, query: &LatestRankingQuery) -> Result<Vec<LatestRankingRow>> {
        self.latest_ranking_as_of(query, Local::now().date_naive())
    }

    /// Same as `latest_ranking` with an explicit "today" for the average window.
    ///
    /// The window always ends at `today`, also when `target_date` selects an
    /// older snapshot.
    pub fn latest_ranking_as_of(
        &self,
        query: &LatestRankingQuery,
        today: NaiveDate,
    ) -> Result<Vec<LatestRankingRow>> {
        let window_start = today
            .checked_sub_days(Days::new(AVG_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let guild = query.guild.as_deref().map(str::trim).filter(|g| !g.is_empty());

        let mut stmt = self.conn.prepare(LATEST_RANKING_SQL)?;
        let rows = stmt
            .query_map(
                params![query.kind, query.target_date, window_start, guild, query.limit],
                |row| {
                    Ok(LatestRankingRow {
                        rank: row.get(0)?,
                        name: row.get(1)?,
                        guild: row.get(2)?,
                        score: row.get(3)?,
                        rank_change: row.get(4)?,
                        avg_rank: row.get(5)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        log::debug!("Latest {} ranking: {} rows", query.kind, rows.len());
        Ok(rows)
    }

    /// Up to `limit` most recent records of a player (exact name), newest first,
    /// each with the average rank over the 30 days before its own reference date.
    pub fn player_history(&self, name: &str, limit: u32) -> Result<Vec<HistoryRow>> {
        let mut stmt = self.conn.prepare(PLAYER_HISTORY_SQL)?;
        let rows = stmt
            .query_map(params![name, limit], |row| {
                let rank: u32 = row.get(2)?;
                let avg_rank: Option<f64> = row.get(4)?;
                Ok(HistoryRow {
                    date: row.get(0)?,
                    kind: row.get(1)?,
                    rank,
                    score: row.get(3)?,
                    avg_rank: avg_rank.unwrap_or(rank as f64),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most recent record of every player whose current guild is exactly
    /// `guild`, optionally restricted to one leaderboard type, ordered by rank.
    pub fn guild_members(
        &self,
        guild: &str,
        kind: Option<LeaderboardKind>,
    ) -> Result<Vec<GuildMemberRow>> {
        let mut stmt = self.conn.prepare(GUILD_MEMBERS_SQL)?;
        let rows = stmt
            .query_map(params![guild, kind], |row| {
                Ok(GuildMemberRow {
                    name: row.get(0)?,
                    guild: row.get(1)?,
                    kind: row.get(2)?,
                    rank: row.get(3)?,
                    score: row.get(4)?,
                    date: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::PlayerEntry;

    const KIND: LeaderboardKind = LeaderboardKind::Dreamland;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn entry(rank: u32, name: &str, guild: &str) -> PlayerEntry {
        PlayerEntry {
            rank,
            name: name.to_string(),
            guild: guild.to_string(),
            score: (1000 - rank).to_string(),
        }
    }

    /// Saves a capture taken on `d` (reference date `d - 1`).
    fn save(store: &mut RankingStore, kind: LeaderboardKind, d: NaiveDate, entries: &[PlayerEntry]) {
        store
            .save_ranking(kind, entries, d, d.pred_opt().unwrap())
            .unwrap();
    }

    #[test]
    fn test_latest_on_empty_store_is_empty() {
        let store = RankingStore::open_in_memory().unwrap();
        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND), day(10))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_latest_computes_rank_change() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(1, "A", "G"), entry(5, "B", "G")]);
        save(&mut store, KIND, day(3), &[entry(2, "A", "G"), entry(3, "B", "G"), entry(1, "New", "H")]);

        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND), day(3))
            .unwrap();
        let summary: Vec<(&str, u32, i64)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.rank, r.rank_change))
            .collect();
        assert_eq!(summary, vec![("New", 1, 0), ("A", 2, -1), ("B", 3, 2)]);
        assert_eq!(rows[0].score, "999");
    }

    #[test]
    fn test_latest_average_uses_window_ending_today() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(4, "A", "G")]);
        save(&mut store, KIND, day(3), &[entry(2, "A", "G")]);

        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND), day(3))
            .unwrap();
        assert_eq!(rows[0].avg_rank, 3.0);

        // Both snapshots fall outside a window ending two months later
        let later = NaiveDate::from_ymd_opt(2024, 8, 20).unwrap();
        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND), later)
            .unwrap();
        assert_eq!(rows[0].avg_rank, 2.0);
    }

    #[test]
    fn test_latest_guild_filter_is_case_insensitive_substring() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(
            &mut store,
            KIND,
            day(2),
            &[entry(1, "A", "Dragons"), entry(2, "B", "Wolves"), entry(3, "C", "RedDRAGON")],
        );

        for filter in ["drag", "DRAG", "Drag"] {
            let rows = store
                .latest_ranking_as_of(&LatestRankingQuery::new(KIND).guild(filter), day(2))
                .unwrap();
            let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["A", "C"]);
        }
    }

    #[test]
    fn test_latest_respects_limit_and_target_date() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(1, "A", "G"), entry(2, "B", "G")]);
        save(&mut store, KIND, day(3), &[entry(1, "B", "G"), entry(2, "A", "G")]);

        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND).limit(1), day(3))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "B");
        assert_eq!(rows[0].rank_change, 1);

        // Reference date of the first capture
        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND).target_date(day(1)), day(3))
            .unwrap();
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].rank_change, 0);

        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND).target_date(day(20)), day(3))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_latest_ignores_other_leaderboards() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(1, "A", "G")]);
        save(&mut store, LeaderboardKind::Arena, day(5), &[entry(9, "A", "G")]);

        let rows = store
            .latest_ranking_as_of(&LatestRankingQuery::new(KIND), day(5))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].avg_rank, 1.0);
    }

    #[test]
    fn test_history_single_record_average_is_its_rank() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(7, "A", "G")]);

        let history = store.player_history("A", 7).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rank, 7);
        assert_eq!(history[0].avg_rank, 7.0);
        assert_eq!(history[0].date, day(1));
        assert_eq!(history[0].kind, KIND);
    }

    #[test]
    fn test_history_average_is_per_record() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let may = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        // Reference dates: May 5, June 1, June 10
        save(&mut store, KIND, may(6), &[entry(10, "A", "G")]);
        save(&mut store, KIND, day(2), &[entry(2, "A", "G")]);
        save(&mut store, KIND, day(11), &[entry(3, "A", "G")]);

        let history = store.player_history("A", 10).unwrap();
        let view: Vec<(NaiveDate, u32, f64)> = history
            .iter()
            .map(|h| (h.date, h.rank, h.avg_rank))
            .collect();
        assert_eq!(
            view,
            vec![(day(10), 3, 2.5), (day(1), 2, 6.0), (may(5), 10, 10.0)]
        );

        let limited = store.player_history("A", 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].date, day(10));
    }

    #[test]
    fn test_history_average_counts_same_kind_and_window_edge() {
        let mut store = RankingStore::open_in_memory().unwrap();
        let may = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let mut save_ref = |kind, date_ref: NaiveDate, rank| {
            store
                .save_ranking(kind, &[entry(rank, "A", "G")], date_ref.succ_opt().unwrap(), date_ref)
                .unwrap();
        };
        // May 1 is exactly 30 days before May 31
        save_ref(KIND, may(1), 10);
        save_ref(LeaderboardKind::Arena, may(19), 50);
        save_ref(KIND, may(31), 2);

        let history = store.player_history("A", 10).unwrap();
        let view: Vec<(NaiveDate, LeaderboardKind, u32, f64)> = history
            .iter()
            .map(|h| (h.date, h.kind, h.rank, h.avg_rank))
            .collect();
        assert_eq!(
            view,
            vec![
                (may(31), KIND, 2, 6.0),
                (may(19), LeaderboardKind::Arena, 50, 50.0),
                (may(1), KIND, 10, 10.0),
            ]
        );
    }

    #[test]
    fn test_history_of_unknown_player_is_empty() {
        let store = RankingStore::open_in_memory().unwrap();
        assert!(store.player_history("Nobody", 7).unwrap().is_empty());
    }

    #[test]
    fn test_guild_members_latest_record_per_player() {
        let mut store = RankingStore::open_in_memory().unwrap();
        save(&mut store, KIND, day(2), &[entry(4, "A", "G"), entry(1, "B", "G"), entry(2, "X", "Other")]);
        save(&mut store, KIND, day(3), &[entry(3, "A", "G")]);
        save(&mut store, LeaderboardKind::Arena, day(1), &[entry(8, "B", "G")]);

        let members = store.guild_members("G", None).unwrap();
        let view: Vec<(&str, u32, LeaderboardKind)> = members
            .iter()
            .map(|m| (m.name.as_str(), m.rank, m.kind))
            .collect();
        assert_eq!(view, vec![("B", 1, KIND), ("A", 3, KIND)]);
        assert_eq!(members[1].date, day(3));

        let arena = store.guild_members("G", Some(LeaderboardKind::Arena)).unwrap();
        assert_eq!(arena.len(), 1);
        assert_eq!(arena[0].name, "B");
        assert_eq!(arena[0].rank, 8);

        assert!(store.guild_members("g", None).unwrap().is_empty());
    }
}
