//! Leaderboard capture and ranking history.
//!
//! A capture session scrolls through an in-game leaderboard and screenshots
//! it, OCR reads every visible row, overlapping rows are reconciled into one
//! ranked list, and the list is stored per day in SQLite for trend queries.

pub mod automation;
pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod ocr;
pub mod paths;
pub mod reconcile;
pub mod store;

pub use error::{CaptureFailure, RankError};
pub use reconcile::{reconcile, PlayerEntry, RawEntry, ZoneReader};
pub use store::{LeaderboardKind, RankingStore};
