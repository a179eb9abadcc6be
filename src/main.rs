//! rank-capture command line.
//!
//! Captures a leaderboard from the running game, re-reads saved frames, and
//! answers ranking queries from the local store as JSON.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use rank_capture::automation::extract_saved_frames;
use rank_capture::config::{AppConfig, ZoneSet};
use rank_capture::ocr::TesseractEngine;
use rank_capture::store::{LatestRankingQuery, Snapshot};
use rank_capture::{logging, paths, LeaderboardKind, RankingStore};

#[derive(Parser, Debug)]
#[command(
    name = "rank-capture",
    version,
    about = "Capture an in-game leaderboard with OCR and track rankings over time"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scroll through the leaderboard in the game window, read it and save it
    Capture {
        /// dreamland | arena | supreme_arena | guild
        #[arg(long, default_value = "dreamland")]
        kind: LeaderboardKind,

        /// Number of drags (defaults to scroll_count from config.json)
        #[arg(long)]
        scrolls: Option<u32>,
    },

    /// Read PNG frames saved by an earlier capture
    Extract {
        #[arg(long)]
        dir: PathBuf,

        #[arg(long, default_value = "dreamland")]
        kind: LeaderboardKind,

        /// Store the result as a snapshot
        #[arg(long)]
        save: bool,

        /// Capture date of the snapshot (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Most recent standings with rank change and 30-day average
    Latest {
        #[arg(long, default_value = "dreamland")]
        kind: LeaderboardKind,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Case-insensitive part of a guild name
        #[arg(long)]
        guild: Option<String>,

        /// Reference date to show (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Recent records of one player
    History {
        name: String,

        #[arg(long, default_value_t = 7)]
        limit: u32,
    },

    /// Latest record of every member of a guild
    Guild {
        name: String,

        #[arg(long)]
        kind: Option<LeaderboardKind>,
    },

    /// Delete every stored ranking and player
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&paths::get_logs_dir())?;
    logging::install_panic_hook();
    paths::ensure_directories().context("Failed to create output directories")?;

    let config = AppConfig::load(&paths::get_config_path());
    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(paths::get_database_path);
    let mut store = RankingStore::open(&db_path)?;

    match cli.command {
        Command::Capture { kind, scrolls } => {
            let snapshot = capture(&config, &mut store, kind, scrolls)?;
            print_json(&snapshot)
        }
        Command::Extract {
            dir,
            kind,
            save,
            date,
        } => extract(&config, &mut store, &dir, kind, save, date),
        Command::Latest {
            kind,
            limit,
            guild,
            date,
        } => {
            let query = LatestRankingQuery {
                kind,
                limit,
                guild,
                target_date: date,
            };
            print_json(&store.latest_ranking(&query)?)
        }
        Command::History { name, limit } => print_json(&store.player_history(&name, limit)?),
        Command::Guild { name, kind } => print_json(&store.guild_members(&name, kind)?),
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to clear {} without --yes", db_path.display());
            }
            store.reset()?;
            println!("Ranking store cleared");
            Ok(())
        }
    }
}

#[cfg(windows)]
fn capture(
    config: &AppConfig,
    store: &mut RankingStore,
    kind: LeaderboardKind,
    scrolls: Option<u32>,
) -> Result<Snapshot> {
    use rank_capture::automation::Pipeline;
    use rank_capture::capture::Win32Automation;
    use rank_capture::RankError;

    unsafe {
        windows::Win32::System::WinRT::RoInitialize(
            windows::Win32::System::WinRT::RO_INIT_MULTITHREADED,
        )?
    };

    let engine = TesseractEngine::from_config(&config.ocr)?;
    let automation = Win32Automation::new(config.window_title.as_str());
    let pipeline = Pipeline::new(config, &automation, &engine);

    pipeline
        .run_capture(store, kind, scrolls)
        .map_err(|e| match e {
            RankError::Capture(_) => anyhow!(e),
            other => anyhow!("could not complete capture: {}", other),
        })
}

#[cfg(not(windows))]
fn capture(
    _config: &AppConfig,
    _store: &mut RankingStore,
    _kind: LeaderboardKind,
    _scrolls: Option<u32>,
) -> Result<Snapshot> {
    Err(anyhow!(
        "could not complete capture: window automation is only available on Windows"
    ))
}

fn extract(
    config: &AppConfig,
    store: &mut RankingStore,
    dir: &std::path::Path,
    kind: LeaderboardKind,
    save: bool,
    date: Option<NaiveDate>,
) -> Result<()> {
    let zones = ZoneSet::load(kind, &paths::get_zones_path(kind))?;
    let engine = TesseractEngine::from_config(&config.ocr)?;
    let debug_dir = config
        .ocr
        .save_debug_regions
        .then(paths::get_debug_regions_dir);

    let entries = extract_saved_frames(dir, &zones, config, &engine, debug_dir)?;
    if !save {
        return print_json(&entries);
    }
    if entries.is_empty() {
        bail!("no entries read from {}, nothing saved", dir.display());
    }

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let date_ref = date.pred_opt().unwrap_or(date);
    store.save_ranking(kind, &entries, date, date_ref)?;
    print_json(&Snapshot {
        kind,
        date,
        date_ref,
        entries,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
