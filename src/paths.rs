use std::path::PathBuf;
use std::sync::OnceLock;

use crate::store::LeaderboardKind;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the settings file: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the data directory: `<exe_dir>/resources/data/`
pub fn get_data_dir() -> PathBuf {
    get_exe_dir().join("resources").join("data")
}

/// Returns the default database file: `<exe_dir>/resources/data/database/rankings.db`
pub fn get_database_path() -> PathBuf {
    get_data_dir().join("database").join("rankings.db")
}

/// Returns the frame dump directory: `<exe_dir>/resources/data/captures/`
pub fn get_captures_dir() -> PathBuf {
    get_data_dir().join("captures")
}

/// Returns the click-position file for a leaderboard type.
pub fn get_mapping_path(kind: LeaderboardKind) -> PathBuf {
    get_data_dir()
        .join("mapping")
        .join(format!("{}.json", kind.as_str()))
}

/// Returns the OCR zone file for a leaderboard type.
pub fn get_zones_path(kind: LeaderboardKind) -> PathBuf {
    get_exe_dir()
        .join("resources")
        .join("config")
        .join("zones")
        .join(format!("{}.json", kind.as_str()))
}

/// Returns the directory for intermediate OCR crops: `<exe_dir>/data/debug/regions/`
pub fn get_debug_regions_dir() -> PathBuf {
    get_exe_dir().join("data").join("debug").join("regions")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_captures_dir())?;
    if let Some(parent) = get_database_path().parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
