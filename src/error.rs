//! Error taxonomy for capture, configuration and persistence.
//!
//! Field-level OCR misses are deliberately absent: the zone extractor
//! reports them as an empty string and the reconciler drops the row.

use thiserror::Error;

/// Reasons a capture session (or the pipeline around it) did not complete.
///
/// Any of these aborts the run before the ranking store is touched.
#[derive(Debug, Error)]
pub enum CaptureFailure {
    #[error("no window with a title containing \"{0}\" was found")]
    WindowNotFound(String),

    #[error("frame {index} is near-black (brightness {brightness:.2})")]
    BlackFrame { index: usize, brightness: f32 },

    #[error("{action} failed: {source}")]
    Automation {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("no ranking entry could be read from the captured frames")]
    NoEntries,
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("could not complete capture: {0}")]
    Capture(#[from] CaptureFailure),

    #[error("configuration missing for {kind}: {detail}")]
    ConfigMissing { kind: String, detail: String },

    #[error("ranking store error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },

    #[error("unknown leaderboard type '{0}'")]
    UnknownLeaderboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RankError {
    pub fn config_missing(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        RankError::ConfigMissing {
            kind: kind.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_failure_is_reported_as_incomplete_capture() {
        let err: RankError = CaptureFailure::BlackFrame {
            index: 3,
            brightness: 1.5,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "could not complete capture: frame 3 is near-black (brightness 1.50)"
        );
    }
}
