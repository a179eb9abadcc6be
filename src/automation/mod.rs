//! Leaderboard capture automation.
//!
//! This module provides:
//! - Input simulation for clicks and drags (Windows)
//! - Black-frame detection via brightness analysis
//! - The scroll-and-capture session state machine
//! - The end-to-end capture pipeline

pub mod detection;
#[cfg(windows)]
pub mod input;
pub mod runner;
pub mod session;

pub use detection::{calculate_brightness, is_black_frame};
pub use runner::{extract_saved_frames, CapturePaths, Pipeline};
pub use session::{CaptureSession, SessionSettings, SessionState};
