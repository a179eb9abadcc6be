//! Window automation capability.
//!
//! The capture session only ever talks to the game through this trait.
//! `Win32Automation` is the real implementation; tests drive the session
//! with a scripted fake.

use anyhow::Result;
use image::RgbaImage;
use std::time::Duration;

use crate::config::Point;

/// Opaque handle to the game window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowHandle(pub isize);

pub trait WindowAutomation {
    /// Finds the game window, or `None` if it is not open.
    fn find_window(&self) -> Option<WindowHandle>;

    /// Brings the window to the foreground.
    fn activate(&self, handle: WindowHandle) -> Result<()>;

    /// Captures the client area of the window.
    fn screenshot(&self, handle: WindowHandle) -> Result<RgbaImage>;

    /// Presses at `start`, moves to `end` over `duration`, and releases.
    fn drag(&self, handle: WindowHandle, start: Point, end: Point, duration: Duration)
        -> Result<()>;

    /// Clicks once at `point`.
    fn click(&self, handle: WindowHandle, point: Point) -> Result<()>;
}
