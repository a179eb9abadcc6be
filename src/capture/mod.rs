//! Access to the game window and its frames.
//!
//! This module provides:
//! - The `WindowAutomation` capability the capture session depends on
//! - Frame normalization, dumping and reloading
//! - The Win32 implementation (window discovery, Graphics Capture screenshots)

pub mod backend;
pub mod frame;
#[cfg(test)]
pub mod scripted;
#[cfg(windows)]
pub mod screenshot;
#[cfg(windows)]
pub mod win32;
#[cfg(windows)]
pub mod window;

pub use backend::{WindowAutomation, WindowHandle};
pub use frame::Frame;
#[cfg(windows)]
pub use win32::Win32Automation;
