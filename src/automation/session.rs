//! Capture session state machine.
//!
//! The session sequences through: Idle → Resetting → Capturing(0) →
//! Scrolling(1) → Capturing(1) → ... → Capturing(n) → Done.
//! Any failed action or near-black frame moves it to `Failed` and the
//! frames collected so far are discarded.

use std::time::Duration;

use crate::automation::detection::{calculate_brightness, is_black_frame};
use crate::capture::{Frame, WindowAutomation, WindowHandle};
use crate::config::{AppConfig, Point, ScrollConfig};
use crate::error::CaptureFailure;

/// Capture session states.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Clicking the reset position so the list starts at the top
    Resetting,
    /// Taking the capture that follows `n` drags
    Capturing(u32),
    /// Performing drag `n` (1-based)
    Scrolling(u32),
    /// Every capture succeeded
    Done,
    /// Session aborted
    Failed(String),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Resetting => write!(f, "Resetting scroll position"),
            SessionState::Capturing(n) => write!(f, "Capturing after {} scrolls", n),
            SessionState::Scrolling(n) => write!(f, "Scrolling ({})", n),
            SessionState::Done => write!(f, "Done"),
            SessionState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

/// Timing and geometry used by a session.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub canonical_width: u32,
    pub canonical_height: u32,
    pub scroll: ScrollConfig,
    pub activation_delay: Duration,
    pub click_delay: Duration,
    pub black_frame_threshold: f32,
    /// Clicked once before the first capture
    pub reset_point: Point,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig, reset_point: Point) -> Self {
        Self {
            canonical_width: config.canonical_width,
            canonical_height: config.canonical_height,
            scroll: config.scroll.clone(),
            activation_delay: Duration::from_millis(config.activation_delay_ms),
            click_delay: Duration::from_millis(config.click_delay_ms),
            black_frame_threshold: config.black_frame_threshold,
            reset_point,
        }
    }

    /// Start and end of drag `n` (1-based). Each drag ends a little higher
    /// than the previous one.
    pub fn drag_vector(&self, n: u32) -> (Point, Point) {
        let k = n.saturating_sub(1) as f32;
        let start = Point::new(self.scroll.x, self.scroll.start_y);
        let end = Point::new(self.scroll.x, self.scroll.end_y - k * self.scroll.end_y_step);
        (start, end)
    }
}

pub struct CaptureSession<'a, A: WindowAutomation + ?Sized> {
    automation: &'a A,
    handle: WindowHandle,
    settings: SessionSettings,
    scroll_count: u32,
    pub state: SessionState,
    frames: Vec<Frame>,
    failure: Option<CaptureFailure>,
}

impl<'a, A: WindowAutomation + ?Sized> CaptureSession<'a, A> {
    pub fn new(automation: &'a A, handle: WindowHandle, settings: SessionSettings) -> Self {
        Self {
            automation,
            handle,
            settings,
            scroll_count: 0,
            state: SessionState::Idle,
            frames: Vec::new(),
            failure: None,
        }
    }

    /// Finds the game window and creates a session bound to it.
    pub fn attach(
        automation: &'a A,
        window_title: &str,
        settings: SessionSettings,
    ) -> Result<Self, CaptureFailure> {
        let handle = automation
            .find_window()
            .ok_or_else(|| CaptureFailure::WindowNotFound(window_title.to_string()))?;
        Ok(Self::new(automation, handle, settings))
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Runs the session to completion: one capture, then `scroll_count`
    /// drag-and-capture iterations.
    pub fn run(mut self, scroll_count: u32) -> Result<Vec<Frame>, CaptureFailure> {
        self.scroll_count = scroll_count;
        while self.step() {}

        if self.state == SessionState::Done {
            return Ok(self.frames);
        }
        let state = self.state.to_string();
        Err(self
            .failure
            .take()
            .unwrap_or_else(|| CaptureFailure::Automation {
                action: "capture session",
                source: anyhow::anyhow!("session stopped in state {}", state),
            }))
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `true` while there is work left, `false` once done or failed.
    pub fn step(&mut self) -> bool {
        match self.state.clone() {
            SessionState::Idle => {
                log::info!(
                    "Starting capture session: {} scrolls, {} captures",
                    self.scroll_count,
                    self.scroll_count + 1
                );
                self.state = SessionState::Resetting;
                true
            }

            SessionState::Resetting => {
                if let Err(e) = self.automation.click(self.handle, self.settings.reset_point) {
                    return self.fail(CaptureFailure::Automation {
                        action: "reset click",
                        source: e,
                    });
                }
                std::thread::sleep(self.settings.click_delay);
                self.state = SessionState::Capturing(0);
                true
            }

            SessionState::Capturing(n) => {
                if let Err(failure) = self.capture() {
                    return self.fail(failure);
                }
                log::info!("Capture {}/{} done", n + 1, self.scroll_count + 1);

                if n >= self.scroll_count {
                    log::info!("Capture session complete: {} frames", self.frames.len());
                    self.state = SessionState::Done;
                    false
                } else {
                    self.state = SessionState::Scrolling(n + 1);
                    true
                }
            }

            SessionState::Scrolling(n) => {
                let (start, end) = self.settings.drag_vector(n);
                let duration = Duration::from_millis(self.settings.scroll.drag_duration_ms);
                if let Err(e) = self.automation.drag(self.handle, start, end, duration) {
                    return self.fail(CaptureFailure::Automation {
                        action: "scroll drag",
                        source: e,
                    });
                }
                std::thread::sleep(Duration::from_millis(self.settings.scroll.settle_delay_ms));
                self.state = SessionState::Capturing(n);
                true
            }

            SessionState::Done | SessionState::Failed(_) => false,
        }
    }

    fn capture(&mut self) -> Result<(), CaptureFailure> {
        self.automation
            .activate(self.handle)
            .map_err(|e| CaptureFailure::Automation {
                action: "window activation",
                source: e,
            })?;
        std::thread::sleep(self.settings.activation_delay);

        let raw = self
            .automation
            .screenshot(self.handle)
            .map_err(|e| CaptureFailure::Automation {
                action: "screenshot",
                source: e,
            })?;

        let index = self.frames.len();
        if is_black_frame(&raw, self.settings.black_frame_threshold) {
            return Err(CaptureFailure::BlackFrame {
                index,
                brightness: calculate_brightness(&raw),
            });
        }

        self.frames.push(Frame::from_raw(
            index,
            &raw,
            self.settings.canonical_width,
            self.settings.canonical_height,
        ));
        Ok(())
    }

    fn fail(&mut self, failure: CaptureFailure) -> bool {
        log::error!("Capture session aborted: {}", failure);
        self.state = SessionState::Failed(failure.to_string());
        self.frames.clear();
        self.failure = Some(failure);
        false
    }
}
