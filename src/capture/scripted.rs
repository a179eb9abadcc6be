//! Scripted `WindowAutomation` for tests.
//!
//! Screenshots are served from a queue and every action is recorded so tests
//! can assert on the exact interaction sequence.

use anyhow::{anyhow, Result};
use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use super::backend::{WindowAutomation, WindowHandle};
use crate::config::Point;

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Activate,
    Screenshot,
    Click(Point),
    Drag { start: Point, end: Point },
}

pub struct ScriptedAutomation {
    window: Option<WindowHandle>,
    screenshots: RefCell<VecDeque<RgbaImage>>,
    pub actions: RefCell<Vec<Action>>,
}

impl ScriptedAutomation {
    pub fn new(screenshots: Vec<RgbaImage>) -> Self {
        Self {
            window: Some(WindowHandle(42)),
            screenshots: RefCell::new(screenshots.into()),
            actions: RefCell::new(Vec::new()),
        }
    }

    /// `count` identical mid-gray screenshots.
    pub fn gray(count: usize) -> Self {
        Self::new(vec![RgbaImage::from_pixel(75, 133, Rgba([128, 128, 128, 255])); count])
    }

    pub fn without_window() -> Self {
        Self {
            window: None,
            ..Self::new(Vec::new())
        }
    }

    pub fn drags(&self) -> Vec<(Point, Point)> {
        self.actions
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Action::Drag { start, end } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.actions
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Action::Click(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl WindowAutomation for ScriptedAutomation {
    fn find_window(&self) -> Option<WindowHandle> {
        self.window
    }

    fn activate(&self, _handle: WindowHandle) -> Result<()> {
        self.actions.borrow_mut().push(Action::Activate);
        Ok(())
    }

    fn screenshot(&self, _handle: WindowHandle) -> Result<RgbaImage> {
        self.actions.borrow_mut().push(Action::Screenshot);
        self.screenshots
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted screenshot left"))
    }

    fn drag(
        &self,
        _handle: WindowHandle,
        start: Point,
        end: Point,
        _duration: Duration,
    ) -> Result<()> {
        self.actions.borrow_mut().push(Action::Drag { start, end });
        Ok(())
    }

    fn click(&self, _handle: WindowHandle, point: Point) -> Result<()> {
        self.actions.borrow_mut().push(Action::Click(point));
        Ok(())
    }
}
