//! `WindowAutomation` backed by Win32 and Windows Graphics Capture.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::time::Duration;

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, IsIconic, IsWindow, SetForegroundWindow, ShowWindow, SW_RESTORE,
};

use super::backend::{WindowAutomation, WindowHandle};
use super::screenshot::capture_client_area;
use super::window::find_window_by_title;
use crate::automation::input;
use crate::config::Point;

pub struct Win32Automation {
    title_fragment: String,
}

impl Win32Automation {
    pub fn new(title_fragment: impl Into<String>) -> Self {
        Self {
            title_fragment: title_fragment.into(),
        }
    }
}

fn to_hwnd(handle: WindowHandle) -> Result<HWND> {
    let hwnd = HWND(handle.0 as *mut std::ffi::c_void);
    if !unsafe { IsWindow(hwnd).as_bool() } {
        return Err(anyhow!("Game window no longer exists"));
    }
    Ok(hwnd)
}

impl WindowAutomation for Win32Automation {
    fn find_window(&self) -> Option<WindowHandle> {
        find_window_by_title(&self.title_fragment).map(|hwnd| WindowHandle(hwnd.0 as isize))
    }

    fn activate(&self, handle: WindowHandle) -> Result<()> {
        let hwnd = to_hwnd(handle)?;
        unsafe {
            if GetForegroundWindow() == hwnd {
                return Ok(());
            }
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            let _ = SetForegroundWindow(hwnd);
        }
        std::thread::sleep(Duration::from_millis(500));
        log::debug!("Game window activated");
        Ok(())
    }

    fn screenshot(&self, handle: WindowHandle) -> Result<RgbaImage> {
        capture_client_area(to_hwnd(handle)?)
    }

    fn drag(
        &self,
        handle: WindowHandle,
        start: Point,
        end: Point,
        duration: Duration,
    ) -> Result<()> {
        self.activate(handle)?;
        input::drag(to_hwnd(handle)?, start, end, duration)
    }

    fn click(&self, handle: WindowHandle, point: Point) -> Result<()> {
        self.activate(handle)?;
        input::click_at(to_hwnd(handle)?, point)
    }
}
