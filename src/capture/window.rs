//! Window discovery and client-area geometry for the game window.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClientRect, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    IsWindowVisible,
};

/// Finds the first visible window whose title contains `title_fragment`.
///
/// Returns `None` if the game is not running.
pub fn find_window_by_title(title_fragment: &str) -> Option<HWND> {
    struct EnumData<'a> {
        fragment: &'a str,
        hwnd: Option<HWND>,
        title: Option<String>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        unsafe {
            let data = &mut *(lparam.0 as *mut EnumData);

            if !IsWindowVisible(hwnd).as_bool() {
                return TRUE;
            }

            let title_len = GetWindowTextLengthW(hwnd);
            if title_len <= 0 {
                return TRUE;
            }
            let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
            GetWindowTextW(hwnd, &mut title_buf);
            let title = OsString::from_wide(&title_buf[..title_len as usize])
                .to_string_lossy()
                .to_string();

            if title.contains(data.fragment) {
                data.hwnd = Some(hwnd);
                data.title = Some(title);
                return BOOL(0); // Stop enumeration
            }

            TRUE
        }
    }

    log::debug!("Searching for a window titled \"{}\"...", title_fragment);
    let mut data = EnumData {
        fragment: title_fragment,
        hwnd: None,
        title: None,
    };
    unsafe {
        // EnumWindows returns FALSE when the callback stops it early, which is expected
        let _ = EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize));
    }

    if let Some(title) = &data.title {
        log::info!("Found game window: \"{}\"", title);
    }
    data.hwnd
}

/// Gets the client area rectangle and its offset relative to the window origin.
///
/// The offset is the position of the client area's top-left corner relative to
/// the window's top-left corner (needed for cropping screenshots).
pub fn get_client_area_info(hwnd: HWND) -> Result<(RECT, POINT)> {
    let mut client_rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut client_rect)? };

    let (origin_x, origin_y) = get_client_origin(hwnd)?;

    let mut window_rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut window_rect)? };

    let offset = POINT {
        x: origin_x - window_rect.left,
        y: origin_y - window_rect.top,
    };

    Ok((client_rect, offset))
}

/// Gets the client area origin in screen coordinates.
pub fn get_client_origin(hwnd: HWND) -> Result<(i32, i32)> {
    let mut pt = POINT { x: 0, y: 0 };
    unsafe {
        if !ClientToScreen(hwnd, &mut pt).as_bool() {
            return Err(anyhow!("ClientToScreen failed"));
        }
    }
    Ok((pt.x, pt.y))
}
