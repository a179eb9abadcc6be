//! Mouse input simulation through `SendInput`.
//!
//! The game ignores posted window messages, so clicks and drags are sent as
//! hardware-level input with absolute coordinates. This moves the real cursor
//! and requires the window to be in the foreground.

use anyhow::{anyhow, Result};
use std::thread::sleep;
use std::time::Duration;

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSE_EVENT_FLAGS, MOUSEINPUT,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use crate::capture::window::get_client_origin;
use crate::config::Point;

/// Number of intermediate moves in a drag.
const DRAG_STEPS: u32 = 20;

/// Converts a client-area point to the 0-65535 range used by `MOUSEEVENTF_ABSOLUTE`.
fn to_absolute(hwnd: HWND, point: Point) -> Result<(i32, i32)> {
    let (origin_x, origin_y) = get_client_origin(hwnd)?;
    let screen_x = origin_x as i64 + point.x.round() as i64;
    let screen_y = origin_y as i64 + point.y.round() as i64;

    let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) } as i64;
    let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) } as i64;
    if screen_width <= 0 || screen_height <= 0 {
        return Err(anyhow!("Could not read screen dimensions"));
    }

    Ok((
        ((screen_x * 65535) / screen_width) as i32,
        ((screen_y * 65535) / screen_height) as i32,
    ))
}

fn send_mouse(norm_x: i32, norm_y: i32, flags: MOUSE_EVENT_FLAGS) -> Result<()> {
    let input = INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: norm_x,
                dy: norm_y,
                dwFlags: flags | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
                ..Default::default()
            },
        },
    };
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent != 1 {
        return Err(anyhow!("SendInput rejected the mouse event"));
    }
    Ok(())
}

/// Clicks at a client-area position.
pub fn click_at(hwnd: HWND, point: Point) -> Result<()> {
    let (x, y) = to_absolute(hwnd, point)?;
    log::debug!("Click at client ({:.0}, {:.0})", point.x, point.y);

    send_mouse(x, y, MOUSE_EVENT_FLAGS(0))?;
    sleep(Duration::from_millis(100));
    send_mouse(x, y, MOUSEEVENTF_LEFTDOWN)?;
    sleep(Duration::from_millis(50));
    send_mouse(x, y, MOUSEEVENTF_LEFTUP)
}

/// Presses at `start`, moves to `end` in evenly spaced steps over `duration`, releases.
pub fn drag(hwnd: HWND, start: Point, end: Point, duration: Duration) -> Result<()> {
    log::debug!(
        "Drag ({:.0}, {:.1}) -> ({:.0}, {:.1}) over {}ms",
        start.x,
        start.y,
        end.x,
        end.y,
        duration.as_millis()
    );

    let (sx, sy) = to_absolute(hwnd, start)?;
    send_mouse(sx, sy, MOUSE_EVENT_FLAGS(0))?;
    sleep(Duration::from_millis(100));
    send_mouse(sx, sy, MOUSEEVENTF_LEFTDOWN)?;
    sleep(Duration::from_millis(100));

    let step_delay = duration / DRAG_STEPS;
    let mut last = (sx, sy);
    for i in 1..=DRAG_STEPS {
        let t = i as f32 / DRAG_STEPS as f32;
        let point = Point::new(
            start.x + (end.x - start.x) * t,
            start.y + (end.y - start.y) * t,
        );
        last = to_absolute(hwnd, point)?;
        send_mouse(last.0, last.1, MOUSE_EVENT_FLAGS(0))?;
        sleep(step_delay);
    }

    send_mouse(last.0, last.1, MOUSEEVENTF_LEFTUP)?;
    sleep(Duration::from_millis(100));
    Ok(())
}
