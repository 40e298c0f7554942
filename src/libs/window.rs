//! Foreground window probing.
//!
//! The OS primitive is consumed through the [`WindowProbe`] trait so the app
//! usage tracker can be exercised in tests without a display server.

use active_win_pos_rs::get_active_window;

/// Identity of the currently focused window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundWindow {
    pub app_name: String,
    pub window_title: String,
}

pub trait WindowProbe: Send {
    /// Returns the foreground window, or `None` when nothing has focus
    /// (login screen, secure desktop, headless session).
    fn foreground(&self) -> Option<ForegroundWindow>;
}

/// Probe backed by `active-win-pos-rs`.
pub struct ActiveWindowProbe;

impl WindowProbe for ActiveWindowProbe {
    fn foreground(&self) -> Option<ForegroundWindow> {
        get_active_window().ok().map(|w| ForegroundWindow {
            app_name: w.app_name,
            window_title: w.title,
        })
    }
}
