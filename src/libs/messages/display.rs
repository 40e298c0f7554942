//! Display implementation for the message catalog.
//!
//! This is the single place user-facing wording lives. Text follows a few
//! conventions: sentence case, active voice, and a concrete next step in
//! every failure message (`run \`traka init\` first`, not just "no config").
//! Parameters arrive pre-formatted from the call site where formatting needs
//! domain context (timestamps, durations); everything else is interpolated
//! here.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::NoServerConfigured => "No server configured; run `traka init` first".to_string(),

            // === SESSION MESSAGES ===
            Message::LoggedIn(name) => format!("Logged in as {}", name),
            Message::LoggedOut => "Logged out".to_string(),
            Message::NotLoggedIn => "Not logged in; run `traka login` first".to_string(),
            Message::SessionExpired => "Session expired; run `traka login` to re-authenticate".to_string(),

            // === TIMER MESSAGES ===
            Message::TimerRunningSince { start, project } => {
                format!("Timer running since {} (project: {})", start, project)
            }
            Message::NoTimerRunning => "No timer running".to_string(),
            Message::TodayTotal(total) => format!("Today: {}", total),
        };
        write!(f, "{}", text)
    }
}
