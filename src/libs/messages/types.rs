//! Message catalog for all user-facing text.
//!
//! Variants are grouped by the command or subsystem that emits them. Dynamic
//! content travels as typed payloads so formatting stays inside the `Display`
//! implementation and call sites never concatenate strings by hand.

#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    NoServerConfigured,

    // === SESSION MESSAGES ===
    LoggedIn(String),  // display name
    LoggedOut,
    NotLoggedIn,
    SessionExpired,

    // === TIMER MESSAGES ===
    TimerRunningSince {
        start: String,
        project: String,
    },
    NoTimerRunning,
    TodayTotal(String), // formatted HH:MM
}
