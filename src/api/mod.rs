//! Collection server API layer.
//!
//! Every subsystem reaches the network exclusively through
//! [`collection::Gateway`], which owns the HTTP client, attaches the session
//! token and classifies failures into [`ApiError`]. Callers receive typed
//! results and make the retry-or-skip decision themselves; nothing in this
//! layer retries or panics.

use crate::libs::config::{PrivacyFlags, Settings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod collection;

pub use collection::Gateway;

/// Failure taxonomy for gateway calls.
///
/// `Connectivity` means the server could not be reached at all; callers skip
/// the current tick and flip the reachability flag. `Auth` means the server
/// returned 401; the session is invalid and all periodic work must stop.
/// `Validation` means the server rejected the payload; the payload is dropped
/// and never retried as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server unreachable: {0}")]
    Connectivity(String),
    #[error("session rejected by server")]
    Auth,
    #[error("server rejected request ({status}): {body}")]
    Validation { status: u16, body: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

// === Wire payloads ===

#[derive(Serialize, Debug)]
pub struct RegisterRequest {
    pub member_id: String,
    pub device_name: String,
    pub platform: String,
}

#[derive(Deserialize, Debug)]
pub struct RegisterResponse {
    pub token: String,
    pub agent_id: String,
    pub member_name: String,
}

#[derive(Serialize, Debug)]
pub struct HeartbeatRequest {
    /// `"online"` while a timer is running, `"idle"` otherwise.
    pub status: String,
    pub clicks: u64,
    pub keystrokes: u64,
}

/// Heartbeat reply. Settings and privacy flags piggyback on this response;
/// there is no separate configuration push channel.
#[derive(Deserialize, Debug, Default)]
pub struct HeartbeatResponse {
    pub settings: Option<Settings>,
    pub privacy: Option<PrivacyFlags>,
}

#[derive(Serialize, Debug)]
pub struct ScreenshotRequest {
    /// Base64-encoded PNG bytes.
    pub image_data: String,
    pub clicks: u64,
    pub keystrokes: u64,
    pub activity_score: u8,
}

#[derive(Serialize, Debug, Default)]
pub struct TimerStartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TimerStartResponse {
    pub id: i64,
    pub start_time: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct TimerStopResponse {
    pub id: i64,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

/// A server-side timer entry. The server enforces that at most one entry per
/// agent is active at a time and computes the authoritative duration.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TimerEntry {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub project: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

#[derive(Deserialize, Debug)]
pub struct TimerStatusResponse {
    pub is_running: bool,
    pub active_entry: Option<TimerEntry>,
    /// Total seconds worked today, server-computed.
    pub today_totals: i64,
}

#[derive(Serialize, Debug)]
pub struct IdleReportRequest {
    pub idle_seconds: u64,
}

#[derive(Serialize, Debug)]
pub struct AppUsageRequest {
    pub app_name: String,
    pub window_title: String,
    /// `"application"` or `"website"`.
    pub app_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AppUsageResponse {
    pub status: String,
}
