//! Foreground application usage tracking.
//!
//! Samples the focused window on a short cadence, classifies it as a plain
//! application or a website, and reports transitions to the server. A sample
//! is only reported when its (app name, window title) identity differs from
//! the previously reported one, so a still-foregrounded window produces no
//! redundant traffic.

use crate::api::{ApiError, AppUsageRequest};
use crate::libs::agent::Agent;
use crate::libs::monitor;
use crate::libs::scheduler::Scheduler;
use crate::libs::window::ForegroundWindow;

/// Process names treated as browsers for website classification.
const BROWSERS: &[&str] = &[
    "chrome", "chromium", "firefox", "safari", "edge", "msedge", "brave", "opera", "vivaldi", "arc",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppType {
    Application,
    Website,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Application => "application",
            AppType::Website => "website",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUsageSample {
    pub app_name: String,
    pub window_title: String,
    pub app_type: AppType,
    pub url: Option<String>,
}

/// Classifies a foreground window.
///
/// `website` requires both a known browser process and an extractable URL in
/// the title; a browser showing no recognizable URL stays `application`.
pub fn classify(window: &ForegroundWindow) -> AppUsageSample {
    let lowered = window.app_name.to_lowercase();
    let is_browser = BROWSERS.iter().any(|b| lowered.contains(b));
    let url = if is_browser { extract_url(&window.window_title) } else { None };

    AppUsageSample {
        app_name: window.app_name.clone(),
        window_title: window.window_title.clone(),
        app_type: if url.is_some() { AppType::Website } else { AppType::Application },
        url,
    }
}

/// Picks the first title token that looks like a URL.
fn extract_url(title: &str) -> Option<String> {
    title
        .split_whitespace()
        .find(|token| token.starts_with("http://") || token.starts_with("https://") || token.starts_with("www."))
        .map(|token| token.trim_end_matches(['.', ',']).to_string())
}

/// One app sample cycle: probe, classify, report on transition.
pub async fn on_app_tick(agent: &mut Agent, sched: &mut Scheduler) {
    if agent.config.privacy.privacy_mode || !agent.config.privacy.track_apps {
        return;
    }

    let Some(window) = agent.window.foreground() else {
        return;
    };
    let sample = classify(&window);

    // "Track that a browser was used" and "track what was viewed" are
    // separable policies: URL-bearing samples are suppressed entirely when
    // URL tracking is off.
    if sample.app_type == AppType::Website && !agent.config.privacy.track_urls {
        return;
    }

    let identity = (sample.app_name.clone(), sample.window_title.clone());
    if agent.last_reported_app.as_ref() == Some(&identity) {
        return;
    }

    let request = AppUsageRequest {
        app_name: sample.app_name,
        window_title: sample.window_title,
        app_type: sample.app_type.as_str().to_string(),
        url: sample.url,
    };

    match agent.gateway.report_app_usage(&request).await {
        Ok(_) => {
            agent.is_server_reachable = true;
            agent.last_reported_app = Some(identity);
            tracing::debug!(app = %request.app_name, "app usage reported");
        }
        Err(ApiError::Connectivity(e)) => {
            agent.is_server_reachable = false;
            tracing::warn!("app usage report failed: {e}");
        }
        Err(ApiError::Auth) => monitor::handle_auth_expiry(agent, sched).await,
        Err(e @ ApiError::Validation { .. }) => tracing::warn!("app usage rejected: {e}"),
    }
}
