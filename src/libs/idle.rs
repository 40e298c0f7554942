//! Idle detection.
//!
//! Polls the time since the last recorded input event while a timer is
//! running. Reporting policy: once over the threshold, each poll reports only
//! the idle seconds not yet claimed by an earlier report, so a continuous
//! silent span is never double-counted. The baseline resets as soon as
//! activity resumes.

use crate::api::{ApiError, IdleReportRequest};
use crate::libs::agent::Agent;
use crate::libs::monitor;
use crate::libs::scheduler::Scheduler;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct IdleTracker {
    active: bool,
    /// Portion of the current silent span already reported.
    reported: Duration,
}

impl IdleTracker {
    /// Called when a timer becomes active.
    pub fn activate(&mut self) {
        self.active = true;
        self.reported = Duration::ZERO;
    }

    /// Called when the timer stops.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.reported = Duration::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the unreported idle seconds if the span exceeds the threshold,
    /// advancing the baseline. Returns `None` below threshold or when the
    /// delta rounds down to zero.
    pub fn unreported_idle(&mut self, idle: Duration, threshold: Duration) -> Option<u64> {
        if !self.active {
            return None;
        }
        if idle < self.reported {
            // Activity resumed since the last report; new span, new baseline.
            self.reported = Duration::ZERO;
        }
        if idle <= threshold {
            return None;
        }
        let delta = idle - self.reported;
        let seconds = delta.as_secs();
        if seconds == 0 {
            return None;
        }
        self.reported = idle;
        Some(seconds)
    }
}

/// One idle poll: report unclaimed idle time while the timer runs.
pub async fn on_idle_tick(agent: &mut Agent, sched: &mut Scheduler) {
    if !agent.timer.is_running() {
        return;
    }

    let threshold = Duration::from_secs(agent.config.settings.idle_threshold_minutes * 60);
    let idle = agent.activity.idle_for();
    let Some(idle_seconds) = agent.idle.unreported_idle(idle, threshold) else {
        return;
    };

    match agent.gateway.report_idle(&IdleReportRequest { idle_seconds }).await {
        Ok(()) => {
            agent.is_server_reachable = true;
            tracing::debug!(idle_seconds, "idle time reported");
        }
        Err(ApiError::Connectivity(e)) => {
            agent.is_server_reachable = false;
            tracing::warn!("idle report failed: {e}");
        }
        Err(ApiError::Auth) => monitor::handle_auth_expiry(agent, sched).await,
        Err(e @ ApiError::Validation { .. }) => tracing::warn!("idle report rejected: {e}"),
    }
}
