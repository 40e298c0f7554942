//! Periodic liveness reporting and settings propagation.
//!
//! The heartbeat carries the agent's status and current counters; the reply
//! doubles as the configuration channel. Settings and privacy flags pushed by
//! the server are merged into the cached config in one save, so no tick ever
//! reads a half-updated configuration. Heartbeat failures are never fatal.

use crate::api::{ApiError, HeartbeatRequest, HeartbeatResponse};
use crate::libs::agent::Agent;
use crate::libs::monitor;
use crate::libs::scheduler::{Scheduler, TaskKind};
use std::time::Duration;

/// Builds the heartbeat payload from current agent state.
pub fn build_request(agent: &Agent) -> HeartbeatRequest {
    let counters = agent.activity.snapshot();
    HeartbeatRequest {
        status: if agent.timer.is_running() { "online".to_string() } else { "idle".to_string() },
        clicks: counters.clicks,
        keystrokes: counters.keystrokes,
    }
}

/// Applies a server-pushed settings/privacy payload to the cached config.
///
/// A changed capture interval takes effect immediately: the capture task is
/// re-registered with the new period while monitoring runs, not parked until
/// the next monitoring restart.
pub fn merge_response(agent: &mut Agent, sched: &mut Scheduler, response: HeartbeatResponse) {
    let mut changed = false;
    if let Some(settings) = response.settings {
        if settings != agent.config.settings {
            let old_interval = agent.config.settings.capture_interval_minutes;
            tracing::info!("server pushed updated settings");
            agent.config.settings = settings;
            changed = true;

            let minutes = agent.config.settings.capture_interval_minutes;
            if agent.is_monitoring && minutes != old_interval {
                let period = Duration::from_secs(minutes * 60);
                sched.reschedule(TaskKind::Capture, period, period);
                tracing::info!(capture_interval_minutes = minutes, "capture cadence rescheduled");
            }
        }
    }
    if let Some(privacy) = response.privacy {
        if privacy != agent.config.privacy {
            tracing::info!("server pushed updated privacy flags");
            agent.config.privacy = privacy;
            changed = true;
        }
    }
    if changed {
        if let Err(e) = agent.config.save() {
            tracing::warn!("failed to persist pushed settings: {e}");
        }
    }
}

/// One heartbeat cycle.
pub async fn on_heartbeat_tick(agent: &mut Agent, sched: &mut Scheduler) {
    let request = build_request(agent);

    match agent.gateway.heartbeat(&request).await {
        Ok(response) => {
            agent.is_server_reachable = true;
            merge_response(agent, sched, response);
        }
        Err(ApiError::Connectivity(e)) => {
            agent.is_server_reachable = false;
            tracing::warn!("heartbeat failed: {e}");
        }
        Err(ApiError::Auth) => monitor::handle_auth_expiry(agent, sched).await,
        Err(e @ ApiError::Validation { .. }) => tracing::warn!("heartbeat rejected: {e}"),
    }
}
