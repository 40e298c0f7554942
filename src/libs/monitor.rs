//! The monitoring controller.
//!
//! The single place monitoring is turned on or off. `start()` registers all
//! periodic tasks or none: registration happens synchronously before control
//! returns to the dispatch loop, so no task body can observe a partially
//! started state. `stop()` cancels every registered task before returning.

use crate::libs::agent::{Agent, AgentSignal};
use crate::libs::heartbeat;
use crate::libs::scheduler::{Scheduler, TaskKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("not logged in; run `traka login` first")]
    NoSession,
    #[error("collection server is unreachable")]
    Unreachable,
}

/// Turns monitoring on.
///
/// Probes connectivity first; an unreachable server fails the call with no
/// state change. A second `start()` while already monitoring is a no-op.
pub async fn start(agent: &mut Agent, sched: &mut Scheduler) -> Result<(), MonitorError> {
    if agent.is_monitoring {
        tracing::debug!("monitoring already active");
        return Ok(());
    }
    if agent.session.is_none() {
        return Err(MonitorError::NoSession);
    }

    if !agent.gateway.probe().await {
        agent.is_server_reachable = false;
        return Err(MonitorError::Unreachable);
    }
    agent.is_server_reachable = true;

    let settings = &agent.config.settings;
    let cadences = agent.config.monitor_or_default();
    let capture_period = Duration::from_secs(settings.capture_interval_minutes * 60);

    // First capture after a short warm-up so it reflects some activity.
    sched.register(TaskKind::Capture, Duration::from_secs(cadences.capture_warmup), capture_period);
    sched.register(TaskKind::Heartbeat, Duration::ZERO, Duration::from_secs(cadences.heartbeat_interval));
    sched.register(TaskKind::AppSample, Duration::ZERO, Duration::from_secs(cadences.app_sample_interval));
    sched.register(TaskKind::IdlePoll, Duration::ZERO, Duration::from_secs(cadences.idle_poll_interval));
    sched.register(TaskKind::Elapsed, Duration::from_secs(1), Duration::from_secs(1));

    agent.activity.touch();
    // A timer that survived a stop/start cycle gets its idle detection back.
    if agent.timer.is_running() {
        agent.idle.activate();
    }
    agent.is_monitoring = true;
    agent.emit(AgentSignal::MonitoringChanged(true));
    tracing::info!(
        capture_interval_minutes = settings.capture_interval_minutes,
        heartbeat_interval = cadences.heartbeat_interval,
        "monitoring started"
    );
    Ok(())
}

/// Turns monitoring off. Idempotent.
///
/// Cancels every registered task, deactivates idle detection and sends one
/// final heartbeat carrying the idle status (best effort).
pub async fn stop(agent: &mut Agent, sched: &mut Scheduler) {
    if !agent.is_monitoring {
        return;
    }

    sched.cancel_all();
    agent.idle.deactivate();
    agent.is_monitoring = false;

    // Final liveness report so the dashboard flips to idle promptly.
    let mut request = heartbeat::build_request(agent);
    request.status = "idle".to_string();
    if let Err(e) = agent.gateway.heartbeat(&request).await {
        tracing::debug!("final heartbeat not delivered: {e}");
    }

    agent.emit(AgentSignal::MonitoringChanged(false));
    tracing::info!("monitoring stopped");
}

/// Dispatches to start or stop based on current state.
pub async fn toggle(agent: &mut Agent, sched: &mut Scheduler) -> Result<(), MonitorError> {
    if agent.is_monitoring {
        stop(agent, sched).await;
        Ok(())
    } else {
        start(agent, sched).await
    }
}

/// Teardown after any gateway call returned 401: all periodic work stops,
/// the session is cleared and the UI is told to re-authenticate.
pub async fn handle_auth_expiry(agent: &mut Agent, sched: &mut Scheduler) {
    tracing::warn!("session rejected by server, stopping monitoring");
    if agent.is_monitoring {
        sched.cancel_all();
        agent.idle.deactivate();
        agent.timer = crate::libs::timer::TimerState::Stopped;
        agent.is_monitoring = false;
        agent.emit(AgentSignal::MonitoringChanged(false));
    }
    agent.invalidate_session();
}
