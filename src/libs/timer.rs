//! Work-timer state machine.
//!
//! Two states: `Stopped` and `Running`. Starting is guarded on monitoring
//! being active and creates the entry server-side; the server enforces the
//! single-active-entry invariant and computes the authoritative duration at
//! stop time. `status()` reconciles local state with server truth.

use crate::api::{ApiError, TimerEntry, TimerStartRequest, TimerStatusResponse};
use crate::libs::agent::{Agent, AgentSignal};
use crate::libs::monitor;
use crate::libs::scheduler::Scheduler;
use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    /// Guard rejection: no state change, no network call.
    #[error("monitoring must be active to start a timer")]
    MonitoringInactive,
    #[error("no timer is running")]
    NotRunning,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TimerState {
    #[default]
    Stopped,
    Running {
        entry: TimerEntry,
    },
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    pub fn entry(&self) -> Option<&TimerEntry> {
        match self {
            TimerState::Running { entry } => Some(entry),
            TimerState::Stopped => None,
        }
    }
}

/// Starts a work timer.
///
/// Rejected with [`TimerError::MonitoringInactive`] before any network call
/// when monitoring is off. On success the server-issued id and start time are
/// adopted and idle detection begins.
pub async fn start(
    agent: &mut Agent,
    sched: &mut Scheduler,
    project: Option<String>,
    notes: Option<String>,
) -> Result<TimerEntry, TimerError> {
    if !agent.is_monitoring {
        return Err(TimerError::MonitoringInactive);
    }
    if let TimerState::Running { entry } = &agent.timer {
        tracing::debug!(id = entry.id, "timer already running");
        return Ok(entry.clone());
    }

    let request = TimerStartRequest {
        project: project.clone(),
        notes: notes.clone(),
    };
    let res = match agent.gateway.timer_start(&request).await {
        Ok(res) => res,
        Err(e) => return Err(api_failure(agent, sched, e).await),
    };

    let entry = TimerEntry {
        id: res.id,
        start_time: res.start_time,
        end_time: None,
        duration_seconds: None,
        project,
        notes,
        is_active: true,
    };
    agent.timer = TimerState::Running { entry: entry.clone() };
    agent.idle.activate();
    tracing::info!(id = entry.id, "timer started");
    Ok(entry)
}

/// Stops the running timer and adopts the server-computed duration.
pub async fn stop(agent: &mut Agent, sched: &mut Scheduler) -> Result<TimerEntry, TimerError> {
    let entry = match &agent.timer {
        TimerState::Running { entry } => entry.clone(),
        TimerState::Stopped => return Err(TimerError::NotRunning),
    };

    let res = match agent.gateway.timer_stop().await {
        Ok(res) => res,
        Err(e) => return Err(api_failure(agent, sched, e).await),
    };

    agent.timer = TimerState::Stopped;
    agent.idle.deactivate();
    tracing::info!(id = res.id, duration = res.duration_seconds, "timer stopped");
    Ok(TimerEntry {
        end_time: Some(res.end_time),
        duration_seconds: Some(res.duration_seconds),
        is_active: false,
        ..entry
    })
}

/// Queries server-side timer status and corrects local state to match.
///
/// The server is authoritative: if it reports a different active entry than
/// the one held locally, the local state machine adopts the server's view.
pub async fn status(agent: &mut Agent, sched: &mut Scheduler) -> Result<TimerStatusResponse, TimerError> {
    let res = match agent.gateway.timer_status().await {
        Ok(res) => res,
        Err(e) => return Err(api_failure(agent, sched, e).await),
    };

    match (&res.active_entry, res.is_running) {
        (Some(entry), true) => {
            if agent.timer.entry().map(|e| e.id) != Some(entry.id) {
                tracing::debug!(id = entry.id, "adopting server-side active timer");
                agent.timer = TimerState::Running { entry: entry.clone() };
                agent.idle.activate();
            }
        }
        _ => {
            if agent.timer.is_running() {
                tracing::debug!("server reports no active timer, correcting local state");
            }
            agent.timer = TimerState::Stopped;
            agent.idle.deactivate();
        }
    }
    Ok(res)
}

/// Maps a gateway failure into [`TimerError`]. A 401 tears everything down
/// first: any authenticated call learning the session is dead must clear it
/// and stop the periodic work immediately, not leave that to the next
/// heartbeat.
async fn api_failure(agent: &mut Agent, sched: &mut Scheduler, e: ApiError) -> TimerError {
    if matches!(e, ApiError::Auth) {
        monitor::handle_auth_expiry(agent, sched).await;
    }
    TimerError::Api(e)
}

/// Cosmetic once-per-second elapsed signal while the timer runs.
///
/// Purely presentational; the authoritative duration is computed server-side
/// at stop time.
pub fn on_elapsed_tick(agent: &mut Agent) {
    if let TimerState::Running { entry } = &agent.timer {
        let elapsed = (Utc::now() - entry.start_time).num_seconds().max(0);
        agent.emit(AgentSignal::TimerElapsed(elapsed));
    }
}
