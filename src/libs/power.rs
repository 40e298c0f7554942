//! OS power-state transitions.
//!
//! Suspend and lock pause the timer and monitoring; the intent is persisted
//! in a resume flag so it survives a process restart across sleep. Resume and
//! unlock restore what was paused and always refresh timer status from the
//! server, which is authoritative.

use crate::libs::agent::Agent;
use crate::libs::data_storage::DataStorage;
use crate::libs::monitor;
use crate::libs::scheduler::{AgentEvent, Scheduler};
use crate::libs::timer::{self, TimerError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::MissedTickBehavior;

pub const RESUME_FILE_NAME: &str = ".resume";

/// Watcher poll cadence.
const WATCH_INTERVAL: Duration = Duration::from_secs(2);

/// A wall-clock gap larger than this between two watcher polls means the
/// process was not running in between, i.e. the machine slept.
const SLEEP_GAP_THRESHOLD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Suspend,
    Resume,
    Lock,
    Unlock,
}

/// Durable record of what was running when the machine went down.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ResumeFlag {
    pub timer_was_running: bool,
    pub monitoring_was_active: bool,
    pub project: Option<String>,
    pub notes: Option<String>,
}

impl ResumeFlag {
    pub fn read() -> Result<Option<ResumeFlag>> {
        let path = DataStorage::new().get_path(RESUME_FILE_NAME)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self) -> Result<()> {
        let path = DataStorage::new().get_path(RESUME_FILE_NAME)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(&file, self)?;
        Ok(())
    }

    pub fn clear() -> Result<()> {
        let path = DataStorage::new().get_path(RESUME_FILE_NAME)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Spawns the power-signal source feeding the agent channel.
///
/// Suspend is detected by wall-clock gaps: the watcher polls on a short
/// cadence and compares `SystemTime` between polls. Monotonic clocks stop
/// during system sleep on the platforms we run on, so the wall clock is the
/// one that exposes the gap. On detection the watcher emits `Suspend` then
/// `Resume` back-to-back; the pause half runs retroactively (persisting the
/// resume flag and closing the timer server-side) and the wake half restores
/// what it recorded. Lock/unlock have no portable source and arrive only on
/// platforms with a session-bus integration.
pub fn spawn_watcher(tx: UnboundedSender<AgentEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WATCH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = SystemTime::now();
        loop {
            interval.tick().await;
            let now = SystemTime::now();
            let gap = now.duration_since(last).unwrap_or(Duration::ZERO);
            if slept_through(gap) {
                tracing::info!(gap_secs = gap.as_secs(), "wall-clock gap detected, machine slept");
                if !emit_sleep_transition(&tx) {
                    break;
                }
            }
            last = now;
        }
    });
}

fn slept_through(gap: Duration) -> bool {
    gap > SLEEP_GAP_THRESHOLD
}

/// Queues the suspend/resume pair. Returns false when the agent is gone.
fn emit_sleep_transition(tx: &UnboundedSender<AgentEvent>) -> bool {
    tx.send(AgentEvent::Power(PowerEvent::Suspend)).is_ok()
        && tx.send(AgentEvent::Power(PowerEvent::Resume)).is_ok()
}

pub async fn handle_power_event(agent: &mut Agent, sched: &mut Scheduler, event: PowerEvent) {
    match event {
        PowerEvent::Suspend | PowerEvent::Lock => on_pause(agent, sched, event).await,
        PowerEvent::Resume | PowerEvent::Unlock => on_wake(agent, sched, event).await,
    }
}

async fn on_pause(agent: &mut Agent, sched: &mut Scheduler, event: PowerEvent) {
    tracing::info!(?event, "power pause");

    let flag = ResumeFlag {
        timer_was_running: agent.timer.is_running(),
        monitoring_was_active: agent.is_monitoring,
        project: agent.timer.entry().and_then(|e| e.project.clone()),
        notes: agent.timer.entry().and_then(|e| e.notes.clone()),
    };

    if agent.timer.is_running() {
        if flag.save().is_err() {
            tracing::warn!("failed to persist resume flag");
        }
        match timer::stop(agent, sched).await {
            Ok(_) => {}
            Err(TimerError::Api(e)) => {
                // The machine is going down; transition locally regardless.
                tracing::warn!("timer stop on suspend failed: {e}");
                agent.timer = crate::libs::timer::TimerState::Stopped;
                agent.idle.deactivate();
            }
            Err(e) => tracing::warn!("timer stop on suspend failed: {e}"),
        }
    } else if flag.monitoring_was_active {
        if flag.save().is_err() {
            tracing::warn!("failed to persist resume flag");
        }
    }

    if agent.is_monitoring {
        monitor::stop(agent, sched).await;
    }
}

async fn on_wake(agent: &mut Agent, sched: &mut Scheduler, event: PowerEvent) {
    tracing::info!(?event, "power wake");

    let flag = match ResumeFlag::read() {
        Ok(flag) => flag.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("failed to read resume flag: {e}");
            ResumeFlag::default()
        }
    };

    if flag.monitoring_was_active && !agent.is_monitoring {
        if let Err(e) = monitor::start(agent, sched).await {
            tracing::warn!("could not resume monitoring: {e}");
        }
    }

    if flag.timer_was_running && agent.is_monitoring {
        if let Err(e) = ResumeFlag::clear() {
            tracing::warn!("failed to clear resume flag: {e}");
        }
        match timer::start(agent, sched, flag.project.clone(), flag.notes.clone()).await {
            Ok(entry) => tracing::info!(id = entry.id, "timer resumed"),
            Err(e) => tracing::warn!("could not resume timer: {e}"),
        }
    } else if flag != ResumeFlag::default() && !flag.timer_was_running {
        let _ = ResumeFlag::clear();
    }

    // Always reconcile with server truth after a wake, resumed or not.
    if let Err(e) = timer::status(agent, sched).await {
        tracing::warn!("status refresh after wake failed: {e}");
    }
}
