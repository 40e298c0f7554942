//! Cooperative single-loop scheduling.
//!
//! Every periodic subsystem is a tick producer feeding one mpsc channel; the
//! dispatch loop owns the [`Agent`] mutably and applies all side effects, so
//! no two task bodies ever race over shared state. Cancellation is a
//! generation bump: stopping monitoring aborts the producers and increments
//! the generation, and the loop drops any tick (or late completion) stamped
//! with a stale generation, so nothing fires after `stop()` returns.

use crate::libs::agent::Agent;
use crate::libs::power::{self, PowerEvent};
use crate::libs::{capture, heartbeat, idle, monitor, timer, tracker};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Capture,
    Heartbeat,
    IdlePoll,
    AppSample,
    Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    Tick { task: TaskKind, generation: u64 },
    Power(PowerEvent),
    Shutdown,
}

pub struct Scheduler {
    tx: UnboundedSender<AgentEvent>,
    handles: Vec<(TaskKind, JoinHandle<()>)>,
    generation: u64,
}

impl Scheduler {
    pub fn new(tx: UnboundedSender<AgentEvent>) -> Self {
        Self {
            tx,
            handles: Vec::new(),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Number of registered periodic tasks.
    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Registers a periodic tick producer. The first tick fires after
    /// `delay`, then every `period`. Ticks are stamped with the current
    /// generation at registration time.
    pub fn register(&mut self, task: TaskKind, delay: Duration, period: Duration) {
        let tx = self.tx.clone();
        let generation = self.generation;
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + delay, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(AgentEvent::Tick { task, generation }).is_err() {
                    break;
                }
            }
        });
        self.handles.push((task, handle));
    }

    /// Replaces the producer for one task with a fresh delay/period.
    ///
    /// The generation is not bumped: an already-queued tick from the old
    /// producer still dispatches once, which is harmless for any of the
    /// periodic tasks. Used when a server-pushed setting changes a cadence
    /// while monitoring runs.
    pub fn reschedule(&mut self, task: TaskKind, delay: Duration, period: Duration) {
        self.handles.retain(|(kind, handle)| {
            if *kind == task {
                handle.abort();
                false
            } else {
                true
            }
        });
        self.register(task, delay, period);
    }

    /// Aborts all tick producers and invalidates queued ticks by bumping the
    /// generation. Synchronous: once this returns no tick can be applied.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain(..) {
            handle.abort();
        }
        self.generation += 1;
    }
}

/// Applies one event to the agent. Returns `false` when the loop should end.
pub async fn dispatch(agent: &mut Agent, sched: &mut Scheduler, event: AgentEvent) -> bool {
    match event {
        AgentEvent::Tick { task, generation } => {
            if !sched.is_current(generation) {
                tracing::trace!(?task, "dropping stale tick");
                return true;
            }
            if !agent.is_monitoring {
                return true;
            }
            match task {
                TaskKind::Capture => capture::on_capture_tick(agent, sched).await,
                TaskKind::Heartbeat => heartbeat::on_heartbeat_tick(agent, sched).await,
                TaskKind::IdlePoll => idle::on_idle_tick(agent, sched).await,
                TaskKind::AppSample => tracker::on_app_tick(agent, sched).await,
                TaskKind::Elapsed => timer::on_elapsed_tick(agent),
            }
            true
        }
        AgentEvent::Power(event) => {
            power::handle_power_event(agent, sched, event).await;
            true
        }
        AgentEvent::Shutdown => {
            monitor::stop(agent, sched).await;
            false
        }
    }
}

/// Runs the dispatch loop until shutdown or channel closure.
pub async fn run_loop(agent: &mut Agent, sched: &mut Scheduler, rx: &mut UnboundedReceiver<AgentEvent>) {
    while let Some(event) = rx.recv().await {
        if !dispatch(agent, sched, event).await {
            break;
        }
    }
}
