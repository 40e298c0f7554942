//! The agent process: wires the aggregate, the scheduler and the signal
//! handlers together and runs the dispatch loop until shutdown.

use crate::libs::agent::{Agent, AgentSignal};
use crate::libs::capture::PrimaryDisplay;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::monitor;
use crate::libs::power;
use crate::libs::scheduler::{self, AgentEvent, Scheduler};
use crate::libs::session::Session;
use crate::libs::timer;
use crate::libs::window::ActiveWindowProbe;
use crate::{msg_bail_anyhow, msg_error};
use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Turn monitoring on immediately, regardless of the auto-start setting.
    #[arg(long)]
    pub monitor: bool,
    /// Start a work timer once monitoring is up.
    #[arg(long)]
    pub start_timer: bool,
    /// Project attached to the started timer.
    #[arg(long)]
    pub project: Option<String>,
    /// Notes attached to the started timer.
    #[arg(long)]
    pub notes: Option<String>,
}

pub async fn cmd(args: RunArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("traka=info")))
        .init();

    let config = Config::read()?;
    if config.server.is_none() {
        msg_bail_anyhow!(Message::NoServerConfigured);
    }
    let session = Session::read()?;
    if session.is_none() {
        msg_bail_anyhow!(Message::NotLoggedIn);
    }

    let auto_start = config.settings.auto_start_monitoring;
    let (mut agent, mut signal_rx) = Agent::new(config, session, Box::new(PrimaryDisplay), Box::new(ActiveWindowProbe));
    agent.activity.spawn();

    let (tx, mut rx) = unbounded_channel();
    let mut sched = Scheduler::new(tx.clone());

    spawn_shutdown_handler(tx.clone());
    power::spawn_watcher(tx);
    tokio::spawn(async move {
        while let Some(signal) = signal_rx.recv().await {
            match signal {
                AgentSignal::MonitoringChanged(on) => tracing::info!(monitoring = on, "status changed"),
                AgentSignal::AuthExpired => msg_error!(Message::SessionExpired),
                AgentSignal::TimerElapsed(seconds) => tracing::trace!(seconds, "timer elapsed"),
            }
        }
    });

    if auto_start || args.monitor {
        monitor::start(&mut agent, &mut sched).await?;
        if args.start_timer {
            if let Err(e) = timer::start(&mut agent, &mut sched, args.project, args.notes).await {
                tracing::error!("could not start timer: {e}");
            }
        }
    } else {
        tracing::info!("monitoring idle; enable auto-start or pass --monitor");
    }

    scheduler::run_loop(&mut agent, &mut sched, &mut rx).await;
    tracing::info!("agent exited");
    Ok(())
}

/// SIGTERM/SIGINT turn into one shutdown event on the agent channel, so
/// teardown happens inside the dispatch loop like everything else.
fn spawn_shutdown_handler(tx: UnboundedSender<AgentEvent>) {
    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            r = tokio::signal::ctrl_c() => {
                if let Err(e) = r {
                    tracing::error!("ctrl-c listener failed: {e}");
                }
            }
        }
        let _ = tx.send(AgentEvent::Shutdown);
    });

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("ctrl-c listener failed: {e}");
        }
        let _ = tx.send(AgentEvent::Shutdown);
    });
}
