//! The agent aggregate.
//!
//! All mutable process state lives here and is owned by the single dispatch
//! loop; subsystems receive `&mut Agent` and never touch ambient statics.
//! Presentation-level side effects (status changes, auth expiry, the cosmetic
//! elapsed counter) leave through the signal channel.

use crate::api::Gateway;
use crate::libs::activity::ActivityListener;
use crate::libs::capture::ScreenCapture;
use crate::libs::config::Config;
use crate::libs::idle::IdleTracker;
use crate::libs::session::Session;
use crate::libs::timer::TimerState;
use crate::libs::window::WindowProbe;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Out-of-band notifications for the surrounding UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentSignal {
    /// Monitoring was turned on or off.
    MonitoringChanged(bool),
    /// A 401 invalidated the session; re-authentication is required.
    AuthExpired,
    /// Cosmetic elapsed seconds of the running timer, emitted once per second.
    TimerElapsed(i64),
}

pub struct Agent {
    pub config: Config,
    pub session: Option<Session>,
    pub gateway: Gateway,
    pub activity: ActivityListener,
    pub capture: Box<dyn ScreenCapture>,
    pub window: Box<dyn WindowProbe>,

    /// Mutated only by the monitoring controller; read by every tick handler.
    pub is_monitoring: bool,
    pub is_server_reachable: bool,

    pub timer: TimerState,
    pub idle: IdleTracker,
    /// Last (app name, window title) pair reported by the app tracker.
    pub last_reported_app: Option<(String, String)>,

    signals: UnboundedSender<AgentSignal>,
}

impl Agent {
    pub fn new(
        config: Config,
        session: Option<Session>,
        capture: Box<dyn ScreenCapture>,
        window: Box<dyn WindowProbe>,
    ) -> (Self, UnboundedReceiver<AgentSignal>) {
        let api_url = config.server.as_ref().map(|s| s.api_url.clone()).unwrap_or_default();
        let gateway = Gateway::new(&api_url, session.as_ref().map(|s| s.token.clone()));
        let (signals, signal_rx) = unbounded_channel();

        let agent = Agent {
            config,
            session,
            gateway,
            activity: ActivityListener::new(),
            capture,
            window,
            is_monitoring: false,
            is_server_reachable: true,
            timer: TimerState::Stopped,
            idle: IdleTracker::default(),
            last_reported_app: None,
            signals,
        };
        (agent, signal_rx)
    }

    /// Sends a signal to the UI layer. A closed receiver is not an error; the
    /// agent keeps running headless.
    pub fn emit(&self, signal: AgentSignal) {
        let _ = self.signals.send(signal);
    }

    /// Drops the local session after a 401: file, memory and gateway token.
    pub fn invalidate_session(&mut self) {
        if let Err(e) = Session::clear() {
            tracing::warn!("failed to remove session file: {e}");
        }
        self.session = None;
        self.gateway.set_token(None);
        self.emit(AgentSignal::AuthExpired);
    }
}
