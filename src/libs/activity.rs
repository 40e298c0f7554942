//! Input activity accounting.
//!
//! A background thread listens for keyboard and mouse events via `rdev` and
//! feeds two pieces of shared state: the click/keystroke counters consumed by
//! captures and heartbeats, and the last-activity timestamp consumed by idle
//! detection. The timestamp is updated on every recorded event regardless of
//! whether any detector is running, so idle spans always measure true input
//! silence.

use parking_lot::Mutex;
use rdev::{listen, Event, EventType};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Volatile in-memory counters, reset only after a successful capture upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounters {
    pub clicks: u64,
    pub keystrokes: u64,
}

struct Shared {
    counters: Mutex<ActivityCounters>,
    last_activity: Mutex<Instant>,
}

#[derive(Clone)]
pub struct ActivityListener {
    shared: Arc<Shared>,
}

impl ActivityListener {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                counters: Mutex::new(ActivityCounters::default()),
                last_activity: Mutex::new(Instant::now()),
            }),
        }
    }

    /// Spawns the OS input listener thread.
    ///
    /// `rdev::listen` blocks forever; on error the listener is restarted
    /// after a short delay so monitoring never silently loses input events.
    pub fn spawn(&self) {
        let shared = self.shared.clone();
        std::thread::spawn(move || loop {
            let shared = shared.clone();
            if let Err(e) = listen(move |event: Event| match event.event_type {
                EventType::KeyPress(_) => {
                    shared.counters.lock().keystrokes += 1;
                    *shared.last_activity.lock() = Instant::now();
                }
                EventType::ButtonPress(_) => {
                    shared.counters.lock().clicks += 1;
                    *shared.last_activity.lock() = Instant::now();
                }
                EventType::Wheel { .. } | EventType::MouseMove { .. } => {
                    *shared.last_activity.lock() = Instant::now();
                }
                _ => {}
            }) {
                tracing::warn!("input listener failed: {:?}, retrying in 1s", e);
                std::thread::sleep(Duration::from_secs(1));
            } else {
                break;
            }
        });
    }

    pub fn record_click(&self) {
        self.shared.counters.lock().clicks += 1;
        *self.shared.last_activity.lock() = Instant::now();
    }

    pub fn record_keystroke(&self) {
        self.shared.counters.lock().keystrokes += 1;
        *self.shared.last_activity.lock() = Instant::now();
    }

    pub fn snapshot(&self) -> ActivityCounters {
        *self.shared.counters.lock()
    }

    /// Zeroes the counters. Called only right after a successful capture
    /// upload; a failed upload leaves the counters untouched so the next
    /// successful capture claims the full activity window.
    pub fn reset(&self) {
        *self.shared.counters.lock() = ActivityCounters::default();
    }

    /// Elapsed time since the last recorded input event.
    pub fn idle_for(&self) -> Duration {
        self.shared.last_activity.lock().elapsed()
    }

    /// Marks "now" as the last activity instant. Used at monitoring start and
    /// by tests.
    pub fn touch(&self) {
        *self.shared.last_activity.lock() = Instant::now();
    }

    /// Backdates the last activity instant. Test hook for idle detection.
    #[doc(hidden)]
    pub fn backdate(&self, by: Duration) {
        *self.shared.last_activity.lock() = Instant::now() - by;
    }
}

impl Default for ActivityListener {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded 0-100 activity score.
///
/// Click and keystroke volumes are weighted independently: 100 clicks or 500
/// keystrokes each saturate their 50-point half.
pub fn activity_score(counters: &ActivityCounters) -> u8 {
    let clicks = (counters.clicks as f64 / 100.0).min(1.0) * 50.0;
    let keys = (counters.keystrokes as f64 / 500.0).min(1.0) * 50.0;
    (clicks + keys).round() as u8
}
