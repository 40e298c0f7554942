#![allow(dead_code)]

//! Shared test fixtures: a minimal in-process collection server, fake
//! capture/window capabilities and an agent factory.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use traka::api::TimerEntry;
use traka::libs::agent::{Agent, AgentSignal};
use traka::libs::capture::{CaptureError, ScreenCapture};
use traka::libs::config::{Config, MonitorConfig, ServerConfig};
use traka::libs::scheduler::{AgentEvent, Scheduler};
use traka::libs::session::Session;
use traka::libs::timer::TimerState;
use traka::libs::window::{ForegroundWindow, WindowProbe};

/// Tiny HTTP/1.1 server backing gateway calls in tests.
///
/// Records every request line and serves canned JSON per route; individual
/// routes can be overridden to exercise failure paths.
pub struct TestServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

struct ServerState {
    requests: Mutex<Vec<String>>,
    overrides: Mutex<HashMap<String, (u16, String)>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState {
            requests: Mutex::new(Vec::new()),
            overrides: Mutex::new(HashMap::new()),
        });

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = server_state.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, state).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Overrides the response for a path (matched by suffix).
    pub fn set_response(&self, path: &str, status: u16, body: &str) {
        self.state.overrides.lock().insert(path.to_string(), (status, body.to_string()));
    }

    /// Number of requests whose path contains `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state.requests.lock().iter().filter(|r| r.contains(path)).count()
    }

    pub fn total_hits(&self) -> usize {
        self.state.requests.lock().len()
    }
}

async fn handle_connection(mut stream: tokio::net::TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    let mut buf = vec![0u8; 1 << 20];
    let mut read = 0;

    let (request_line, header_len, content_length) = loop {
        let n = stream.read(&mut buf[read..]).await?;
        if n == 0 {
            return Ok(());
        }
        read += n;
        if let Some(pos) = find_headers_end(&buf[..read]) {
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            let request_line = head.lines().next().unwrap_or_default().to_string();
            let content_length = head
                .lines()
                .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            break (request_line, pos + 4, content_length);
        }
        if read == buf.len() {
            return Ok(());
        }
    };

    while read < header_len + content_length {
        let n = stream.read(&mut buf[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    state.requests.lock().push(request_line);

    let (status, body) = {
        let overrides = state.overrides.lock();
        overrides
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| default_response(&path))
    };

    let response = format!(
        "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn default_response(path: &str) -> (u16, String) {
    let body = match path {
        p if p.ends_with("/ping") => "{}",
        p if p.ends_with("/register") => r#"{"token":"tok-1","agent_id":"agent-1","member_name":"Test Member"}"#,
        p if p.ends_with("/heartbeat") => "{}",
        p if p.ends_with("/screenshots") => "{}",
        p if p.ends_with("/timer/start") => r#"{"id":1,"start_time":"2026-08-30T09:00:00Z"}"#,
        p if p.ends_with("/timer/stop") => r#"{"id":1,"end_time":"2026-08-30T10:00:00Z","duration_seconds":3600}"#,
        p if p.ends_with("/timer/status") => r#"{"is_running":false,"active_entry":null,"today_totals":0}"#,
        p if p.ends_with("/timer/idle") => "{}",
        p if p.ends_with("/app-usage") => r#"{"status":"ok"}"#,
        _ => return (404, "{}".to_string()),
    };
    (200, body.to_string())
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests within one binary: the durable store is addressed through
/// process-wide env vars, so storage-touching tests must not interleave.
pub fn env_guard() -> parking_lot::MutexGuard<'static, ()> {
    ENV_LOCK.lock()
}

/// Standard context: serialized env, isolated storage, one test server.
pub struct AgentTestContext {
    pub server: TestServer,
    pub _temp: TempDir,
    _guard: parking_lot::MutexGuard<'static, ()>,
}

impl test_context::AsyncTestContext for AgentTestContext {
    async fn setup() -> Self {
        let server = TestServer::spawn().await;
        let _guard = env_guard();
        let _temp = isolated_storage();
        AgentTestContext { server, _temp, _guard }
    }
}

/// Redirects the durable store into a temp dir. Returned guard must be kept
/// alive for the duration of the test.
pub fn isolated_storage() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    std::env::set_var("HOME", temp.path());
    std::env::set_var("LOCALAPPDATA", temp.path());
    temp
}

pub fn test_config(api_url: &str) -> Config {
    let mut config = Config::default();
    config.server = Some(ServerConfig {
        api_url: api_url.to_string(),
    });
    config.monitor = Some(MonitorConfig {
        heartbeat_interval: 1,
        app_sample_interval: 1,
        idle_poll_interval: 1,
        capture_warmup: 0,
    });
    config
}

pub fn test_session() -> Session {
    Session {
        token: "tok-1".to_string(),
        agent_id: "agent-1".to_string(),
        display_name: "Test Member".to_string(),
    }
}

#[derive(Clone)]
pub struct FakeCapture {
    pub fail: Arc<Mutex<bool>>,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            fail: Arc::new(Mutex::new(false)),
        }
    }
}

impl ScreenCapture for FakeCapture {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        if *self.fail.lock() {
            Err(CaptureError::Failed("fake capture failure".to_string()))
        } else {
            // A real (tiny) PNG so blur and re-encode paths can run on it.
            let frame = image::RgbaImage::from_pixel(16, 16, image::Rgba([40, 90, 160, 255]));
            let mut buf = Vec::new();
            image::DynamicImage::ImageRgba8(frame)
                .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
                .unwrap();
            Ok(buf)
        }
    }
}

#[derive(Clone)]
pub struct FakeWindow {
    pub current: Arc<Mutex<Option<ForegroundWindow>>>,
}

impl FakeWindow {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn focus(&self, app: &str, title: &str) {
        *self.current.lock() = Some(ForegroundWindow {
            app_name: app.to_string(),
            window_title: title.to_string(),
        });
    }
}

impl WindowProbe for FakeWindow {
    fn foreground(&self) -> Option<ForegroundWindow> {
        self.current.lock().clone()
    }
}

pub struct Harness {
    pub agent: Agent,
    pub sched: Scheduler,
    pub events: UnboundedReceiver<AgentEvent>,
    pub signals: UnboundedReceiver<AgentSignal>,
    pub capture: FakeCapture,
    pub window: FakeWindow,
}

/// Builds an agent wired to the given server with fake capabilities.
pub fn make_agent(api_url: &str) -> Harness {
    let capture = FakeCapture::new();
    let window = FakeWindow::new();
    let (agent, signals) = Agent::new(
        test_config(api_url),
        Some(test_session()),
        Box::new(capture.clone()),
        Box::new(window.clone()),
    );
    let (tx, events) = unbounded_channel();
    let sched = Scheduler::new(tx);
    Harness {
        agent,
        sched,
        events,
        signals,
        capture,
        window,
    }
}

/// Puts the agent's timer into Running with a known entry, bypassing the
/// network, for tests that focus on downstream behavior.
pub fn force_running_timer(agent: &mut Agent, project: Option<&str>, notes: Option<&str>) {
    let entry = TimerEntry {
        id: 1,
        start_time: chrono::Utc::now(),
        end_time: None,
        duration_seconds: None,
        project: project.map(|s| s.to_string()),
        notes: notes.map(|s| s.to_string()),
        is_active: true,
    };
    agent.timer = TimerState::Running { entry };
    agent.idle.activate();
}
