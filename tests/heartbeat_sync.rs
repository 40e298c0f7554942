mod common;

use common::{make_agent, AgentTestContext};
use test_context::test_context;
use traka::libs::agent::AgentSignal;
use traka::libs::config::Config;
use traka::libs::heartbeat;
use traka::libs::monitor;
use traka::libs::session::Session;

#[test_context(AgentTestContext)]
#[tokio::test]
async fn heartbeat_carries_counters_without_resetting_them(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    h.agent.is_monitoring = true;
    h.agent.activity.record_click();
    h.agent.activity.record_keystroke();

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert_eq!(ctx.server.hits("/heartbeat"), 1);
    // Only a successful capture upload resets counters, never a heartbeat.
    assert_eq!(h.agent.activity.snapshot().clicks, 1);
    assert_eq!(h.agent.activity.snapshot().keystrokes, 1);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn server_pushed_settings_are_merged_and_persisted(ctx: &mut AgentTestContext) {
    ctx.server.set_response(
        "/heartbeat",
        200,
        r#"{"settings":{"capture_interval_minutes":10,"idle_threshold_minutes":3,"auto_start_monitoring":true},"privacy":{"privacy_mode":true,"track_apps":false,"track_urls":false,"blur_screenshots":true}}"#,
    );
    let mut h = make_agent(&ctx.server.base_url);
    h.agent.is_monitoring = true;

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert_eq!(h.agent.config.settings.capture_interval_minutes, 10);
    assert!(h.agent.config.privacy.privacy_mode);
    // The merged config is written back to the durable store in one piece.
    let persisted = Config::read().unwrap();
    assert_eq!(persisted.settings.idle_threshold_minutes, 3);
    assert!(persisted.privacy.blur_screenshots);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn pushed_capture_interval_recadences_without_dropping_tasks(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    let tasks = h.sched.task_count();
    let generation = h.sched.generation();
    ctx.server.set_response(
        "/heartbeat",
        200,
        r#"{"settings":{"capture_interval_minutes":10,"idle_threshold_minutes":5,"auto_start_monitoring":false}}"#,
    );

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert_eq!(h.agent.config.settings.capture_interval_minutes, 10);
    // Only the capture task is swapped; the roster and generation hold, so
    // queued ticks from the other tasks stay valid.
    assert_eq!(h.sched.task_count(), tasks);
    assert_eq!(h.sched.generation(), generation);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn unchanged_capture_interval_leaves_schedule_alone(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    let interval = h.agent.config.settings.capture_interval_minutes;
    let tasks = h.sched.task_count();
    ctx.server.set_response(
        "/heartbeat",
        200,
        &format!(
            r#"{{"settings":{{"capture_interval_minutes":{interval},"idle_threshold_minutes":5,"auto_start_monitoring":false}}}}"#
        ),
    );

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert_eq!(h.sched.task_count(), tasks);
}

#[tokio::test]
async fn connectivity_failure_marks_server_unreachable() {
    let _guard = common::env_guard();
    let _temp = common::isolated_storage();
    let mut h = make_agent("http://127.0.0.1:9");
    h.agent.is_monitoring = true;

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert!(!h.agent.is_server_reachable);
    // Heartbeat failures are never fatal: monitoring state is untouched.
    assert!(h.agent.is_monitoring);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn heartbeat_success_restores_reachability(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    h.agent.is_monitoring = true;
    h.agent.is_server_reachable = false;

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert!(h.agent.is_server_reachable);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn rejected_session_stops_monitoring_and_clears_session(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    common::test_session().save().unwrap();
    ctx.server.set_response("/heartbeat", 401, "{}");

    heartbeat::on_heartbeat_tick(&mut h.agent, &mut h.sched).await;

    assert!(!h.agent.is_monitoring);
    assert!(h.agent.session.is_none());
    assert!(!h.agent.gateway.has_token());
    assert_eq!(h.sched.task_count(), 0);
    assert!(Session::read().unwrap().is_none());

    let mut saw_auth_expired = false;
    while let Ok(signal) = h.signals.try_recv() {
        if signal == AgentSignal::AuthExpired {
            saw_auth_expired = true;
        }
    }
    assert!(saw_auth_expired);
}
