mod common;

use common::{make_agent, AgentTestContext};
use test_context::test_context;
use traka::api::ApiError;
use traka::libs::agent::AgentSignal;
use traka::libs::monitor;
use traka::libs::session::Session;
use traka::libs::timer::{self, TimerError, TimerState};

#[test_context(AgentTestContext)]
#[tokio::test]
async fn start_rejected_while_monitoring_off(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);

    let err = timer::start(&mut h.agent, &mut h.sched, Some("proj".into()), None).await.unwrap_err();

    assert!(matches!(err, TimerError::MonitoringInactive));
    assert_eq!(h.agent.timer, TimerState::Stopped);
    // Guard rejection happens before any network call.
    assert_eq!(ctx.server.hits("/timer/start"), 0);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn start_adopts_server_entry(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();

    let entry = timer::start(&mut h.agent, &mut h.sched, Some("proj".into()), Some("notes".into()))
        .await
        .unwrap();

    assert_eq!(entry.id, 1);
    assert_eq!(entry.project.as_deref(), Some("proj"));
    assert!(h.agent.timer.is_running());
    assert!(h.agent.idle.is_active());
    assert_eq!(ctx.server.hits("/timer/start"), 1);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn second_start_is_a_noop_while_running(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();

    timer::start(&mut h.agent, &mut h.sched, None, None).await.unwrap();
    timer::start(&mut h.agent, &mut h.sched, None, None).await.unwrap();

    assert_eq!(ctx.server.hits("/timer/start"), 1);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn stop_adopts_server_duration(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    timer::start(&mut h.agent, &mut h.sched, None, None).await.unwrap();

    let entry = timer::stop(&mut h.agent, &mut h.sched).await.unwrap();

    assert_eq!(entry.duration_seconds, Some(3600));
    assert!(!entry.is_active);
    assert_eq!(h.agent.timer, TimerState::Stopped);
    assert!(!h.agent.idle.is_active());
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn stop_without_running_timer_fails(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);

    let err = timer::stop(&mut h.agent, &mut h.sched).await.unwrap_err();

    assert!(matches!(err, TimerError::NotRunning));
    assert_eq!(ctx.server.hits("/timer/stop"), 0);
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn status_adopts_server_side_active_entry(ctx: &mut AgentTestContext) {
    ctx.server.set_response(
        "/timer/status",
        200,
        r#"{"is_running":true,"active_entry":{"id":7,"start_time":"2026-08-30T08:00:00Z","end_time":null,"duration_seconds":null,"project":"other","notes":null,"is_active":true},"today_totals":120}"#,
    );
    let mut h = make_agent(&ctx.server.base_url);

    let status = timer::status(&mut h.agent, &mut h.sched).await.unwrap();

    assert!(status.is_running);
    assert_eq!(h.agent.timer.entry().map(|e| e.id), Some(7));
    assert!(h.agent.idle.is_active());
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn status_corrects_local_running_state(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    timer::start(&mut h.agent, &mut h.sched, None, None).await.unwrap();

    // Server default says no timer is running; local state must follow.
    let status = timer::status(&mut h.agent, &mut h.sched).await.unwrap();

    assert!(!status.is_running);
    assert_eq!(h.agent.timer, TimerState::Stopped);
    assert!(!h.agent.idle.is_active());
}

#[test_context(AgentTestContext)]
#[tokio::test]
async fn rejected_session_on_start_tears_monitoring_down(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    monitor::start(&mut h.agent, &mut h.sched).await.unwrap();
    common::test_session().save().unwrap();
    ctx.server.set_response("/timer/start", 401, "{}");

    let err = timer::start(&mut h.agent, &mut h.sched, None, None).await.unwrap_err();

    assert!(matches!(err, TimerError::Api(ApiError::Auth)));
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

#[test_context(AgentTestContext)]
#[tokio::test]
async fn rejected_session_on_status_clears_session(ctx: &mut AgentTestContext) {
    let mut h = make_agent(&ctx.server.base_url);
    common::test_session().save().unwrap();
    ctx.server.set_response("/timer/status", 401, "{}");

    let err = timer::status(&mut h.agent, &mut h.sched).await.unwrap_err();

    assert!(matches!(err, TimerError::Api(ApiError::Auth)));
    assert!(h.agent.session.is_none());
    assert!(Session::read().unwrap().is_none());
}
