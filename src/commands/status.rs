//! `traka status` — one-shot timer status query.
//!
//! Read-only: asks the collection server for the active entry and today's
//! totals and prints them. A 401 here means the cached token is dead, so the
//! session file is cleared on the spot instead of leaving a token that every
//! subsequent command would retry and fail with.

use crate::api::{ApiError, Gateway};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::session::Session;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let config = Config::read()?;
    let Some(server) = &config.server else {
        msg_bail_anyhow!(Message::NoServerConfigured);
    };
    let Some(session) = Session::read()? else {
        msg_bail_anyhow!(Message::NotLoggedIn);
    };

    let gateway = Gateway::new(&server.api_url, Some(session.token));
    let status = match gateway.timer_status().await {
        Ok(status) => status,
        Err(ApiError::Auth) => {
            Session::clear()?;
            msg_bail_anyhow!(Message::SessionExpired);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(entry) = &status.active_entry {
        msg_print!(Message::TimerRunningSince {
            start: entry.start_time.format("%H:%M:%S").to_string(),
            project: entry.project.clone().unwrap_or_else(|| "-".to_string()),
        });
    } else {
        msg_print!(Message::NoTimerRunning);
    }
    msg_print!(Message::TodayTotal(format_seconds(status.today_totals)));
    Ok(())
}

fn format_seconds(total: i64) -> String {
    let total = total.max(0);
    format!("{:02}:{:02}", total / 3600, (total % 3600) / 60)
}
