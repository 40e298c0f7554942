//! `traka login` — register this device with the collection server.
//!
//! Registration exchanges a member id and device name for a session token,
//! which is cached in the durable store and attached to every authenticated
//! call afterwards. Both inputs can be passed as flags for scripted setups
//! or entered interactively.

use crate::api::{Gateway, RegisterRequest};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::session::Session;
use crate::{msg_bail_anyhow, msg_success};
use anyhow::Result;
use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Input};

#[derive(Debug, Parser)]
pub struct LoginArgs {
    /// Team member identifier issued by the dashboard.
    #[arg(long)]
    pub member_id: Option<String>,
    /// Name this device reports as.
    #[arg(long)]
    pub device_name: Option<String>,
}

pub async fn cmd(args: LoginArgs) -> Result<()> {
    let config = Config::read()?;
    let Some(server) = &config.server else {
        msg_bail_anyhow!(Message::NoServerConfigured);
    };

    let member_id = match args.member_id {
        Some(id) => id,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Member ID")
            .interact_text()?,
    };
    let device_name = match args.device_name {
        Some(name) => name,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Device name")
            .default(default_device_name())
            .interact_text()?,
    };

    let gateway = Gateway::new(&server.api_url, None);
    let response = gateway
        .register(&RegisterRequest {
            member_id,
            device_name,
            platform: std::env::consts::OS.to_string(),
        })
        .await?;

    Session {
        token: response.token,
        agent_id: response.agent_id,
        display_name: response.member_name.clone(),
    }
    .save()?;

    msg_success!(Message::LoggedIn(response.member_name));
    Ok(())
}

fn default_device_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "workstation".to_string())
}
