//! Durable configuration for the agent.
//!
//! The configuration file holds the collection server address together with
//! the locally cached copies of the server-owned [`Settings`] and
//! [`PrivacyFlags`]. The server is authoritative for both: whenever a
//! heartbeat response carries a newer copy, the cache is overwritten and the
//! whole file is rewritten in one go, so a scheduled task never observes a
//! half-applied configuration.
//!
//! Storage location follows OS conventions via [`DataStorage`]:
//!
//! - **Windows**: `%LOCALAPPDATA%\traka-app\traka\config.json`
//! - **macOS**: `~/Library/Application Support/traka-app/traka/config.json`
//! - **Linux**: `~/.local/share/traka-app/traka/config.json`

use super::data_storage::DataStorage;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Monitoring settings owned by the collection server and cached locally.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    /// Minutes between screenshot captures.
    pub capture_interval_minutes: u64,
    /// Minutes of input silence before idle time is reported.
    pub idle_threshold_minutes: u64,
    /// Whether `traka run` turns monitoring on immediately at startup.
    pub auto_start_monitoring: bool,
}

/// Privacy controls owned by the collection server and cached locally.
///
/// `privacy_mode` suppresses every capture and app-tracking side effect
/// without stopping the monitoring lifecycle itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PrivacyFlags {
    pub privacy_mode: bool,
    pub track_apps: bool,
    pub track_urls: bool,
    pub blur_screenshots: bool,
}

/// Collection server connection parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Base URL of the collection server, e.g. `https://track.company.com`.
    pub api_url: String,
}

/// Local polling cadences for the periodic subsystems.
///
/// These are agent-side knobs, not server-owned: they control how often the
/// heartbeat, app sampler and idle check run, independent of the
/// server-driven capture interval.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Seconds between heartbeats.
    pub heartbeat_interval: u64,
    /// Seconds between foreground application samples.
    pub app_sample_interval: u64,
    /// Seconds between idle checks.
    pub idle_poll_interval: u64,
    /// Seconds to wait before the very first capture after monitoring starts,
    /// so the first screenshot reflects some accumulated activity.
    pub capture_warmup: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Cached server-owned settings; overwritten by heartbeat replies.
    pub settings: Settings,

    /// Cached server-owned privacy flags; overwritten by heartbeat replies.
    pub privacy: PrivacyFlags,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<MonitorConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            capture_interval_minutes: 5,
            idle_threshold_minutes: 5,
            auto_start_monitoring: false,
        }
    }
}

impl Default for PrivacyFlags {
    fn default() -> Self {
        PrivacyFlags {
            privacy_mode: false,
            track_apps: true,
            track_urls: true,
            blur_screenshots: false,
        }
    }
}

impl Default for MonitorConfig {
    /// Default cadences: 30s heartbeat, 5s app sampling, 15s idle polling,
    /// 10s capture warm-up.
    fn default() -> Self {
        MonitorConfig {
            heartbeat_interval: 30,
            app_sample_interval: 5,
            idle_poll_interval: 15,
            capture_warmup: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: None,
            settings: Settings::default(),
            privacy: PrivacyFlags::default(),
            monitor: None,
        }
    }
}

impl Config {
    /// Reads the configuration file, falling back to defaults when none exists.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Writes the whole configuration in one pass.
    ///
    /// Callers that merge server-pushed settings must mutate a full `Config`
    /// and then call this once, so readers only ever see a complete file.
    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive setup wizard for the server address and local cadences.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let default_url = config.server.as_ref().map(|s| s.api_url.clone()).unwrap_or_default();
        let api_url: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Collection server URL")
            .default(default_url)
            .interact_text()?;
        config.server = Some(ServerConfig { api_url });

        if Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Adjust monitoring cadences?")
            .default(false)
            .interact()?
        {
            let default = config.monitor.clone().unwrap_or_default();
            config.monitor = Some(MonitorConfig {
                heartbeat_interval: Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Heartbeat interval (seconds)")
                    .default(default.heartbeat_interval)
                    .interact_text()?,
                app_sample_interval: Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("App sample interval (seconds)")
                    .default(default.app_sample_interval)
                    .interact_text()?,
                idle_poll_interval: Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Idle poll interval (seconds)")
                    .default(default.idle_poll_interval)
                    .interact_text()?,
                capture_warmup: Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("First capture warm-up delay (seconds)")
                    .default(default.capture_warmup)
                    .interact_text()?,
            });
        }

        config.settings.auto_start_monitoring = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Start monitoring automatically on launch?")
            .default(config.settings.auto_start_monitoring)
            .interact()?;

        Ok(config)
    }

    /// Local cadences, defaulted when the user never customized them.
    pub fn monitor_or_default(&self) -> MonitorConfig {
        self.monitor.clone().unwrap_or_default()
    }
}
