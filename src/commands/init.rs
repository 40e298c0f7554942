//! `traka init` — interactive configuration setup.
//!
//! Walks the user through the collection server address, the optional local
//! cadence overrides and the auto-start flag, then writes the whole
//! configuration file in one pass.

use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::msg_success;
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let config = Config::init()?;
    config.save()?;
    msg_success!(Message::ConfigSaved);
    Ok(())
}
