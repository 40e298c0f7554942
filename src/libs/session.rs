//! Durable session state issued by the collection server at registration.
//!
//! Stored next to the configuration file and cleared on logout or whenever
//! any authenticated call comes back with a 401.

use super::data_storage::DataStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

pub const SESSION_FILE_NAME: &str = ".session";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub agent_id: String,
    pub display_name: String,
}

impl Session {
    /// Loads the cached session, if any.
    pub fn read() -> Result<Option<Session>> {
        let path = DataStorage::new().get_path(SESSION_FILE_NAME)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self) -> Result<()> {
        let path = DataStorage::new().get_path(SESSION_FILE_NAME)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(&file, self)?;
        Ok(())
    }

    /// Deletes the cached session. A missing file is not an error.
    pub fn clear() -> Result<()> {
        let path = DataStorage::new().get_path(SESSION_FILE_NAME)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
