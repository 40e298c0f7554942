//! `traka logout` — forget the local session.
//!
//! Only removes the cached session file; the server keeps its own record of
//! the agent. The next `run` will refuse to start until a fresh `login`.

use crate::libs::messages::Message;
use crate::libs::session::Session;
use crate::msg_success;
use anyhow::Result;

pub fn cmd() -> Result<()> {
    Session::clear()?;
    msg_success!(Message::LoggedOut);
    Ok(())
}
