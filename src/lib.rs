//! # Traka - autonomous monitoring agent
//!
//! Background agent that runs on a team member's machine: it counts input
//! activity, captures periodic screenshots, detects idleness, drives a work
//! timer, samples the foreground application and keeps a heartbeat with the
//! collection server across power-state transitions.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use traka::commands::Cli;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
