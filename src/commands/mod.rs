//! Command-line interface.
//!
//! Each subcommand lives in its own module with a `cmd` entry point;
//! [`Cli::menu`] parses the arguments and dispatches. Setup commands
//! (`init`, `login`, `logout`, `status`) are one-shot and exit; `run` is the
//! long-lived agent process.

pub mod init;
pub mod login;
pub mod logout;
pub mod run;
pub mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure the collection server and cadences")]
    Init,
    #[command(about = "Register this device with the collection server")]
    Login(login::LoginArgs),
    #[command(about = "Forget the local session")]
    Logout,
    #[command(about = "Run the monitoring agent")]
    Run(run::RunArgs),
    #[command(about = "Show timer status and today's totals")]
    Status,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init => init::cmd(),
            Commands::Login(args) => login::cmd(args).await,
            Commands::Logout => logout::cmd(),
            Commands::Run(args) => run::cmd(args).await,
            Commands::Status => status::cmd().await,
        }
    }
}
