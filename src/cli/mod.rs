//! CLI module providing command-line interface functionality
//!
//! Argument parsing, logging setup and routing to handlers.

pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

pub use commands::{Backend, Cli, Commands, ConfigAction, TrackArgs};
pub use context::CliContext;
pub use handlers::CommandHandler;

pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = CliContext::new(cli.project.clone(), cli.verbose)?;
        let _log_guard = context.init_logging()?;

        let handler = CommandHandler::new(context);
        handler.handle_command(cli.command).await
    }
}
