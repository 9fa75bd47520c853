//! Command definitions and structures for the CLI
//!
//! All clap-based argument definitions: the top-level [`Cli`] and its
//! subcommands.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::tracking::NotificationAction;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "tracking-notify")]
#[command(about = "Ongoing tracking notifications with live arrival countdowns")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a tracking session and print lifecycle events as JSON lines
    ///
    /// Action ids typed on stdin are delivered as button presses;
    /// `stop-tracking` ends the session.
    Track(TrackArgs),

    /// Show the permission state
    Permissions {
        /// Prompt instead of only reading the current state
        #[arg(long)]
        request: bool,

        #[arg(long, value_enum, default_value_t = Backend::Console)]
        backend: Backend,
    },

    /// Print the capability manifest (permissions and background modes)
    Manifest,

    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List notification body templates
    Templates,
}

#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Notification id
    #[arg(long)]
    pub id: String,

    /// Title (defaults to `tracking.default_title`)
    #[arg(long)]
    pub title: Option<String>,

    /// Initial body text
    #[arg(long)]
    pub body: String,

    /// Arm the countdown: minutes until arrival
    #[arg(long)]
    pub arrival_minutes: Option<f64>,

    /// Action button as `id:title` or `id:title:fg`; repeatable, three at most
    #[arg(long = "action", value_parser = parse_action)]
    pub actions: Vec<NotificationAction>,

    #[arg(long, value_enum, default_value_t = Backend::Console)]
    pub backend: Backend,

    /// Override `tracking.tick_interval_secs`
    #[arg(long)]
    pub tick_secs: Option<u64>,

    /// Override `tracking.grace_period_secs`
    #[arg(long)]
    pub grace_secs: Option<u64>,
}

/// Where notifications go
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Print to stdout, durable background task
    Console,
    /// Record in memory, durable background task
    Memory,
    /// Push to an ntfy server, no background task
    Ntfy,
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., ntfy.server_url)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

fn parse_action(raw: &str) -> Result<NotificationAction, String> {
    let mut parts = raw.splitn(3, ':');
    let id = parts.next().unwrap_or_default().trim();
    let title = parts.next().map(str::trim).unwrap_or_default();
    if id.is_empty() || title.is_empty() {
        return Err(format!("expected id:title[:fg], got '{}'", raw));
    }

    let action = NotificationAction::new(id, title);
    match parts.next() {
        None => Ok(action),
        Some("fg") => Ok(action.foreground()),
        Some(other) => Err(format!("unknown action flag '{}', expected 'fg'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_action() {
        let action = parse_action("view-map:View map:fg").unwrap();
        assert_eq!(action.id, "view-map");
        assert_eq!(action.title, "View map");
        assert!(action.triggers_foreground);

        assert!(!parse_action("stop-tracking:Stop").unwrap().triggers_foreground);
        assert!(parse_action("no-title").is_err());
        assert!(parse_action("a:b:bg").is_err());
    }

    #[test]
    fn test_track_args() {
        let cli = Cli::try_parse_from([
            "tracking-notify",
            "track",
            "--id",
            "trip-1",
            "--body",
            "On the way",
            "--arrival-minutes",
            "5",
            "--action",
            "view-map:Map",
            "--action",
            "stop-tracking:Stop",
            "--backend",
            "memory",
        ])
        .unwrap();

        match cli.command {
            Commands::Track(args) => {
                assert_eq!(args.id, "trip-1");
                assert_eq!(args.arrival_minutes, Some(5.0));
                assert_eq!(args.actions.len(), 2);
                assert_eq!(args.backend, Backend::Memory);
                assert!(args.title.is_none());
            }
            _ => panic!("expected track"),
        }
    }
}
