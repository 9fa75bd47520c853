//! CLI Context for dependency injection and shared state
//!
//! Centralizes configuration loading and logging setup so handlers only see
//! a ready [`ConfigManager`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use crate::config::ConfigManager;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::new(resolved_project_path.clone())?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Auto-detect project path by looking for .tracking-notify/config.toml
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        if let Ok(current_dir) = std::env::current_dir() {
            let config_path = current_dir.join(".tracking-notify").join("config.toml");
            if config_path.exists() {
                return Some(current_dir);
            }
        }

        None
    }

    /// Console logging goes to stderr so stdout stays machine-readable. When
    /// `logging.log_path` is set a daily rolling file is written as well; the
    /// returned guard must live until exit to flush it.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let logging = &self.config_manager.config().logging;
        let log_level = if self.verbose {
            "debug"
        } else {
            logging.log_level.as_str()
        };

        let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
            log_level
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let (file_layer, guard) = match &logging.log_path {
            Some(log_path) => {
                let log_path = PathBuf::from(log_path);
                let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
                std::fs::create_dir_all(directory).context("Failed to create log directory")?;

                let file_appender = tracing_appender::rolling::daily(
                    directory,
                    log_path
                        .file_name()
                        .unwrap_or_else(|| std::ffi::OsStr::new("tracking-notify.log")),
                );
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to initialize logging")?;

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(guard)
    }
}
