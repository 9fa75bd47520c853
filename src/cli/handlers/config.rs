//! Configuration management handler
//!
//! Handles `init` and `config show|get|set`.

use anyhow::Result;
use std::path::PathBuf;

use super::super::{CliContext, ConfigAction};
use crate::config::{Config, ConfigManager};

/// Handler for configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let path = if global {
            None
        } else {
            Some(
                self.context
                    .project_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(".")),
            )
        };

        let config_path = ConfigManager::get_config_path(path.clone())?;
        let config_exists = config_path.exists();

        if config_exists && !force {
            println!(
                "Configuration already initialized at: {}",
                config_path.display()
            );
            println!("Use --force to overwrite");
            return Ok(());
        }

        // Forcing writes defaults over whatever is there
        let config_manager = match path {
            _ if force => ConfigManager::with_config(config_path.clone(), Config::default()),
            Some(path) => ConfigManager::new_project_config(path)?,
            None => ConfigManager::new(None)?,
        };
        config_manager.save()?;

        println!(
            "Configuration initialized successfully at: {}",
            config_path.display()
        );
        Ok(())
    }

    pub fn handle_config(&self, action: ConfigAction) -> Result<()> {
        let mut config_manager = ConfigManager::new(self.context.project_path.clone())?;

        match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(config_manager.config())?);
            }
            ConfigAction::Set { key, value } => {
                config_manager.set(&key, &value)?;
                config_manager.save()?;
                println!("Configuration updated: {key} = {value}");
            }
            ConfigAction::Get { key } => {
                let value = config_manager
                    .get(&key)?
                    .unwrap_or_else(|| "None".to_string());
                println!("{value}");
            }
        }

        Ok(())
    }
}
