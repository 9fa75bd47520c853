//! Command handlers for all CLI operations
//!
//! Routing lives here; the longer handlers have their own modules.

mod config;
mod track;

use anyhow::Result;

use super::{Backend, CliContext, Commands};
use crate::module::TrackingModule;
use crate::shared::manifest::CapabilityManifest;
use crate::templates::TemplateEngine;
use config::ConfigHandler;
use track::{build_platform, TrackHandler};

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Track(args) => TrackHandler::new(&self.context).handle_track(args).await,
            Commands::Permissions { request, backend } => {
                self.handle_permissions(request, backend).await
            }
            Commands::Manifest => self.handle_manifest(),
            Commands::Init { global, force } => {
                ConfigHandler::new(&self.context).handle_init(global, force)
            }
            Commands::Config { action } => ConfigHandler::new(&self.context).handle_config(action),
            Commands::Templates => self.handle_templates(),
        }
    }

    async fn handle_permissions(&self, request: bool, backend: Backend) -> Result<()> {
        let config = self.context.config_manager.config();
        let module = TrackingModule::new(build_platform(backend, config)?, config)?;
        let state = if request {
            module.request_permissions().await?
        } else {
            module.get_permission_status().await?
        };
        println!("{}", serde_json::to_string_pretty(&state)?);
        Ok(())
    }

    fn handle_manifest(&self) -> Result<()> {
        let manifest =
            CapabilityManifest::from_messages(&self.context.config_manager.config().permissions);
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        Ok(())
    }

    fn handle_templates(&self) -> Result<()> {
        let overrides = &self.context.config_manager.config().templates.overrides;
        let engine = TemplateEngine::with_overrides(overrides)?;
        println!("Available templates:");
        for name in engine.list_templates() {
            println!("  - {}", name);
        }
        Ok(())
    }
}
