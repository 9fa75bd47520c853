//! `track` session handler
//!
//! Starts one tracked notification on the selected backend, prints every
//! lifecycle event as a JSON line and feeds stdin lines back as action
//! presses. The session ends on a stop event for the tracked id or Ctrl-C;
//! teardown runs on every exit path.

use anyhow::Result;
use std::io::BufRead;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, warn};

use super::super::{Backend, CliContext, TrackArgs};
use crate::config::Config;
use crate::events::{Event, Subscription};
use crate::module::TrackingModule;
use crate::platform::console::{ConsoleBackgroundTask, ConsolePermissions, ConsoleSurface};
use crate::platform::memory::MemoryPlatform;
use crate::platform::ntfy::NtfySurface;
use crate::platform::Platform;
use crate::tracking::{ActionEvent, ChannelConfig, NotificationContent, StartOptions};

pub struct TrackHandler<'a> {
    context: &'a CliContext,
}

impl<'a> TrackHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_track(&self, args: TrackArgs) -> Result<()> {
        let mut config = self.context.config_manager.config().clone();
        if let Some(tick) = args.tick_secs {
            config.tracking.tick_interval_secs = tick;
        }
        if let Some(grace) = args.grace_secs {
            config.tracking.grace_period_secs = grace;
        }
        config.validate()?;

        let module = TrackingModule::new(build_platform(args.backend, &config)?, &config)?;
        module
            .create_channel(ChannelConfig::new(
                config.tracking.default_channel_id.clone(),
                "Tracking",
            ))
            .await?;
        if let Some(icon) = &config.tracking.icon {
            module.set_icon(icon).await?;
        }

        let listener = module.add_listener();
        let title = args
            .title
            .clone()
            .unwrap_or_else(|| config.tracking.default_title.clone());
        let content = NotificationContent::new(title, args.body);
        let mut options = StartOptions::new(args.id.clone(), content).with_actions(args.actions);
        if let Some(minutes) = args.arrival_minutes {
            options = options.with_arrival_minutes(minutes);
        }

        module.start(options).await?;
        let session = run_session(&module, &listener, &args.id).await;

        // Whatever ended the session, release the background task
        let teardown = module.shutdown().await;
        for event in listener.drain() {
            print_event(&event)?;
        }
        session?;
        teardown?;
        Ok(())
    }
}

pub(super) fn build_platform(backend: Backend, config: &Config) -> Result<Platform> {
    let platform = match backend {
        Backend::Console => Platform::durable(
            Arc::new(ConsoleSurface),
            Arc::new(ConsoleBackgroundTask),
            Arc::new(ConsolePermissions),
        ),
        Backend::Memory => MemoryPlatform::new().durable(),
        Backend::Ntfy => Platform::scheduled(
            Arc::new(NtfySurface::new(config.ntfy.clone())?),
            Arc::new(ConsolePermissions),
        ),
    };
    debug!(?backend, kind = ?platform.kind, "Platform selected");
    Ok(platform)
}

async fn run_session(module: &TrackingModule, listener: &Subscription, id: &str) -> Result<()> {
    let lines = stdin_lines();
    let mut stdin_open = true;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = listener.recv() => {
                let Some(event) = event else { break };
                print_event(&event)?;
                if let Event::StatusChange(status) = &event {
                    if !status.is_running && status.notification_id.as_deref() == Some(id) {
                        info!(id = %id, "Tracking ended");
                        break;
                    }
                }
            }

            line = lines.recv_async(), if stdin_open => {
                match line {
                    Ok(line) if line.trim().is_empty() => {}
                    Ok(line) => {
                        let action = ActionEvent::new(id, line.trim());
                        if let Err(e) = module.handle_action(action).await {
                            warn!("Action failed: {}", e);
                        }
                    }
                    Err(_) => {
                        debug!("stdin closed, waiting for tracking to end");
                        stdin_open = false;
                    }
                }
            }

            _ = &mut ctrl_c => {
                info!("Received Ctrl+C signal, stopping tracking");
                break;
            }
        }
    }
    Ok(())
}

/// Lines typed on stdin. Read on a plain thread so a pending read never holds
/// up process exit.
fn stdin_lines() -> flume::Receiver<String> {
    let (sender, receiver) = flume::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

fn print_event(event: &Event) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
