//! Application-facing facade
//!
//! [`TrackingModule`] wires the controller, dispatcher, permission gateway and
//! event bridge over one [`Platform`] and exposes the operations an app calls.

use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::TrackingResult;
use crate::events::{EventBridge, Subscription};
use crate::permissions::{PermissionGateway, PermissionState};
use crate::platform::{Platform, PlatformKind};
use crate::renderer::NotificationRenderer;
use crate::shared::config::Config;
use crate::templates::TemplateEngine;
use crate::tracking::{
    ActionDispatcher, ActionEvent, ChannelConfig, DefaultOptionsValidator, LifecycleController,
    NotificationAction, NotificationContent, OptionsValidator, ServiceStatus, StartOptions,
    TimerSettings,
};

pub struct TrackingModule {
    kind: PlatformKind,
    renderer: Arc<NotificationRenderer>,
    controller: LifecycleController,
    dispatcher: ActionDispatcher,
    permissions: PermissionGateway,
    validator: DefaultOptionsValidator,
    events: EventBridge,
}

impl TrackingModule {
    pub fn new(platform: Platform, config: &Config) -> TrackingResult<Self> {
        let templates = TemplateEngine::with_overrides(&config.templates.overrides)?;
        let renderer = Arc::new(NotificationRenderer::new(
            platform.surface.clone(),
            config.tracking.default_channel_id.clone(),
            platform.ongoing_notifications(),
        ));
        let events = EventBridge::new();
        let controller = LifecycleController::new(
            renderer.clone(),
            platform.background.clone(),
            templates,
            events.clone(),
            TimerSettings::from(&config.tracking),
        );
        let dispatcher = ActionDispatcher::new(controller.clone(), events.clone());

        info!(
            surface = platform.surface.name(),
            kind = ?platform.kind,
            "Tracking module ready"
        );

        Ok(Self {
            kind: platform.kind,
            renderer,
            controller,
            dispatcher,
            permissions: PermissionGateway::new(platform.permissions),
            validator: DefaultOptionsValidator::new(),
            events,
        })
    }

    pub fn platform_kind(&self) -> PlatformKind {
        self.kind
    }

    pub async fn create_channel(&self, channel: ChannelConfig) -> TrackingResult<()> {
        self.validator.validate_channel(&channel)?;
        self.renderer.create_channel(&channel).await
    }

    /// Start tracking. Missing permissions are logged, not enforced: the
    /// platform itself rejects the post if it has to.
    pub async fn start(&self, options: StartOptions) -> TrackingResult<()> {
        match self.permissions.query().await {
            Ok(state) if !state.is_granted() => {
                warn!(id = %options.id, ?state, "Starting without full permissions")
            }
            Err(e) => warn!("Could not read permission state: {}", e),
            Ok(_) => {}
        }
        self.controller.start(options).await
    }

    pub async fn update(&self, id: &str, content: NotificationContent) -> TrackingResult<()> {
        self.controller.update(id, content).await
    }

    pub async fn update_actions(
        &self,
        id: &str,
        actions: Vec<NotificationAction>,
    ) -> TrackingResult<()> {
        self.controller.update_actions(id, actions).await
    }

    pub async fn stop(&self, id: &str) -> TrackingResult<()> {
        self.controller.stop(id).await
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.controller.is_active(id).await
    }

    pub async fn disarm_auto_update(&self, id: &str) -> TrackingResult<bool> {
        self.controller.disarm_auto_update(id).await
    }

    pub async fn status(&self) -> ServiceStatus {
        self.controller.status().await
    }

    pub async fn request_permissions(&self) -> TrackingResult<PermissionState> {
        self.permissions.request().await
    }

    pub async fn get_permission_status(&self) -> TrackingResult<PermissionState> {
        self.permissions.query().await
    }

    pub async fn set_icon(&self, name: &str) -> TrackingResult<()> {
        self.renderer.set_icon(name).await
    }

    pub fn add_listener(&self) -> Subscription {
        self.events.subscribe()
    }

    /// Entry point for action-button presses delivered by the platform
    pub async fn handle_action(&self, event: ActionEvent) -> TrackingResult<()> {
        self.dispatcher.dispatch(event).await
    }

    pub async fn shutdown(&self) -> TrackingResult<()> {
        self.controller.shutdown().await
    }
}
