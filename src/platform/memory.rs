//! In-process platform backend
//!
//! Records every call so tests and the demo CLI can observe what the core
//! asked the platform to do. Failures can be injected to exercise the
//! rejection and transient-failure paths.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{
    BackgroundTask, NotificationSurface, PermissionBackend, PermissionGrant, PlatformNotification,
    RawPermissions,
};
use super::Platform;
use crate::errors::{TrackingError, TrackingResult};
use crate::tracking::types::ChannelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Show,
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub kind: RenderKind,
    pub notification: PlatformNotification,
}

#[derive(Debug, Default)]
struct MemoryState {
    channels: HashMap<String, ChannelConfig>,
    posted: HashMap<String, PlatformNotification>,
    renders: Vec<RenderRecord>,
    cancelled: Vec<String>,
    icon: Option<String>,
    background_running: HashSet<String>,
    background_starts: usize,
    background_stops: usize,
    fail_next_renders: usize,
    cancel_delay: Option<Duration>,
    require_channels: bool,
    permissions: Option<RawPermissions>,
    prompt_answer: Option<RawPermissions>,
    permission_prompts: usize,
}

/// Recording backend shared between the surface, background task and
/// permission roles. Cloning shares the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        let platform = Self::default();
        platform.set_permissions(RawPermissions {
            notifications: PermissionGrant::Granted,
            location: Some(PermissionGrant::Granted),
            tri_state: false,
        });
        platform
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding this lock only happens inside a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Platform bundle with this backend in all three roles and a durable
    /// background task
    pub fn durable(&self) -> Platform {
        let shared = Arc::new(self.clone());
        Platform::durable(shared.clone(), shared.clone(), shared)
    }

    /// Platform bundle without a background task
    pub fn scheduled(&self) -> Platform {
        let shared = Arc::new(self.clone());
        Platform::scheduled(shared.clone(), shared)
    }

    /// Reject `show`/`update` for channels that were never created
    pub fn require_channels(&self) -> &Self {
        self.lock().require_channels = true;
        self
    }

    /// Make the next `count` show/update calls fail
    pub fn fail_next_renders(&self, count: usize) -> &Self {
        self.lock().fail_next_renders = count;
        self
    }

    /// Make every `cancel` take `delay`, like a slow network round-trip
    pub fn delay_cancels(&self, delay: Duration) -> &Self {
        self.lock().cancel_delay = Some(delay);
        self
    }

    pub fn set_permissions(&self, permissions: RawPermissions) -> &Self {
        self.lock().permissions = Some(permissions);
        self
    }

    /// What the "user" answers when prompted. Defaults to the current state.
    pub fn answer_prompt_with(&self, permissions: RawPermissions) -> &Self {
        self.lock().prompt_answer = Some(permissions);
        self
    }

    pub fn renders(&self) -> Vec<RenderRecord> {
        self.lock().renders.clone()
    }

    pub fn render_count(&self) -> usize {
        self.lock().renders.len()
    }

    pub fn last_render(&self) -> Option<PlatformNotification> {
        self.lock().renders.last().map(|r| r.notification.clone())
    }

    pub fn posted(&self, id: &str) -> Option<PlatformNotification> {
        self.lock().posted.get(id).cloned()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.lock().cancelled.clone()
    }

    pub fn channel(&self, id: &str) -> Option<ChannelConfig> {
        self.lock().channels.get(id).cloned()
    }

    pub fn icon(&self) -> Option<String> {
        self.lock().icon.clone()
    }

    pub fn background_running(&self, id: &str) -> bool {
        self.lock().background_running.contains(id)
    }

    pub fn any_background_running(&self) -> bool {
        !self.lock().background_running.is_empty()
    }

    /// (starts, stops) seen by the background task role
    pub fn background_transitions(&self) -> (usize, usize) {
        let state = self.lock();
        (state.background_starts, state.background_stops)
    }

    pub fn permission_prompts(&self) -> usize {
        self.lock().permission_prompts
    }

    fn record_render(
        &self,
        kind: RenderKind,
        operation: &str,
        notification: &PlatformNotification,
    ) -> TrackingResult<()> {
        let mut state = self.lock();
        if state.fail_next_renders > 0 {
            state.fail_next_renders -= 1;
            return Err(TrackingError::platform_rejected(
                operation,
                "injected render failure",
            ));
        }
        if state.require_channels && !state.channels.contains_key(&notification.channel_id) {
            return Err(TrackingError::platform_rejected(
                operation,
                format!("channel '{}' does not exist", notification.channel_id),
            ));
        }
        state
            .posted
            .insert(notification.id.clone(), notification.clone());
        state.renders.push(RenderRecord {
            kind,
            notification: notification.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationSurface for MemoryPlatform {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_channel(&self, channel: &ChannelConfig) -> TrackingResult<()> {
        self.lock()
            .channels
            .insert(channel.id.clone(), channel.clone());
        Ok(())
    }

    async fn show(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        self.record_render(RenderKind::Show, "show", notification)
    }

    async fn update(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        self.record_render(RenderKind::Update, "update", notification)
    }

    async fn cancel(&self, id: &str) -> TrackingResult<()> {
        let delay = self.lock().cancel_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.posted.remove(id);
        state.cancelled.push(id.to_string());
        Ok(())
    }

    async fn set_icon(&self, name: &str) -> TrackingResult<()> {
        self.lock().icon = Some(name.to_string());
        Ok(())
    }
}

#[async_trait]
impl BackgroundTask for MemoryPlatform {
    async fn start(&self, id: &str) -> TrackingResult<()> {
        let mut state = self.lock();
        state.background_starts += 1;
        state.background_running.insert(id.to_string());
        Ok(())
    }

    async fn stop(&self, id: &str) -> TrackingResult<()> {
        let mut state = self.lock();
        state.background_stops += 1;
        state.background_running.remove(id);
        Ok(())
    }
}

#[async_trait]
impl PermissionBackend for MemoryPlatform {
    async fn query(&self) -> TrackingResult<RawPermissions> {
        self.lock()
            .permissions
            .ok_or_else(|| TrackingError::internal("memory platform has no permission state"))
    }

    async fn request(&self) -> TrackingResult<RawPermissions> {
        let mut state = self.lock();
        state.permission_prompts += 1;
        if let Some(answer) = state.prompt_answer.take() {
            state.permissions = Some(answer);
        }
        state
            .permissions
            .ok_or_else(|| TrackingError::internal("memory platform has no permission state"))
    }
}
