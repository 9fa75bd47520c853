//! Lifecycle Controller
//!
//! Owns the single active [`TrackedNotification`] and the auto-update timer
//! attached to it. All mutation goes through one async mutex, which gives
//! explicit API calls and timer callbacks a strict order.
//!
//! Policies:
//! - `update` / `update_actions` / `disarm_auto_update` on an id that is not
//!   the active one fail with `NotFound`.
//! - `stop` on an id that is not active is a no-op.
//! - An explicit `update` while the timer is armed replaces what is shown but
//!   leaves the timer running; its next tick rewrites the body. Use
//!   [`LifecycleController::disarm_auto_update`] to keep explicit content.
//! - `start` while something is active stops the previous notification first.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::timer::{minutes_remaining, ArmedTimer, TickOutcome, TimerSettings};
use super::types::{
    NotificationAction, NotificationContent, ServiceStatus, StartOptions, TrackedNotification,
};
use super::validator::{DefaultOptionsValidator, OptionsValidator};
use crate::errors::{TrackingError, TrackingResult};
use crate::events::{Event, EventBridge};
use crate::platform::BackgroundTask;
use crate::renderer::NotificationRenderer;
use crate::templates::TemplateEngine;

#[derive(Default)]
struct ControllerState {
    active: Option<TrackedNotification>,
    timer: Option<ArmedTimer>,
}

pub(crate) struct ControllerInner {
    renderer: Arc<NotificationRenderer>,
    background: Option<Arc<dyn BackgroundTask>>,
    templates: TemplateEngine,
    validator: Box<dyn OptionsValidator>,
    events: EventBridge,
    settings: TimerSettings,
    next_generation: AtomicU64,
    state: Mutex<ControllerState>,
}

/// Handle to the lifecycle controller. Clones share the same state.
#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<ControllerInner>,
}

impl LifecycleController {
    pub fn new(
        renderer: Arc<NotificationRenderer>,
        background: Option<Arc<dyn BackgroundTask>>,
        templates: TemplateEngine,
        events: EventBridge,
        settings: TimerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                renderer,
                background,
                templates,
                validator: Box::new(DefaultOptionsValidator::new()),
                events,
                settings,
                next_generation: AtomicU64::new(1),
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    pub fn events(&self) -> &EventBridge {
        &self.inner.events
    }

    /// Register and show a tracked notification, acquire the background task
    /// and, when `arrival_minutes` is set, arm the countdown.
    ///
    /// # Errors
    ///
    /// `InvalidOptions` for malformed options (nothing is touched), and
    /// `PlatformRejected` when the notification cannot be posted or the
    /// background task cannot be acquired. Neither is retried.
    pub async fn start(&self, options: StartOptions) -> TrackingResult<()> {
        let validated = self.inner.validator.validate_start(options)?;
        // Reject an unrepresentable deadline before touching the active one
        if let Some(arrival) = validated.arrival {
            deadline_after(arrival)?;
        }
        let arrival = validated.arrival;
        let options = validated.options;
        let id = options.id.clone();

        let mut state = self.inner.lock().await;

        if let Some(previous) = state.active.as_ref().map(|a| a.id.clone()) {
            info!(previous = %previous, next = %id, "Replacing active tracked notification");
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
            if let Err(e) = self.inner.teardown(&mut state).await {
                warn!(id = %previous, "Previous notification did not stop cleanly: {}", e);
            }
        }

        // Counted from here so time spent replacing is not lost
        let deadline = arrival.map(deadline_after).transpose()?;
        let notification = TrackedNotification {
            id: id.clone(),
            content: options.content,
            actions: options.actions,
            platform_style: options.platform_style,
            arrival_deadline: deadline.map(|(_, at)| at),
        };

        self.inner.renderer.show(&notification).await?;

        if let Some(background) = &self.inner.background {
            if let Err(e) = background.start(&id).await {
                error!(id = %id, "Failed to acquire background task: {}", e);
                if let Err(e) = self.inner.renderer.remove(&id).await {
                    warn!(id = %id, "Failed to remove notification after rollback: {}", e);
                }
                return Err(e);
            }
        }

        state.active = Some(notification);
        if let Some((deadline, _)) = deadline {
            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            state.timer = Some(ArmedTimer::spawn(
                Arc::downgrade(&self.inner),
                generation,
                deadline,
                self.inner.settings,
            ));
            debug!(id = %id, generation, "Auto-update armed");
        }

        info!(id = %id, "Tracking started");
        self.inner
            .events
            .emit(Event::StatusChange(ServiceStatus::running(id)));
        Ok(())
    }

    /// Replace the content of the active notification
    pub async fn update(&self, id: &str, content: NotificationContent) -> TrackingResult<()> {
        self.inner.validator.validate_content(&content)?;
        self.inner
            .modify(id, |notification| notification.content = content)
            .await
    }

    /// Replace the action buttons of the active notification. More than three
    /// are truncated.
    pub async fn update_actions(
        &self,
        id: &str,
        actions: Vec<NotificationAction>,
    ) -> TrackingResult<()> {
        let actions = self.inner.validator.validate_actions(actions)?;
        self.inner
            .modify(id, |notification| notification.actions = actions)
            .await
    }

    /// End tracking for `id`. Stopping an id that is not active does nothing.
    ///
    /// Local state is always cleared and the background task always released;
    /// the first platform error encountered on the way is returned.
    pub async fn stop(&self, id: &str) -> TrackingResult<()> {
        let mut state = self.inner.lock().await;
        if state.active.as_ref().map(|a| a.id.as_str()) != Some(id) {
            debug!(id = %id, "Stop ignored, not the active notification");
            return Ok(());
        }
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        self.inner.teardown(&mut state).await
    }

    /// Cancel the countdown and keep the notification as it is. Returns
    /// whether a timer was armed.
    pub async fn disarm_auto_update(&self, id: &str) -> TrackingResult<bool> {
        let mut state = self.inner.lock().await;
        if state.active.as_ref().map(|a| a.id.as_str()) != Some(id) {
            return Err(TrackingError::not_found(id));
        }
        match state.timer.take() {
            Some(timer) => {
                timer.cancel();
                if let Some(active) = state.active.as_mut() {
                    active.arrival_deadline = None;
                }
                info!(id = %id, "Auto-update disarmed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.inner
            .lock()
            .await
            .active
            .as_ref()
            .is_some_and(|a| a.id == id)
    }

    pub async fn status(&self) -> ServiceStatus {
        match &self.inner.lock().await.active {
            Some(active) => ServiceStatus::running(active.id.clone()),
            None => ServiceStatus::idle(),
        }
    }

    /// Snapshot of the active notification
    pub async fn current(&self) -> Option<TrackedNotification> {
        self.inner.lock().await.active.clone()
    }

    /// App-level teardown: stop whatever is active so the background task is
    /// released
    pub async fn shutdown(&self) -> TrackingResult<()> {
        let mut state = self.inner.lock().await;
        let Some(id) = state.active.as_ref().map(|a| a.id.clone()) else {
            return Ok(());
        };
        info!(id = %id, "Shutting down active tracking");
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        self.inner.teardown(&mut state).await
    }

    #[cfg(test)]
    pub(crate) async fn armed_generation(&self) -> Option<u64> {
        self.inner.lock().await.timer.as_ref().map(|t| t.generation)
    }

    #[cfg(test)]
    pub(crate) async fn handle_tick(&self, generation: u64) -> TickOutcome {
        self.inner.handle_tick(generation).await
    }
}

fn deadline_after(
    arrival: std::time::Duration,
) -> TrackingResult<(Instant, chrono::DateTime<Utc>)> {
    let too_far = || TrackingError::invalid_options("arrivalMinutes", "deadline out of range");
    let at = chrono::Duration::from_std(arrival)
        .ok()
        .and_then(|d| Utc::now().checked_add_signed(d))
        .ok_or_else(too_far)?;
    let deadline = Instant::now().checked_add(arrival).ok_or_else(too_far)?;
    Ok((deadline, at))
}

impl ControllerInner {
    async fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().await
    }

    /// Apply `change` to the active notification and re-render. Nothing is
    /// committed if the render fails.
    async fn modify<F>(&self, id: &str, change: F) -> TrackingResult<()>
    where
        F: FnOnce(&mut TrackedNotification),
    {
        let mut state = self.lock().await;
        let active = state
            .active
            .as_mut()
            .filter(|a| a.id == id)
            .ok_or_else(|| TrackingError::not_found(id))?;

        let mut next = active.clone();
        change(&mut next);
        self.renderer.update(&next).await?;
        *active = next;

        self.events.emit(Event::Update { id: id.to_string() });
        Ok(())
    }

    /// Remove the notification, release the background task, clear state and
    /// announce it. Every step runs even if an earlier one failed.
    async fn teardown(&self, state: &mut ControllerState) -> TrackingResult<()> {
        let Some(active) = state.active.take() else {
            return Ok(());
        };
        let id = active.id;
        let mut result = Ok(());

        if let Err(e) = self.renderer.remove(&id).await {
            warn!(id = %id, "Failed to remove notification: {}", e);
            result = Err(e);
        }

        if let Some(background) = &self.background {
            if let Err(e) = background.stop(&id).await {
                error!(id = %id, "Failed to release background task: {}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        info!(id = %id, "Tracking stopped");
        self.events
            .emit(Event::StatusChange(ServiceStatus::stopped(id)));
        result
    }

    /// Timer callback: refresh the countdown if `generation` is still armed.
    /// A failed render is logged and the countdown carries on.
    pub(crate) async fn handle_tick(&self, generation: u64) -> TickOutcome {
        let mut state = self.lock().await;
        let deadline = match &state.timer {
            Some(timer) if timer.generation == generation => timer.deadline,
            _ => return TickOutcome::Stale,
        };
        let Some(active) = state.active.as_mut() else {
            return TickOutcome::Stale;
        };

        let minutes = minutes_remaining(deadline, Instant::now());
        let outcome = if minutes <= 0 {
            TickOutcome::Arrived
        } else {
            TickOutcome::Counting
        };

        let body = match self.templates.countdown_body(&active.id, minutes) {
            Ok(body) => body,
            Err(e) => {
                warn!(id = %active.id, "Failed to render countdown text: {}", e);
                return outcome;
            }
        };

        let mut next = active.clone();
        next.content.body = body;
        match self.renderer.update(&next).await {
            Ok(()) => {
                *active = next;
                debug!(id = %active.id, minutes, "Countdown refreshed");
                self.events.emit(Event::Update {
                    id: active.id.clone(),
                });
            }
            Err(e) => {
                warn!(id = %active.id, "Countdown render failed, will retry next tick: {}", e)
            }
        }
        outcome
    }

    /// Timer callback after the grace window: end tracking if `generation` is
    /// still armed
    pub(crate) async fn expire(&self, generation: u64) {
        let mut state = self.lock().await;
        match state.timer.take() {
            Some(timer) if timer.generation == generation => timer.release(),
            other => {
                state.timer = other;
                return;
            }
        }
        if let Err(e) = self.teardown(&mut state).await {
            warn!("Arrival teardown finished with an error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{MemoryPlatform, RenderKind};
    use crate::tracking::types::PlatformStyle;
    use std::time::Duration;

    fn controller(platform: &MemoryPlatform) -> LifecycleController {
        let renderer = Arc::new(NotificationRenderer::new(
            Arc::new(platform.clone()),
            "tracking",
            true,
        ));
        LifecycleController::new(
            renderer,
            Some(Arc::new(platform.clone())),
            TemplateEngine::new().unwrap(),
            EventBridge::new(),
            TimerSettings::default(),
        )
    }

    fn options(id: &str) -> StartOptions {
        StartOptions::new(id, NotificationContent::new("Tracking location", "Starting"))
    }

    fn status_events(events: &[Event]) -> Vec<ServiceStatus> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::StatusChange(status) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        let subscription = controller.events().subscribe();

        controller.start(options("trip-1")).await.unwrap();
        assert!(controller.is_active("trip-1").await);
        assert!(platform.background_running("trip-1"));
        assert_eq!(controller.status().await, ServiceStatus::running("trip-1"));

        controller.stop("trip-1").await.unwrap();
        assert!(!controller.is_active("trip-1").await);
        assert!(!platform.any_background_running());
        assert_eq!(platform.cancelled(), vec!["trip-1"]);
        assert_eq!(controller.status().await, ServiceStatus::idle());

        assert_eq!(
            status_events(&subscription.drain()),
            vec![ServiceStatus::running("trip-1"), ServiceStatus::stopped("trip-1")]
        );
    }

    #[tokio::test]
    async fn test_stop_twice_emits_once() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller.start(options("trip-1")).await.unwrap();
        let subscription = controller.events().subscribe();

        controller.stop("trip-1").await.unwrap();
        controller.stop("trip-1").await.unwrap();
        controller.stop("never-started").await.unwrap();

        assert_eq!(
            status_events(&subscription.drain()),
            vec![ServiceStatus::stopped("trip-1")]
        );
        assert_eq!(platform.background_transitions(), (1, 1));
    }

    #[tokio::test]
    async fn test_invalid_options_touch_nothing() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);

        let err = controller
            .start(StartOptions::new("", NotificationContent::new("t", "b")))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "invalid_options");
        assert_eq!(platform.render_count(), 0);
        assert_eq!(platform.background_transitions(), (0, 0));
    }

    #[tokio::test]
    async fn test_platform_rejection_surfaces_and_registers_nothing() {
        let platform = MemoryPlatform::new();
        platform.require_channels();
        let controller = controller(&platform);
        let subscription = controller.events().subscribe();

        let err = controller.start(options("trip-1")).await.unwrap_err();
        assert!(matches!(err, TrackingError::PlatformRejected { .. }));
        assert!(!controller.is_active("trip-1").await);
        assert!(!platform.any_background_running());
        assert!(subscription.drain().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_active_id() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller.start(options("trip-1")).await.unwrap();

        let err = controller
            .update("other", NotificationContent::new("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::NotFound { ref id } if id == "other"));

        controller
            .update("trip-1", NotificationContent::new("Tracking location", "Almost there"))
            .await
            .unwrap();
        let last = platform.last_render().unwrap();
        assert_eq!(last.body, "Almost there");
        assert_eq!(platform.renders().last().unwrap().kind, RenderKind::Update);
    }

    #[tokio::test]
    async fn test_failed_update_is_not_committed() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller.start(options("trip-1")).await.unwrap();

        platform.fail_next_renders(1);
        assert!(controller
            .update("trip-1", NotificationContent::new("t", "new body"))
            .await
            .is_err());
        assert_eq!(controller.current().await.unwrap().content.body, "Starting");
    }

    #[tokio::test]
    async fn test_update_actions_truncates() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller.start(options("trip-1")).await.unwrap();

        let actions = (0..5)
            .map(|i| NotificationAction::new(format!("a{}", i), "go"))
            .collect();
        controller.update_actions("trip-1", actions).await.unwrap();

        let rendered = platform.last_render().unwrap();
        let ids: Vec<_> = rendered.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "a2"]);
    }

    #[tokio::test]
    async fn test_new_start_replaces_previous() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(10.0))
            .await
            .unwrap();
        let first_generation = controller.armed_generation().await.unwrap();
        let subscription = controller.events().subscribe();

        controller
            .start(options("trip-2").with_arrival_minutes(10.0))
            .await
            .unwrap();

        assert!(!controller.is_active("trip-1").await);
        assert!(controller.is_active("trip-2").await);
        assert!(!platform.background_running("trip-1"));
        assert!(platform.background_running("trip-2"));
        assert_ne!(controller.armed_generation().await, Some(first_generation));
        assert_eq!(
            controller.handle_tick(first_generation).await,
            TickOutcome::Stale
        );
        assert_eq!(
            status_events(&subscription.drain()),
            vec![ServiceStatus::stopped("trip-1"), ServiceStatus::running("trip-2")]
        );
    }

    #[tokio::test]
    async fn test_stale_tick_after_stop_does_not_render() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(5.0))
            .await
            .unwrap();
        let generation = controller.armed_generation().await.unwrap();

        controller.stop("trip-1").await.unwrap();
        let renders_before = platform.render_count();

        assert_eq!(controller.handle_tick(generation).await, TickOutcome::Stale);
        assert_eq!(platform.render_count(), renders_before);
        assert!(platform.posted("trip-1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_renders_rounded_up_minutes() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(5.0))
            .await
            .unwrap();
        let subscription = controller.events().subscribe();

        assert_eq!(
            subscription.recv().await,
            Some(Event::Update { id: "trip-1".to_string() })
        );
        let rendered = platform.last_render().unwrap();
        assert_eq!(rendered.body, "arriving next in 5 minutes");
        assert_eq!(rendered.title, "Tracking location");
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_arrival_and_stops() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        let subscription = controller.events().subscribe();
        let started = Instant::now();

        controller
            .start(options("trip-1").with_arrival_minutes(5.0))
            .await
            .unwrap();

        loop {
            match subscription.recv().await {
                Some(Event::StatusChange(status)) if !status.is_running => break,
                Some(_) => continue,
                None => panic!("event bridge closed"),
            }
        }
        let stopped_after = started.elapsed();

        let bodies: Vec<String> = platform
            .renders()
            .into_iter()
            .map(|r| r.notification.body)
            .collect();
        assert!(bodies.contains(&"arriving next in 2 minutes".to_string()));
        assert!(bodies.contains(&"arriving next in 1 minute".to_string()));
        assert_eq!(bodies.last().map(String::as_str), Some("arriving now"));

        let settings = TimerSettings::default();
        assert!(
            stopped_after
                <= Duration::from_secs(300) + settings.grace_period + settings.tick_interval
        );
        assert!(!controller.is_active("trip-1").await);
        assert!(!platform.any_background_running());
        assert_eq!(platform.cancelled(), vec!["trip-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_does_not_end_countdown() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(5.0))
            .await
            .unwrap();
        let subscription = controller.events().subscribe();

        platform.fail_next_renders(1);
        // First tick fails silently, second one gets through
        assert_eq!(
            subscription.recv().await,
            Some(Event::Update { id: "trip-1".to_string() })
        );
        assert!(controller.is_active("trip-1").await);
        assert_eq!(
            platform.last_render().unwrap().body,
            "arriving next in 5 minutes"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_update_is_overwritten_by_next_tick() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(5.0))
            .await
            .unwrap();

        controller
            .update("trip-1", NotificationContent::new("Bus 42", "Driver waved"))
            .await
            .unwrap();
        let subscription = controller.events().subscribe();
        subscription.recv().await;

        let rendered = platform.last_render().unwrap();
        assert_eq!(rendered.title, "Bus 42");
        assert_eq!(rendered.body, "arriving next in 5 minutes");
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_keeps_explicit_content() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(
                options("trip-1")
                    .with_arrival_minutes(1.0)
                    .with_style(PlatformStyle::default()),
            )
            .await
            .unwrap();

        assert!(controller.disarm_auto_update("trip-1").await.unwrap());
        assert!(!controller.disarm_auto_update("trip-1").await.unwrap());
        assert!(controller.disarm_auto_update("other").await.is_err());
        let renders = platform.render_count();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(platform.render_count(), renders);
        assert!(controller.is_active("trip-1").await);
        assert!(controller.current().await.unwrap().arrival_deadline.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_releases_background_task() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(30.0))
            .await
            .unwrap();

        controller.shutdown().await.unwrap();
        assert!(!platform.any_background_running());
        assert!(controller.armed_generation().await.is_none());
        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_time_does_not_shorten_countdown() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller.start(options("trip-1")).await.unwrap();

        platform.delay_cancels(Duration::from_secs(60));
        controller
            .start(options("trip-2").with_arrival_minutes(5.0))
            .await
            .unwrap();
        let subscription = controller.events().subscribe();

        assert_eq!(
            subscription.recv().await,
            Some(Event::Update { id: "trip-2".to_string() })
        );
        assert_eq!(
            platform.last_render().unwrap().body,
            "arriving next in 5 minutes"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_queued_behind_shutdown_runs_after_teardown() {
        let platform = MemoryPlatform::new();
        let controller = controller(&platform);
        controller
            .start(options("trip-1").with_arrival_minutes(30.0))
            .await
            .unwrap();
        platform.delay_cancels(Duration::from_secs(10));
        let subscription = controller.events().subscribe();

        let shutdown = tokio::spawn({
            let controller = controller.clone();
            async move { controller.shutdown().await }
        });
        tokio::task::yield_now().await;
        controller.start(options("trip-2")).await.unwrap();
        shutdown.await.unwrap().unwrap();

        assert_eq!(
            status_events(&subscription.drain()),
            vec![ServiceStatus::stopped("trip-1"), ServiceStatus::running("trip-2")]
        );
        assert!(!platform.background_running("trip-1"));
        assert!(platform.background_running("trip-2"));
        assert_eq!(platform.background_transitions(), (2, 1));
    }
}
