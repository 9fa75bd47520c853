//! Auto-Update Timer
//!
//! While armed, the timer wakes every tick interval, asks the controller to
//! refresh the countdown, and once the deadline has passed waits out the
//! grace window before ending tracking.
//!
//! Every armed timer carries a generation number. The controller only acts on
//! a tick whose generation matches the timer it currently holds, so a tick
//! that was already scheduled when `stop` (or a new `start`) ran does nothing.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::controller::ControllerInner;
use crate::shared::config::TrackingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub tick_interval: Duration,
    pub grace_period: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(6),
            grace_period: Duration::from_secs(5),
        }
    }
}

impl From<&TrackingConfig> for TimerSettings {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            tick_interval: Duration::from_secs(config.tick_interval_secs),
            grace_period: Duration::from_secs(config.grace_period_secs),
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Countdown refreshed; tick again after the interval
    Counting,
    /// Deadline reached and the arrival message posted; stop after grace
    Arrived,
    /// The timer was cancelled or replaced; do nothing further
    Stale,
}

/// Whole minutes left, rounded up. Zero once the deadline has passed.
pub fn minutes_remaining(deadline: Instant, now: Instant) -> i64 {
    let remaining_ms = deadline.saturating_duration_since(now).as_millis();
    ((remaining_ms + 59_999) / 60_000) as i64
}

pub(crate) struct ArmedTimer {
    pub generation: u64,
    pub deadline: Instant,
    handle: JoinHandle<()>,
}

impl ArmedTimer {
    pub fn spawn(
        controller: Weak<ControllerInner>,
        generation: u64,
        deadline: Instant,
        settings: TimerSettings,
    ) -> Self {
        let handle = tokio::spawn(run(controller, generation, settings));
        Self {
            generation,
            deadline,
            handle,
        }
    }

    /// Abort the pending callback
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Drop the handle without aborting; used by the timer's own task when it
    /// ends tracking itself
    pub fn release(self) {}
}

async fn run(controller: Weak<ControllerInner>, generation: u64, settings: TimerSettings) {
    loop {
        sleep(settings.tick_interval).await;

        // The controller is gone: nothing left to update
        let Some(inner) = controller.upgrade() else {
            return;
        };

        match inner.handle_tick(generation).await {
            TickOutcome::Counting => {}
            TickOutcome::Arrived => {
                drop(inner);
                sleep(settings.grace_period).await;
                if let Some(inner) = controller.upgrade() {
                    inner.expire(generation).await;
                }
                return;
            }
            TickOutcome::Stale => {
                debug!(generation, "Timer no longer armed, exiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let now = Instant::now();
        assert_eq!(minutes_remaining(now + Duration::from_secs(294), now), 5);
        assert_eq!(minutes_remaining(now + Duration::from_secs(300), now), 5);
        assert_eq!(minutes_remaining(now + Duration::from_secs(61), now), 2);
        assert_eq!(minutes_remaining(now + Duration::from_secs(60), now), 1);
        assert_eq!(minutes_remaining(now + Duration::from_millis(1), now), 1);
    }

    #[test]
    fn test_minutes_remaining_zero_after_deadline() {
        let now = Instant::now();
        assert_eq!(minutes_remaining(now, now), 0);
        assert_eq!(minutes_remaining(now, now + Duration::from_secs(30)), 0);
    }

    #[test]
    fn test_settings_from_config() {
        let config = TrackingConfig {
            tick_interval_secs: 10,
            grace_period_secs: 0,
            ..Default::default()
        };
        let settings = TimerSettings::from(&config);
        assert_eq!(settings.tick_interval, Duration::from_secs(10));
        assert_eq!(settings.grace_period, Duration::ZERO);
    }
}
