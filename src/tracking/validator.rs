//! Boundary validation
//!
//! All checks on caller-supplied options happen here, once, at `start` /
//! `update` entry. Rendering code downstream trusts what it receives.

use std::time::Duration;

use super::types::{
    ChannelConfig, NotificationAction, NotificationContent, StartOptions, MAX_ACTIONS,
};
use crate::errors::{TrackingError, TrackingResult};

/// Output of [`OptionsValidator::validate_start`]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStart {
    pub options: StartOptions,
    /// Countdown length, present only when auto-update was requested
    pub arrival: Option<Duration>,
}

/// Trait for option validators
pub trait OptionsValidator: Send + Sync {
    fn validate_start(&self, options: StartOptions) -> TrackingResult<ValidatedStart>;

    fn validate_content(&self, content: &NotificationContent) -> TrackingResult<()>;

    /// Truncates to [`MAX_ACTIONS`] and checks what is kept
    fn validate_actions(
        &self,
        actions: Vec<NotificationAction>,
    ) -> TrackingResult<Vec<NotificationAction>>;

    fn validate_channel(&self, channel: &ChannelConfig) -> TrackingResult<()>;
}

pub struct DefaultOptionsValidator {
    max_text_length: usize,
}

impl DefaultOptionsValidator {
    pub fn new() -> Self {
        Self {
            max_text_length: 4096,
        }
    }

    fn require_text(&self, field: &str, value: &str) -> TrackingResult<()> {
        if value.trim().is_empty() {
            return Err(TrackingError::invalid_options(field, "must not be empty"));
        }
        if value.len() > self.max_text_length {
            return Err(TrackingError::invalid_options(
                field,
                format!(
                    "length {} exceeds maximum of {}",
                    value.len(),
                    self.max_text_length
                ),
            ));
        }
        Ok(())
    }

    fn arrival_duration(&self, minutes: f64) -> TrackingResult<Duration> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(TrackingError::invalid_options(
                "arrivalMinutes",
                format!("expected a non-negative number of minutes, got {}", minutes),
            ));
        }
        Duration::try_from_secs_f64(minutes * 60.0)
            .map_err(|_| TrackingError::invalid_options("arrivalMinutes", "out of range"))
    }
}

impl Default for DefaultOptionsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsValidator for DefaultOptionsValidator {
    fn validate_start(&self, mut options: StartOptions) -> TrackingResult<ValidatedStart> {
        self.require_text("id", &options.id)?;
        self.validate_content(&options.content)?;

        options.actions = self.validate_actions(std::mem::take(&mut options.actions))?;

        if let Some(channel_id) = &options.platform_style.channel_id {
            self.require_text("platformStyle.channelId", channel_id)?;
        }

        let arrival = options
            .arrival_minutes
            .map(|minutes| self.arrival_duration(minutes))
            .transpose()?;

        Ok(ValidatedStart { options, arrival })
    }

    fn validate_content(&self, content: &NotificationContent) -> TrackingResult<()> {
        self.require_text("content.title", &content.title)?;
        self.require_text("content.body", &content.body)?;
        Ok(())
    }

    fn validate_actions(
        &self,
        mut actions: Vec<NotificationAction>,
    ) -> TrackingResult<Vec<NotificationAction>> {
        actions.truncate(MAX_ACTIONS);
        for (index, action) in actions.iter().enumerate() {
            self.require_text(&format!("actions[{}].id", index), &action.id)?;
            self.require_text(&format!("actions[{}].title", index), &action.title)?;
        }
        Ok(actions)
    }

    fn validate_channel(&self, channel: &ChannelConfig) -> TrackingResult<()> {
        self.require_text("channel.id", &channel.id)?;
        self.require_text("channel.name", &channel.name)?;
        Ok(())
    }
}
