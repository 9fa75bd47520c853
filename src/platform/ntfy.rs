//! ntfy notification backend
//!
//! Each tracked notification maps to one ntfy sequence id, so a republish
//! replaces the message on subscribed devices and a DELETE removes it.
//! Action buttons become ntfy `broadcast` actions carrying the notification
//! and action ids as extras.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::traits::{NotificationSurface, PlatformNotification};
use crate::errors::{ErrorContextExt, TrackingError, TrackingResult};
use crate::shared::config::NtfyConfig;
use crate::tracking::types::{ChannelConfig, STOP_TRACKING_ACTION};

pub const BROADCAST_INTENT: &str = "io.tracking.notify.ACTION";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NtfyAction {
    pub action: String,
    pub label: String,
    pub intent: String,
    pub extras: HashMap<String, String>,
    pub clear: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NtfyMessage {
    pub topic: String,
    pub sequence_id: String,
    pub title: String,
    pub message: String,
    pub priority: u8,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NtfyAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Surface that publishes notifications to an ntfy topic
pub struct NtfySurface {
    client: Client,
    base_url: Url,
    config: NtfyConfig,
    icon: Mutex<Option<String>>,
}

impl NtfySurface {
    pub fn new(config: NtfyConfig) -> TrackingResult<Self> {
        let base_url = Url::parse(&config.server_url)?;
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(30));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tracking-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context("build ntfy HTTP client")?;

        Ok(Self {
            client,
            base_url,
            config,
            icon: Mutex::new(None),
        })
    }

    /// ntfy accepts `[-_A-Za-z0-9]{1,64}` as a sequence id
    pub fn sequence_id(id: &str) -> String {
        id.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .take(64)
            .collect()
    }

    pub fn build_message(&self, notification: &PlatformNotification) -> NtfyMessage {
        let actions = notification
            .actions
            .iter()
            .map(|action| {
                let mut extras = HashMap::new();
                extras.insert("notification_id".to_string(), notification.id.clone());
                extras.insert("action_id".to_string(), action.id.clone());
                NtfyAction {
                    action: "broadcast".to_string(),
                    label: action.title.clone(),
                    intent: BROADCAST_INTENT.to_string(),
                    extras,
                    clear: action.id == STOP_TRACKING_ACTION,
                }
            })
            .collect();

        let mut tags = vec!["tracking".to_string()];
        if notification.ongoing {
            tags.push("ongoing".to_string());
        }

        let icon = notification
            .icon
            .clone()
            .or_else(|| self.icon.lock().ok().and_then(|icon| icon.clone()))
            .filter(|icon| Url::parse(icon).is_ok());

        NtfyMessage {
            topic: self.config.topic.clone(),
            sequence_id: Self::sequence_id(&notification.id),
            title: notification.title.clone(),
            message: notification.body.clone(),
            priority: notification.style.priority.map(|p| p.level()).unwrap_or(3),
            tags,
            actions,
            icon,
            extras: notification.data.clone(),
        }
    }

    fn build_headers(&self) -> TrackingResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| TrackingError::config_with_source("Invalid auth token", e))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn publish(
        &self,
        operation: &str,
        notification: &PlatformNotification,
    ) -> TrackingResult<()> {
        let message = self.build_message(notification);
        let mut headers = self.build_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        debug!(id = %notification.id, "Publishing to ntfy topic {}", message.topic);
        let response = self
            .client
            .post(self.base_url.clone())
            .headers(headers)
            .json(&message)
            .send()
            .await
            .rejected_by_platform(operation)?;

        Self::check_status(operation, response).await
    }

    async fn check_status(operation: &str, response: reqwest::Response) -> TrackingResult<()> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(TrackingError::platform_rejected(
            operation,
            format!("ntfy responded {}: {}", status, text),
        ))
    }
}

#[async_trait]
impl NotificationSurface for NtfySurface {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    async fn create_channel(&self, channel: &ChannelConfig) -> TrackingResult<()> {
        debug!("ntfy has no channels; ignoring '{}'", channel.id);
        Ok(())
    }

    async fn show(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        self.publish("show", notification).await?;
        info!(id = %notification.id, "Published tracking notification to ntfy");
        Ok(())
    }

    async fn update(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        self.publish("update", notification).await
    }

    async fn cancel(&self, id: &str) -> TrackingResult<()> {
        let url = self
            .base_url
            .join(&format!("{}/{}", self.config.topic, Self::sequence_id(id)))?;
        let response = self
            .client
            .delete(url)
            .headers(self.build_headers()?)
            .send()
            .await
            .rejected_by_platform("cancel")?;
        Self::check_status("cancel", response).await
    }

    async fn set_icon(&self, name: &str) -> TrackingResult<()> {
        if let Ok(mut icon) = self.icon.lock() {
            *icon = Some(name.to_string());
        }
        Ok(())
    }
}
