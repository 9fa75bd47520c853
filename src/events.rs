//! Event Bridge
//!
//! Typed fan-out of lifecycle and action events to any number of listeners.
//! Each [`Subscription`] owns its own unbounded `flume` channel, so a slow
//! listener never blocks the emitter. Dropping a subscription detaches it;
//! nothing is delivered to it afterwards.

use flume::{Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::trace;

use crate::tracking::types::{ActionEvent, ServiceStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "onNotificationAction")]
    Action(ActionEvent),
    #[serde(rename = "onNotificationUpdate")]
    Update { id: String },
    #[serde(rename = "onServiceStatusChange")]
    StatusChange(ServiceStatus),
}

impl Event {
    /// Name of the event on the JavaScript side
    pub fn name(&self) -> &'static str {
        match self {
            Self::Action(_) => "onNotificationAction",
            Self::Update { .. } => "onNotificationUpdate",
            Self::StatusChange(_) => "onServiceStatusChange",
        }
    }
}

#[derive(Default)]
struct BridgeInner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Sender<Event>)>>,
}

impl BridgeInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Sender<Event>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Default)]
pub struct EventBridge {
    inner: Arc<BridgeInner>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = flume::unbounded();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push((id, sender));
        Subscription {
            id,
            receiver,
            bridge: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn emit(&self, event: Event) -> usize {
        trace!("Emitting {}", event.name());
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// Listener handle. Events stop arriving once it is dropped or
/// [`unsubscribe`](Self::unsubscribe)d.
pub struct Subscription {
    id: u64,
    receiver: Receiver<Event>,
    bridge: Weak<BridgeInner>,
}

impl Subscription {
    /// Wait for the next event. `None` once the bridge is gone and the
    /// backlog is drained.
    pub async fn recv(&self) -> Option<Event> {
        self.receiver.recv_async().await.ok()
    }

    /// Everything delivered so far
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.drain().collect()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.subscribers().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fan_out_to_all_subscribers() {
        let bridge = EventBridge::new();
        let first = bridge.subscribe();
        let second = bridge.subscribe();

        let delivered = bridge.emit(Event::Update { id: "a".to_string() });

        assert_eq!(delivered, 2);
        assert_eq!(first.drain(), vec![Event::Update { id: "a".to_string() }]);
        assert_eq!(second.drain().len(), 1);
    }

    #[test]
    fn test_no_delivery_after_unsubscribe() {
        let bridge = EventBridge::new();
        let kept = bridge.subscribe();
        let dropped = bridge.subscribe();
        dropped.unsubscribe();

        assert_eq!(bridge.subscriber_count(), 1);
        assert_eq!(bridge.emit(Event::StatusChange(ServiceStatus::idle())), 1);
        assert_eq!(kept.drain().len(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::Action(ActionEvent::new("trip-1", "view-map"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "onNotificationAction",
                "notificationId": "trip-1",
                "actionId": "view-map"
            })
        );

        let event = Event::StatusChange(ServiceStatus::stopped("trip-1"));
        assert_eq!(event.name(), "onServiceStatusChange");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "onServiceStatusChange", "isRunning": false, "notificationId": "trip-1"})
        );
    }

    #[tokio::test]
    async fn test_recv_async() {
        let bridge = EventBridge::new();
        let subscription = bridge.subscribe();
        bridge.emit(Event::Update { id: "x".to_string() });
        assert_eq!(subscription.recv().await, Some(Event::Update { id: "x".to_string() }));
    }
}
