//! Action Dispatcher
//!
//! Routes action-button presses coming back from the platform. Every press is
//! forwarded to listeners; the reserved `stop-tracking` action additionally
//! ends tracking.

use tracing::{debug, info};

use super::controller::LifecycleController;
use super::types::ActionEvent;
use crate::errors::TrackingResult;
use crate::events::{Event, EventBridge};

#[derive(Clone)]
pub struct ActionDispatcher {
    controller: LifecycleController,
    events: EventBridge,
}

impl ActionDispatcher {
    pub fn new(controller: LifecycleController, events: EventBridge) -> Self {
        Self { controller, events }
    }

    pub async fn dispatch(&self, event: ActionEvent) -> TrackingResult<()> {
        debug!(
            id = %event.notification_id,
            action = %event.action_id,
            "Dispatching notification action"
        );
        let stop = event.is_stop();
        let id = event.notification_id.clone();
        self.events.emit(Event::Action(event));

        if stop {
            info!(id = %id, "Stop requested from notification");
            self.controller.stop(&id).await?;
        }
        Ok(())
    }
}
