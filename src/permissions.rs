//! Permission Gateway
//!
//! Normalizes the per-domain answers of the platform into one
//! [`PermissionState`]. Absence of permission is data, never an error.
//!
//! Reduction: `granted` only when every required domain is granted. On a
//! platform without a true tri-state signal anything else is `denied`, so
//! "never asked" reads as `denied` there. Platforms that do report
//! "undetermined" get `undetermined` when nothing was explicitly denied.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::TrackingResult;
use crate::platform::{PermissionBackend, PermissionGrant, RawPermissions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionState {
    pub status: PermissionStatus,
    pub notifications_granted: bool,
    pub location_granted: bool,
}

impl PermissionState {
    pub fn reduce(raw: RawPermissions) -> Self {
        let required: Vec<PermissionGrant> =
            std::iter::once(raw.notifications).chain(raw.location).collect();

        let status = if required.iter().all(|grant| grant.is_granted()) {
            PermissionStatus::Granted
        } else if raw.tri_state
            && !required.contains(&PermissionGrant::Denied)
            && required.contains(&PermissionGrant::Undetermined)
        {
            PermissionStatus::Undetermined
        } else {
            PermissionStatus::Denied
        };

        Self {
            status,
            notifications_granted: raw.notifications.is_granted(),
            // Not required means nothing stands in the way
            location_granted: raw.location.map_or(true, PermissionGrant::is_granted),
        }
    }

    pub fn is_granted(&self) -> bool {
        self.status == PermissionStatus::Granted
    }
}

pub struct PermissionGateway {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionGateway {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    /// Prompt for notification display and, where required, location
    pub async fn request(&self) -> TrackingResult<PermissionState> {
        let state = PermissionState::reduce(self.backend.request().await?);
        debug!(?state, "Permission request resolved");
        Ok(state)
    }

    /// Read the current state without prompting
    pub async fn query(&self) -> TrackingResult<PermissionState> {
        Ok(PermissionState::reduce(self.backend.query().await?))
    }
}
