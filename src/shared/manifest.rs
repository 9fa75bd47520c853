//! Capability manifest derived from the configuration-time permission surface
//!
//! This is the data a packaging step would inject into the platform manifest
//! and property list. Nothing here writes those files.

use serde::Serialize;

use super::config::PermissionMessages;

pub const ANDROID_PERMISSIONS: &[&str] = &[
    "android.permission.POST_NOTIFICATIONS",
    "android.permission.FOREGROUND_SERVICE",
    "android.permission.FOREGROUND_SERVICE_LOCATION",
    "android.permission.ACCESS_COARSE_LOCATION",
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.ACCESS_BACKGROUND_LOCATION",
];

pub const IOS_BACKGROUND_MODES: &[&str] = &["location", "fetch"];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityManifest {
    pub android_permissions: Vec<String>,
    pub foreground_service_type: String,
    pub ios_background_modes: Vec<String>,
    pub location_always_and_when_in_use_usage_description: String,
    pub location_when_in_use_usage_description: String,
}

impl CapabilityManifest {
    pub fn from_messages(messages: &PermissionMessages) -> Self {
        Self {
            android_permissions: ANDROID_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
            foreground_service_type: "location".to_string(),
            ios_background_modes: IOS_BACKGROUND_MODES.iter().map(|m| m.to_string()).collect(),
            location_always_and_when_in_use_usage_description: messages
                .location_always()
                .to_string(),
            location_when_in_use_usage_description: messages.location_when_in_use().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::DEFAULT_LOCATION_WHEN_IN_USE_MESSAGE;

    #[test]
    fn test_manifest_uses_custom_and_default_messages() {
        let messages = PermissionMessages {
            location_always_and_when_in_use_permission: Some("Always, please".to_string()),
            location_when_in_use_permission: None,
        };
        let manifest = CapabilityManifest::from_messages(&messages);

        assert_eq!(
            manifest.location_always_and_when_in_use_usage_description,
            "Always, please"
        );
        assert_eq!(
            manifest.location_when_in_use_usage_description,
            DEFAULT_LOCATION_WHEN_IN_USE_MESSAGE
        );
        assert!(manifest
            .android_permissions
            .contains(&"android.permission.FOREGROUND_SERVICE".to_string()));
    }

    #[test]
    fn test_manifest_serializes_camel_case() {
        let manifest = CapabilityManifest::from_messages(&PermissionMessages::default());
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("iosBackgroundModes").is_some());
        assert_eq!(json["foregroundServiceType"], "location");
    }
}
