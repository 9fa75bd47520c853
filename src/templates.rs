use handlebars::Handlebars;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use crate::errors::{TrackingError, TrackingResult};

pub const COUNTDOWN_TEMPLATE: &str = "countdown";
pub const ARRIVED_TEMPLATE: &str = "arrived";

/// Body text templates for the auto-updating countdown
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Engine with the built-in English templates only
    pub fn new() -> TrackingResult<Self> {
        Self::with_overrides(&HashMap::new())
    }

    /// Engine whose `countdown` / `arrived` templates may be replaced from
    /// configuration
    pub fn with_overrides(overrides: &HashMap<String, String>) -> TrackingResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Notification text is not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        let mut templates = Self::create_default_templates();
        for (name, template) in overrides {
            if !templates.contains_key(name) {
                warn!("Ignoring override for unknown template: {}", name);
                continue;
            }
            templates.insert(name.clone(), template.clone());
        }

        for (name, template) in &templates {
            handlebars
                .register_template_string(name, template)
                .map_err(|e| {
                    TrackingError::template_with_source(name.clone(), "failed to register", e)
                })?;
        }

        Ok(TemplateEngine { handlebars })
    }

    fn create_default_templates() -> HashMap<String, String> {
        let mut templates = HashMap::new();
        templates.insert(
            COUNTDOWN_TEMPLATE.to_string(),
            "arriving next in {{minutes}} {{#if (eq minutes 1)}}minute{{else}}minutes{{/if}}"
                .to_string(),
        );
        templates.insert(ARRIVED_TEMPLATE.to_string(), "arriving now".to_string());
        templates
    }

    /// Body text for `minutes` remaining; `minutes <= 0` selects the arrival
    /// message
    pub fn countdown_body(&self, id: &str, minutes: i64) -> TrackingResult<String> {
        if minutes <= 0 {
            return self.render(ARRIVED_TEMPLATE, &json!({ "id": id }));
        }
        self.render(COUNTDOWN_TEMPLATE, &json!({ "id": id, "minutes": minutes }))
    }

    pub fn render(&self, name: &str, data: &serde_json::Value) -> TrackingResult<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| TrackingError::template_with_source(name, "failed to render", e))
    }

    pub fn list_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlebars.get_templates().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_pluralization() {
        let engine = TemplateEngine::new().unwrap();
        assert_eq!(
            engine.countdown_body("t", 5).unwrap(),
            "arriving next in 5 minutes"
        );
        assert_eq!(
            engine.countdown_body("t", 1).unwrap(),
            "arriving next in 1 minute"
        );
        assert_eq!(engine.countdown_body("t", 0).unwrap(), "arriving now");
        assert_eq!(engine.countdown_body("t", -3).unwrap(), "arriving now");
    }

    #[test]
    fn test_override_from_config() {
        let mut overrides = HashMap::new();
        overrides.insert(
            COUNTDOWN_TEMPLATE.to_string(),
            "{{minutes}} min to go for <{{id}}>".to_string(),
        );
        overrides.insert("bogus".to_string(), "ignored".to_string());

        let engine = TemplateEngine::with_overrides(&overrides).unwrap();
        assert_eq!(
            engine.countdown_body("bus & tram", 3).unwrap(),
            "3 min to go for <bus & tram>"
        );
        assert_eq!(engine.list_templates(), vec!["arrived", "countdown"]);
    }

    #[test]
    fn test_bad_override_is_template_error() {
        let mut overrides = HashMap::new();
        overrides.insert(ARRIVED_TEMPLATE.to_string(), "{{#if}}".to_string());
        let err = TemplateEngine::with_overrides(&overrides).unwrap_err();
        assert_eq!(err.category(), "template");
    }
}
