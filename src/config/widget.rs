//! Embeddable widget configuration
//!
//! Hosts supply a partial JSON object; it is deep-merged over
//! [`WidgetConfig::default`] and then validated by deserialization, so an
//! unknown `position` or `theme` is rejected as a configuration error.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Corner of the host page the widget docks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    /// Resolve `Auto` against the host's dark-mode preference
    #[must_use]
    pub const fn resolve(self, prefers_dark: bool) -> Self {
        match self {
            Self::Auto if prefers_dark => Self::Dark,
            Self::Auto => Self::Light,
            other => other,
        }
    }
}

/// Widget footprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Compact,
    #[default]
    Normal,
    Large,
}

/// Informational topics the widget may answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    pub camera_locations: bool,
    pub maintenance_schedule: bool,
    pub emergency_contacts: bool,
    pub report_issues: bool,
    pub operational_hours: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            camera_locations: true,
            maintenance_schedule: true,
            emergency_contacts: true,
            report_issues: true,
            operational_hours: true,
        }
    }
}

/// Visual overrides applied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub primary_color: String,
    pub font_family: String,
    pub border_radius: String,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            primary_color: "#2196F3".to_string(),
            font_family: "system-ui, sans-serif".to_string(),
            border_radius: "12px".to_string(),
        }
    }
}

/// Host integration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub api_endpoint: Option<String>,
    pub auth_token: Option<String>,
    #[serde(default)]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

/// Complete widget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub position: Position,
    pub theme: Theme,
    pub size: Size,
    pub enabled: bool,
    pub features: Features,
    pub customization: Customization,
    pub integration: Integration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            position: Position::default(),
            theme: Theme::default(),
            size: Size::default(),
            enabled: true,
            features: Features::default(),
            customization: Customization::default(),
            integration: Integration::default(),
        }
    }
}

impl WidgetConfig {
    /// Merge a partial JSON object over the defaults and validate the result
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the overlay is not an object or a field
    /// carries an unrecognized value
    pub fn from_overlay(overlay: &serde_json::Value) -> Result<Self> {
        if !overlay.is_object() {
            return Err(Error::Config("widget config must be a JSON object".to_string()));
        }

        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, overlay);

        serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("invalid widget config: {e}")))
    }

    /// Parse a declarative `data-config` attribute value
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the attribute is not valid JSON or fails
    /// validation
    pub fn from_attribute(raw: &str) -> Result<Self> {
        let overlay: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid data-config JSON: {e}")))?;
        Self::from_overlay(&overlay)
    }
}

/// Recursively merge `overlay` into `base`
///
/// Objects merge key by key; any other overlay value replaces the base value.
pub fn deep_merge(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
