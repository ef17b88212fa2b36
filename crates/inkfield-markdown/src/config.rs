//! Field configuration: the inbound prop surface of the host component.
//!
//! Toolbar buttons and upload settings are carried as data only; button
//! rendering and the upload transport itself belong to the host.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One toolbar button, by name. Actions are wired by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarButton {
    pub name: SmolStr,
}

impl ToolbarButton {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self { name: name.into() }
    }
}

/// Opaque passthrough configuration for the upload subcomponent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Maximum accepted image size, in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_image_size: Option<u64>,
}

/// Inbound configuration of the markdown field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfig {
    pub read_only: bool,
    pub locale: SmolStr,
    pub placeholder: SmolStr,
    pub height: u32,
    pub toolbar: Vec<ToolbarButton>,
    pub upload: UploadConfig,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            locale: SmolStr::new("en"),
            placeholder: SmolStr::default(),
            height: 300,
            toolbar: Vec::new(),
            upload: UploadConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_props_json() {
        let config: FieldConfig = serde_json::from_value(serde_json::json!({
            "readOnly": true,
            "locale": "fr",
            "placeholder": "Champ md",
            "height": 310,
            "toolbar": [{ "name": "image" }],
            "upload": { "maxImageSize": 3 }
        }))
        .unwrap();
        assert!(config.read_only);
        assert_eq!(config.locale, "fr");
        assert_eq!(config.toolbar, vec![ToolbarButton::new("image")]);
        assert_eq!(config.upload.max_image_size, Some(3));
    }

    #[test]
    fn test_config_defaults() {
        let config: FieldConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FieldConfig::default());
        assert_eq!(config.locale, "en");
    }
}
