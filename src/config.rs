//! Server settings
//!
//! Settings arrive as JSON, either as `initializationOptions` or through
//! `workspace/didChangeConfiguration`. Missing fields keep their defaults.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Key under which editors usually nest this server's settings
pub const SETTINGS_SECTION: &str = "jsonMustache";

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Documents whose identifier ends with one of these are templates
    pub template_suffixes: Vec<String>,
    /// Resolved JSON Schema used for validation, if any
    pub schema: Option<Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_suffixes: vec![".json.mustache".to_string(), ".json.hbs".to_string()],
            schema: None,
        }
    }
}

impl Settings {
    /// Parse settings, accepting either the bare object or one nested
    /// under [`SETTINGS_SECTION`]. `null` yields the defaults.
    pub fn from_value(value: Option<Value>) -> Result<Self, ConfigError> {
        let value = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(mut map)) if map.contains_key(SETTINGS_SECTION) => {
                map.remove(SETTINGS_SECTION).unwrap_or(Value::Null)
            }
            Some(other) => other,
        };

        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Whether the identifier (URI or path) marks a template document
    pub fn is_template_document(&self, identifier: &str) -> bool {
        let path = identifier
            .split(['?', '#'])
            .next()
            .unwrap_or(identifier)
            .to_ascii_lowercase();
        self.template_suffixes
            .iter()
            .any(|suffix| path.ends_with(&suffix.to_ascii_lowercase()))
    }
}
