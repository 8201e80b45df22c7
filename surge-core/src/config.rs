//! Router configuration.
//!
//! Defaults cover normal play. A TOML file may override any field:
//!
//! ```toml
//! invoke = "ihs"
//! feedback_name = "Intelligent Healing Surge"
//! serialize_per_character = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a [`crate::CommandRouter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Command word after `!`; commands look like `!ihs -surge`.
    pub invoke: String,

    /// Speaker name for feedback messages.
    pub feedback_name: String,

    /// Hold a per-character lock for the whole of each command.
    pub serialize_per_character: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            invoke: "ihs".to_string(),
            feedback_name: "Intelligent Healing Surge".to_string(),
            serialize_per_character: false,
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the command word.
    pub fn with_invoke(mut self, invoke: impl Into<String>) -> Self {
        self.invoke = invoke.into();
        self
    }

    /// Set the feedback speaker name.
    pub fn with_feedback_name(mut self, name: impl Into<String>) -> Self {
        self.feedback_name = name.into();
        self
    }

    /// Serialize commands per character.
    pub fn with_serialization(mut self, enabled: bool) -> Self {
        self.serialize_per_character = enabled;
        self
    }

    /// The full command prefix, e.g. `!ihs`.
    pub fn prefix(&self) -> String {
        format!("!{}", self.invoke)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invoke.is_empty() || self.invoke.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "invoke must be a single non-empty word, got {:?}",
                self.invoke
            )));
        }
        if self.invoke.starts_with('!') {
            return Err(ConfigError::Invalid(
                "invoke must not include the leading '!'".to_string(),
            ));
        }
        if self.feedback_name.trim().is_empty() {
            return Err(ConfigError::Invalid("feedback_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }
}
