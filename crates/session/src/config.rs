//! Relay configuration.
//!
//! Stored as TOML with one table per role; every field is optional:
//!
//! ```toml
//! [frame]
//! target_origin = "https://host.example"
//! session_id = "checkout"
//! levels = ["warn", "error"]
//!
//! [host]
//! allowed_origins = ["https://embed.example"]
//! forward_to_console = true
//! ```

use std::path::Path;

use framerelay_frame_relay::FrameRelayOptions;
use framerelay_host_relay::{HostRelayConfig, HostRelayOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Options for both relay roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub frame: FrameRelayOptions,

    #[serde(default)]
    pub host: HostRelayConfig,
}

impl RelayConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, or returns the defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Host options from the file; the frame binding and callback are left
    /// unset.
    pub fn host_options(&self) -> HostRelayOptions {
        self.host.clone().into()
    }
}
