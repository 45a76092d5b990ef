// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while loading a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The text is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The values parse but cannot be used.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The configuration could not be written out.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Settings of a [`Client`](crate::Client), read from RON.
///
/// Missing fields take their defaults:
///
/// ```ron
/// (
///     discover_declarations: true,
///     scene_bridge: true,
///     warn_unmapped_scenes: true,
///     log_filter: "info",
///     queue_capacity: None,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Include handlers declared with the attribute markers.
    pub discover_declarations: bool,
    /// Create the scene-to-scope bridge.
    pub scene_bridge: bool,
    /// Report unmapped scene names as warnings rather than debug logs.
    pub warn_unmapped_scenes: bool,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Bound of the dispatch queue; `None` is unbounded.
    pub queue_capacity: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discover_declarations: true,
            scene_bridge: true,
            warn_unmapped_scenes: true,
            log_filter: "info".to_string(),
            queue_capacity: None,
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from RON text and validates it.
    ///
    /// ## Arguments
    /// * `text` - A RON struct; missing fields take their defaults.
    /// ## Returns
    /// * The configuration, or [`ConfigError::Invalid`] for a zero
    ///   `queue_capacity`.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero-capacity channel only hands over to a blocked receiver,
        // which the pumping thread never is.
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1, or None for unbounded",
            });
        }
        Ok(())
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Renders the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }
}
