// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process configuration files.
//!
//! A configuration describes the step list and the timing table. It can be
//! stored as RON (`.ron`) or JSON (`.json`); the format follows the extension.

use crate::catalog;
use crate::step::Step;
use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse failure
    #[error("Invalid RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization failure
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// JSON parse or serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither `.ron` nor `.json`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// File was written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// The process has no steps
    #[error("Process has no steps")]
    EmptyProcess,

    /// A step has an empty name
    #[error("Step {0} has an empty name")]
    EmptyStepName(usize),

    /// One element id is used both as a target and as a connector
    #[error("Element {0} is used both as a target and as a connector")]
    ConflictingElement(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Non-fatal timing problem found by [`ProcessConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingWarning {
    /// Index of the step
    pub step: usize,
    /// Step name
    pub name: String,
    /// Configured duration
    pub duration_ms: u64,
    /// Offset at which the step's last effect fires
    pub settle_ms: u64,
}

impl fmt::Display for TimingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({}) lasts {}ms but its last effect fires at {}ms",
            self.step + 1,
            self.name,
            self.duration_ms,
            self.settle_ms
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Target,
    Connector,
}

enum Format {
    Ron,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Ok(Self::Ron),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Step list and timing for one animated process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Delay table
    #[serde(default)]
    pub timing: Timing,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

fn default_version() -> u32 {
    CONFIG_FORMAT_VERSION
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::new(catalog::biodiesel_process())
    }
}

impl ProcessConfig {
    /// Configuration with default timing
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            timing: Timing::default(),
            steps,
        }
    }

    /// Parse a RON document
    pub fn from_ron(content: &str) -> Result<Self> {
        Self::check_version(ron::from_str(content)?)
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        Self::check_version(serde_json::from_str(content)?)
    }

    fn check_version(config: Self) -> Result<Self> {
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = match format {
            Format::Ron => Self::from_ron(&content)?,
            Format::Json => Self::from_json(&content)?,
        };
        tracing::debug!("Loaded process config with {} steps from {:?}", config.steps.len(), path);
        Ok(config)
    }

    /// Save the configuration, pretty-printed
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match Format::from_path(path)? {
            Format::Ron => {
                let config = ron::ser::PrettyConfig::default()
                    .struct_names(true)
                    .enumerate_arrays(false);
                ron::ser::to_string_pretty(self, config)?
            }
            Format::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the configuration.
    ///
    /// Structural problems are errors. Steps that end before their own
    /// effects have fired are returned as warnings and left as configured.
    pub fn validate(&self) -> Result<Vec<TimingWarning>> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptyProcess);
        }

        let mut roles: HashMap<&str, Role> = HashMap::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(ConfigError::EmptyStepName(index));
            }

            let ids = step
                .targets
                .iter()
                .map(|t| (t.id.as_str(), Role::Target))
                .chain(step.connectors.iter().map(|c| (c.as_str(), Role::Connector)));
            for (id, role) in ids {
                if *roles.entry(id).or_insert(role) != role {
                    return Err(ConfigError::ConflictingElement(id.to_string()));
                }
            }
        }

        let warnings = self
            .steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| {
                let settle_ms = step.settle_ms(&self.timing);
                (settle_ms > step.duration_ms).then(|| TimingWarning {
                    step: index,
                    name: step.name.clone(),
                    duration_ms: step.duration_ms,
                    settle_ms,
                })
            })
            .collect();

        Ok(warnings)
    }
}
