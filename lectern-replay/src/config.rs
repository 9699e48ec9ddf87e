//! File-backed configuration for the replay tool.

use std::fs;
use std::path::Path;

use lectern_player::{PlaybackConfig, StreamConfig};
use serde::{Deserialize, Serialize};

use crate::commands::CliError;

/// Contents of a `--config` JSON file. Missing sections keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub playback: PlaybackConfig,
    pub stream: StreamConfig,
}

impl ReplayConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies command-line overrides on top of the file values.
    pub fn with_max_record_bytes(mut self, max_record_bytes: Option<usize>) -> Self {
        if let Some(max) = max_record_bytes {
            self.stream.max_record_bytes = max;
        }
        self
    }
}
