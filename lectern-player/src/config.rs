//! Runtime configuration for playback and stream handling.

use std::time::Duration;

use lectern_proto::DEFAULT_MAX_RECORD_BYTES;
use serde::{Deserialize, Serialize};

/// Playback scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between scheduler ticks. Default: 16ms (~60 fps).
    pub frame_interval_ms: u64,
    /// Apply actions synchronously while the surface is hidden. Default: true.
    pub apply_when_hidden: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            apply_when_hidden: true,
        }
    }
}

impl PlaybackConfig {
    /// Config for testing (fast ticks).
    pub fn for_testing() -> Self {
        Self {
            frame_interval_ms: 1,
            apply_when_hidden: true,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

/// Stream processor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Largest accepted envelope body. Default: 16 MiB.
    pub max_record_bytes: usize,
    /// Envelopes held per pending document before rejecting. Default: 10_000.
    pub pending_queue_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            pending_queue_capacity: 10_000,
        }
    }
}

impl StreamConfig {
    /// Config for testing (small limits so overflow paths are reachable).
    pub fn for_testing() -> Self {
        Self {
            max_record_bytes: 64 * 1024,
            pending_queue_capacity: 8,
        }
    }
}
