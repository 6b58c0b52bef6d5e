// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Loop configuration
//!
//! Loaded from / saved to TOML. Every field has a default, so an empty file
//! (or no file at all) yields [`CoreConfig::default`].
//!
//! ```toml
//! [pacer]
//! refresh_rate_hz = 60.0
//! smoothing = 0.2
//! history_len = 32
//! max_swap_interval = 4
//! degrade_after_frames = 3
//! vsync = true
//!
//! [queue]
//! input_capacity = 256
//!
//! [scheduler]
//! idle_poll_ms = 8
//! gpu_idle_timeout_ms = 500
//! surface_release_timeout_ms = 1000
//! ```

use crate::core::error::{CoreError, Result};
use crate::core::pacer::PacerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Event queue settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum pending input events; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_capacity: Option<usize>,
}

/// Loop thread timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Longest single wait on the queue while idle
    pub idle_poll_ms: u64,
    /// Bound on waiting for in-flight GPU work before releasing a surface
    pub gpu_idle_timeout_ms: u64,
    /// How long a host waits for the loop to release a destroyed surface
    pub surface_release_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_poll_ms: 8,
            gpu_idle_timeout_ms: 500,
            surface_release_timeout_ms: 1000,
        }
    }
}

impl SchedulerConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn gpu_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.gpu_idle_timeout_ms)
    }

    pub fn surface_release_timeout(&self) -> Duration {
        Duration::from_millis(self.surface_release_timeout_ms)
    }
}

/// Complete loop configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub pacer: PacerConfig,
    pub queue: QueueConfig,
    pub scheduler: SchedulerConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| CoreError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.pacer.validate()?;
        if self.queue.input_capacity == Some(0) {
            return Err(CoreError::Config(
                "queue.input_capacity must be > 0 when set".into(),
            ));
        }
        if self.scheduler.idle_poll_ms == 0 {
            return Err(CoreError::Config(
                "scheduler.idle_poll_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
