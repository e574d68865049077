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

//! Runtime configuration of the preloader.

use crate::asset::VariantPolicy;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// An error raised while loading or validating a [`PreloadConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid RON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the loader and the group coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// The maximum number of fetches outstanding at once.
    pub concurrency_limit: usize,
    /// How long a single fetch may take before it counts as failed.
    pub fetch_timeout_ms: u64,
    /// The group loaded eagerly when the coordinator starts.
    pub essential_group: String,
    /// The group loaded in the background once the essential group settled.
    pub background_group: Option<String>,
    /// The delay between the essential group settling and the background load starting.
    pub background_delay_ms: u64,
    /// Format and size preferences applied to every locator.
    pub variants: VariantPolicy,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            fetch_timeout_ms: 5_000,
            essential_group: "essential".to_owned(),
            background_group: Some("interactions".to_owned()),
            background_delay_ms: 1_000,
            variants: VariantPolicy::default(),
        }
    }
}

impl PreloadConfig {
    /// Parses and validates a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_limit must be at least 1".to_owned(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_ms must be at least 1".to_owned(),
            ));
        }
        if self.essential_group.is_empty() {
            return Err(ConfigError::Invalid(
                "essential_group must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// The per-fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// The delay before the background group starts.
    pub fn background_delay(&self) -> Duration {
        Duration::from_millis(self.background_delay_ms)
    }
}
