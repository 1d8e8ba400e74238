// Copyright 2025 John Brosnihan
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
//! Runtime configuration
//!
//! [`RuntimeConfig`] collects the tunables a scene reads while spawning
//! entities and drawing frames. Defaults match a 16-pixel tile game; every
//! field can be overridden with the `with_*` builders or, for the debugging
//! switches, through environment variables:
//!
//! ```bash
//! export ENTITY_RUNTIME_DEBUG=1        # outline hit masks every frame
//! export ENTITY_RUNTIME_LOG_VERBOSE=1  # debug-level logging
//! ```

/// Environment variable enabling the hit-mask debug overlay
pub const DEBUG_ENV_VAR: &str = "ENTITY_RUNTIME_DEBUG";

/// Environment variable enabling verbose logging
pub const VERBOSE_ENV_VAR: &str = "ENTITY_RUNTIME_LOG_VERBOSE";

/// Configuration shared by every service a scene owns
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Outline every entity's hit mask after drawing it
    pub debug_masks: bool,
    /// Log at debug level instead of info
    pub verbose_logging: bool,
    /// Width and height given to entities whose property bag omits them
    pub default_size: u32,
    /// Radius of the interaction zone archetypes create when none is given
    pub interaction_radius: f64,
    /// Name of the entity that archetype interaction zones track when none is given
    pub default_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            debug_masks: false,
            verbose_logging: false,
            default_size: 16,
            interaction_radius: 24.0,
            default_target: "player".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(flag) = env_flag(DEBUG_ENV_VAR) {
            config.debug_masks = flag;
        }
        if let Some(flag) = env_flag(VERBOSE_ENV_VAR) {
            config.verbose_logging = flag;
        }
        config
    }

    /// Enable or disable the hit-mask overlay
    pub fn with_debug_masks(mut self, enabled: bool) -> Self {
        self.debug_masks = enabled;
        self
    }

    /// Enable or disable verbose logging
    pub fn with_verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    /// Set the fallback entity size
    pub fn with_default_size(mut self, size: u32) -> Self {
        self.default_size = size;
        self
    }

    /// Set the fallback interaction radius
    pub fn with_interaction_radius(mut self, radius: f64) -> Self {
        self.interaction_radius = radius.max(0.0);
        self
    }

    /// Set the entity name archetype interaction zones track by default
    pub fn with_default_target(mut self, name: impl Into<String>) -> Self {
        self.default_target = name.into();
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    parse_flag(&value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            log::warn!("ignoring unrecognised flag value '{}'", other);
            None
        }
    }
}
