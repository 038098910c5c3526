//! Engine configuration file.

use std::path::Path;

use polysub_core::arena::ArenaPlan;
use polysub_synth::{FilterModel, SynthSettings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 192_000;
/// Smallest block pool that can carry a full tick.
pub const MIN_POOL_BLOCKS: usize = 16;

/// Filter model name as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterModelName {
    /// Diode ladder.
    #[default]
    Diode,
    /// Moog-style transistor ladder.
    Moog,
    /// Two/four-pole multimode.
    Multimode,
}

impl From<FilterModelName> for FilterModel {
    fn from(name: FilterModelName) -> Self {
        match name {
            FilterModelName::Diode => FilterModel::Diode,
            FilterModelName::Moog => FilterModel::Moog,
            FilterModelName::Multimode => FilterModel::Multimode,
        }
    }
}

impl From<FilterModel> for FilterModelName {
    fn from(model: FilterModel) -> Self {
        match model {
            FilterModel::Diode => FilterModelName::Diode,
            FilterModel::Moog => FilterModelName::Moog,
            FilterModel::Multimode => FilterModelName::Multimode,
        }
    }
}

/// Byte budgets for long-lived sample buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Large external region. Zero when absent.
    pub large_bytes: usize,
    /// Internal RAM available to the arena.
    pub internal_bytes: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let plan = ArenaPlan::default();
        Self {
            large_bytes: plan.large_bytes,
            internal_bytes: plan.internal_bytes,
        }
    }
}

impl From<MemoryConfig> for ArenaPlan {
    fn from(memory: MemoryConfig) -> Self {
        ArenaPlan {
            large_bytes: memory.large_bytes,
            internal_bytes: memory.internal_bytes,
        }
    }
}

/// Startup settings of the engine, as stored in `engine.toml`.
///
/// Every field has a default, so an empty file is a valid config.
///
/// # Example
///
/// ```rust
/// use polysub_config::{EngineConfig, FilterModelName};
///
/// let config = EngineConfig::from_toml_str(r#"
///     sample_rate = 48000
///     filter_model = "moog"
/// "#).unwrap();
///
/// assert_eq!(config.sample_rate, 48000);
/// assert_eq!(config.filter_model, FilterModelName::Moog);
/// assert_eq!(config.pool_blocks, 160);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Blocks in the sample pool.
    pub pool_blocks: usize,
    /// Samples kept by the scope.
    pub scope_samples: usize,
    /// Filter model selected at startup.
    pub filter_model: FilterModelName,
    /// Memory budgets.
    pub memory: MemoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let settings = SynthSettings::default();
        Self {
            sample_rate: settings.sample_rate as u32,
            pool_blocks: settings.pool_blocks,
            scope_samples: settings.scope_samples,
            filter_model: settings.filter_model.into(),
            memory: MemoryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field against what the engine accepts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!(
                    "must be within {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}, got {}",
                    self.sample_rate
                ),
            ));
        }
        if self.pool_blocks < MIN_POOL_BLOCKS {
            return Err(ConfigError::invalid(
                "pool_blocks",
                format!("must be at least {MIN_POOL_BLOCKS}, got {}", self.pool_blocks),
            ));
        }
        if self.scope_samples == 0 {
            return Err(ConfigError::invalid("scope_samples", "must be at least 1"));
        }
        let scope_bytes = self.scope_samples * core::mem::size_of::<i16>();
        if ArenaPlan::from(self.memory).select(scope_bytes).is_none() {
            return Err(ConfigError::invalid(
                "memory",
                format!("no region can hold the {scope_bytes}-byte scope buffer"),
            ));
        }
        Ok(())
    }

    /// Engine settings for [`Synth::new`](polysub_synth::Synth::new).
    pub fn settings(&self) -> SynthSettings {
        SynthSettings {
            sample_rate: self.sample_rate as f32,
            pool_blocks: self.pool_blocks,
            scope_samples: self.scope_samples,
            filter_model: self.filter_model.into(),
            arena: self.memory.into(),
        }
    }
}
