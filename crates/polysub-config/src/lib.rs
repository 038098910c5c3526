//! Engine configuration for the polysub synthesizer.
//!
//! The engine crates take a plain [`SynthSettings`](polysub_synth::SynthSettings)
//! and stay `no_std`. This crate is the host-side layer that reads those
//! settings from a TOML file, validates them and writes them back.
//!
//! # Example
//!
//! ```rust,no_run
//! use polysub_config::{EngineConfig, default_config_path};
//! use polysub_synth::Synth;
//!
//! let config = EngineConfig::load(default_config_path()).unwrap_or_default();
//! let (synth, control) = Synth::new(&config.settings()).unwrap();
//! ```

mod engine;
mod error;

/// Platform-specific config location.
pub mod paths;

pub use engine::{
    EngineConfig, FilterModelName, MAX_SAMPLE_RATE, MIN_POOL_BLOCKS, MIN_SAMPLE_RATE, MemoryConfig,
};
pub use error::ConfigError;
pub use paths::{CONFIG_FILE_NAME, default_config_path, user_config_dir};
