//! Helpers shared by the commands.

use anyhow::Context;
use clap::ValueEnum;
use polysub_config::{EngineConfig, default_config_path};
use polysub_synth::{FilterModel, SynthParam};
use std::path::Path;

/// Filter models for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliFilterModel {
    Diode,
    Moog,
    Multimode,
}

impl From<CliFilterModel> for FilterModel {
    fn from(model: CliFilterModel) -> Self {
        match model {
            CliFilterModel::Diode => FilterModel::Diode,
            CliFilterModel::Moog => FilterModel::Moog,
            CliFilterModel::Multimode => FilterModel::Multimode,
        }
    }
}

/// Config from `explicit`, else the user config file if it exists, else
/// defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = explicit {
        let config = EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        return Ok(config);
    }
    let path = default_config_path();
    if path.exists() {
        let config = EngineConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Parameter by its string id (`flt_cutoff`, `amp_release`, ...).
pub fn find_param(string_id: &str) -> Option<SynthParam> {
    SynthParam::ALL
        .into_iter()
        .find(|param| param.descriptor().string_id == string_id)
}

/// Split `key=value`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid format: '{s}' (expected key=value)"));
    }
    Ok((parts[0].trim().to_string(), parts[1].trim().to_string()))
}

/// Parse a comma-separated list of MIDI note numbers.
pub fn parse_notes(s: &str) -> Result<Vec<u8>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>()
                .ok()
                .filter(|note| *note <= 127)
                .ok_or_else(|| format!("Invalid note '{part}' (expected 0-127)"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notes() {
        assert_eq!(parse_notes("60, 64,67"), Ok(vec![60, 64, 67]));
        assert!(parse_notes("60,128").is_err());
        assert!(parse_notes("c4").is_err());
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("flt_cutoff=800"),
            Ok(("flt_cutoff".to_string(), "800".to_string()))
        );
        assert!(parse_key_val("flt_cutoff").is_err());
    }

    #[test]
    fn test_find_param() {
        assert_eq!(find_param("flt_cutoff"), Some(SynthParam::Cutoff));
        assert_eq!(find_param("nope"), None);
    }
}
