//! Integration tests for polysub-config.
//!
//! File round-trips and driving a real engine from a loaded config.

use polysub_config::{ConfigError, EngineConfig, FilterModelName, MemoryConfig};
use polysub_synth::{FilterModel, Synth};
use tempfile::TempDir;

const SR: u32 = 48_000;

// ============================================================================
// File I/O
// ============================================================================

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("engine.toml");
    let config = EngineConfig {
        sample_rate: SR,
        pool_blocks: 96,
        scope_samples: 512,
        filter_model: FilterModelName::Multimode,
        memory: MemoryConfig {
            large_bytes: 1 << 20,
            internal_bytes: 4096,
        },
    };
    config.save(&path).unwrap();
    assert!(path.exists());
    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_written_file_is_readable_toml() {
    let text = EngineConfig::default().to_toml_string().unwrap();
    assert!(text.contains("sample_rate = 44100"), "got:\n{text}");
    assert!(text.contains("filter_model = \"diode\""), "got:\n{text}");
    assert!(text.contains("[memory]"), "got:\n{text}");
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_load_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "pool_blocks = 4\n").unwrap();
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "pool_blocks", .. }));
}

#[test]
fn test_malformed_toml() {
    let err = EngineConfig::from_toml_str("sample_rate = = 3").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
}

// ============================================================================
// Engine construction
// ============================================================================

#[test]
fn test_config_builds_engine() {
    let config = EngineConfig::from_toml_str(
        r#"
        sample_rate = 48000
        filter_model = "moog"
        scope_samples = 1024
        "#,
    )
    .unwrap();
    let settings = config.settings();
    assert_eq!(settings.sample_rate, SR as f32);
    assert_eq!(settings.filter_model, FilterModel::Moog);

    let (mut synth, mut control) = Synth::new(&settings).unwrap();
    assert_eq!(control.scope().capacity(), 1024);
    control.note_on(57, 1.0);
    let mut peak = 0.0f32;
    for _ in 0..200 {
        peak = synth.tick().iter().fold(peak, |p, s| p.max(s.abs()));
    }
    assert!(peak > 0.01, "peak {peak}");
}
