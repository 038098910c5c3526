//! Integration tests for the `polysub` binary.

use std::process::Command;
use tempfile::TempDir;

const SR: u32 = 32_000;

/// The `polysub` binary built by cargo, isolated from any user config.
fn polysub_bin(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_polysub"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("RUST_LOG", "warn");
    cmd
}

// ============================================================================
// render
// ============================================================================

#[test]
fn test_render_writes_audible_wav() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("chord.wav");
    let output = polysub_bin(&dir)
        .args(["render", "--notes", "45,52,57", "--duration", "0.3", "--release", "0.1"])
        .args(["--sample-rate", &SR.to_string(), "--filter", "moog"])
        .args(["--set", "flt_cutoff=2500", "--cc", "71=20"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let reader = hound::WavReader::open(&out).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SR);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    let expected_ticks = (0.3f32 * SR as f32 / 128.0).ceil() as usize
        + (0.1f32 * SR as f32 / 128.0).ceil() as usize;
    assert_eq!(samples.len(), expected_ticks * 128);
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
    assert!(peak > 300, "peak {peak}");
}

#[test]
fn test_render_float_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("float.wav");
    let status = polysub_bin(&dir)
        .args(["render", "--duration", "0.1", "--release", "0", "--bit-depth", "32"])
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());
    let reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    for sample in reader.into_samples::<f32>() {
        let sample = sample.unwrap();
        assert!(sample.is_finite() && sample.abs() <= 1.0);
    }
}

#[test]
fn test_render_rejects_unknown_param() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir)
        .args(["render", "--duration", "0.1", "--set", "wobble=3"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown parameter 'wobble'"));
}

#[test]
fn test_render_rejects_unmapped_cc() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir)
        .args(["render", "--duration", "0.1", "--cc", "3=64"])
        .arg(dir.path().join("x.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("controller 3 is not mapped"));
}

// ============================================================================
// Listings
// ============================================================================

#[test]
fn test_params_lists_every_key() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir).arg("params").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for key in ["osc1_wave", "flt_cutoff", "flt_model", "amp_release", "master_volume"] {
        assert!(stdout.contains(key), "missing {key}");
    }
}

#[test]
fn test_params_group_filter() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir)
        .args(["params", "--group", "lfo"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lfo1_rate"));
    assert!(!stdout.contains("flt_cutoff"));
}

#[test]
fn test_cc_map_listing() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir).arg("cc-map").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("flt_cutoff"));
    assert!(stdout.contains("exponential 20 .. 10000"));
}

#[test]
fn test_cc_map_detail_unmapped() {
    let dir = TempDir::new().unwrap();
    let output = polysub_bin(&dir).args(["cc-map", "3"]).output().unwrap();
    assert!(!output.status.success());
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_dump_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "sample_rate = 48000\nfilter_model = \"multimode\"\n").unwrap();

    let output = polysub_bin(&dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "--write"])
        .arg(dir.path().join("copy.toml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sample_rate = 48000"));
    assert!(stdout.contains("filter_model = \"multimode\""));

    let copy = polysub_config::EngineConfig::load(dir.path().join("copy.toml")).unwrap();
    assert_eq!(copy.sample_rate, 48_000);
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "pool_blocks = 2\n").unwrap();
    let output = polysub_bin(&dir)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pool_blocks"));
}
