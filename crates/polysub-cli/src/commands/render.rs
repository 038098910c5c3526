//! Offline rendering to WAV.

use crate::commands::common::{CliFilterModel, find_param, parse_key_val, parse_notes};
use crate::wav::{mono_spec, write_wav};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use polysub_config::EngineConfig;
use polysub_core::AUDIO_BLOCK_SAMPLES;
use polysub_platform::ControlDispatcher;
use polysub_synth::{Synth, SynthControl};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// MIDI notes to hold, comma separated
    #[arg(short, long, default_value = "48,55,60,64")]
    notes: String,

    /// Seconds the notes are held
    #[arg(short, long, default_value = "2.0")]
    duration: f32,

    /// Seconds rendered after note-off
    #[arg(long, default_value = "1.0")]
    release: f32,

    /// Note velocity (0-1)
    #[arg(long, default_value = "0.8")]
    velocity: f32,

    /// Filter model (overrides the config)
    #[arg(short, long)]
    filter: Option<CliFilterModel>,

    /// Sample rate in Hz (overrides the config)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Parameter by id, e.g. "flt_cutoff=800"
    #[arg(long = "set", value_parser = parse_key_val, number_of_values = 1)]
    set: Vec<(String, String)>,

    /// Controller move through the CC map, e.g. "74=40"
    #[arg(long = "cc", value_parser = parse_key_val, number_of_values = 1)]
    cc: Vec<(String, String)>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "16")]
    bit_depth: u16,
}

pub fn run(args: RenderArgs, mut config: EngineConfig) -> anyhow::Result<()> {
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    config.validate()?;
    let mut settings = config.settings();
    if let Some(model) = args.filter {
        settings.filter_model = model.into();
    }
    if !(args.duration >= 0.0 && args.release >= 0.0) {
        anyhow::bail!("duration and release must be non-negative");
    }
    let spec = mono_spec(config.sample_rate, args.bit_depth)?;
    let notes = parse_notes(&args.notes).map_err(anyhow::Error::msg)?;

    let (mut synth, mut control) = Synth::new(&settings)?;
    apply_overrides(&mut control, &args.set, &args.cc)?;

    let hold_ticks = seconds_to_ticks(args.duration, settings.sample_rate);
    let release_ticks = seconds_to_ticks(args.release, settings.sample_rate);
    tracing::info!(
        sample_rate = config.sample_rate,
        filter = settings.filter_model.name(),
        pool_blocks = settings.pool_blocks,
        notes = ?notes,
        hold_ticks,
        release_ticks,
        "render config"
    );

    let pb = ProgressBar::new((hold_ticks + release_ticks) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks ({eta})")?
            .progress_chars("##-"),
    );

    let velocity = args.velocity.clamp(0.0, 1.0);
    for &note in &notes {
        control.note_on(note, velocity);
    }
    let mut output = Vec::with_capacity((hold_ticks + release_ticks) * AUDIO_BLOCK_SAMPLES);
    render_ticks(&mut synth, hold_ticks, &mut output, &pb);
    control.all_notes_off();
    render_ticks(&mut synth, release_ticks, &mut output, &pb);
    pb.finish_and_clear();

    let stats = synth.pool_stats();
    tracing::info!(
        capacity = stats.capacity,
        peak_in_use = stats.peak_in_use,
        exhaustion_count = stats.exhaustion_count,
        "pool stats"
    );
    if stats.exhaustion_count > 0 {
        tracing::warn!("block pool ran dry; raise pool_blocks in the config");
    }

    let peak = output.iter().fold(0.0f32, |p, s| p.max(s.abs()));
    println!(
        "Rendered {} samples ({:.2}s), peak {:.1} dB",
        output.len(),
        output.len() as f32 / settings.sample_rate,
        linear_to_db(peak)
    );

    write_wav(&args.output, &output, spec)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn apply_overrides(
    control: &mut SynthControl,
    set: &[(String, String)],
    cc: &[(String, String)],
) -> anyhow::Result<()> {
    for (key, value) in set {
        let param = find_param(key).with_context(|| format!("unknown parameter '{key}'"))?;
        let value: f32 = value
            .parse()
            .with_context(|| format!("invalid value for '{key}': '{value}'"))?;
        if let Some(stored) = control.set(param, value) {
            tracing::debug!(param = key.as_str(), value = stored, "parameter set");
        }
    }
    let dispatcher = ControlDispatcher::default();
    for (number, value) in cc {
        let number: u8 = number
            .parse()
            .with_context(|| format!("invalid controller number '{number}'"))?;
        let value: u8 = value
            .parse()
            .with_context(|| format!("invalid controller value '{value}'"))?;
        let change = dispatcher
            .handle(control, number, value)
            .with_context(|| format!("controller {number} is not mapped"))?;
        tracing::debug!(cc = number, param = ?change.param, value = change.value, "controller applied");
    }
    Ok(())
}

fn render_ticks(synth: &mut Synth, ticks: usize, output: &mut Vec<f32>, pb: &ProgressBar) {
    for _ in 0..ticks {
        output.extend_from_slice(synth.tick());
        pb.inc(1);
    }
}

fn seconds_to_ticks(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate / AUDIO_BLOCK_SAMPLES as f32).ceil() as usize
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_ticks_rounds_up() {
        assert_eq!(seconds_to_ticks(0.0, 44100.0), 0);
        assert_eq!(seconds_to_ticks(1.0, 44100.0), 345);
    }
}
