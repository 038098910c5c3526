//! Criterion benchmarks for the filter cores, oscillators and the full
//! engine tick.
//!
//! Run with: `cargo bench -p polysub-synth`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polysub_core::{AUDIO_BLOCK_SAMPLES, FloatBlock};
use polysub_synth::{
    DiodeLadder, FilterCore, FilterModel, MoogLadder, Multimode, MultimodeTopology, Oscillator,
    OscillatorWaveform, Synth, SynthParam, SynthSettings,
};

const SAMPLE_RATE: f32 = 44100.0;
const ZERO: FloatBlock = [0.0; AUDIO_BLOCK_SAMPLES];

fn saw_block() -> FloatBlock {
    let mut osc = Oscillator::new(SAMPLE_RATE);
    osc.set_frequency(110.0);
    core::array::from_fn(|_| 0.5 * osc.advance())
}

// ============================================================================
// Filter cores
// ============================================================================

fn bench_filter_cores(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/block");
    let input = saw_block();
    let mut cores: Vec<(&str, Box<dyn FilterCore>)> = vec![
        ("diode", Box::new(DiodeLadder::new(SAMPLE_RATE))),
        ("moog", Box::new(MoogLadder::new(SAMPLE_RATE))),
        ("multimode4", Box::new(Multimode::new(SAMPLE_RATE))),
        ("multimode2", {
            let mut core = Multimode::new(SAMPLE_RATE);
            core.set_topology(MultimodeTopology::TwoPole);
            Box::new(core)
        }),
    ];
    for (name, core) in &mut cores {
        for resonance in [0.0f32, 0.9] {
            core.set_cutoff(1200.0);
            core.set_resonance(resonance);
            core.reset();
            let mut out = ZERO;
            group.bench_with_input(
                BenchmarkId::new(*name, format!("res{resonance}")),
                &resonance,
                |b, _| {
                    b.iter(|| {
                        core.process_block(black_box(&input), &ZERO, &ZERO, &mut out);
                        black_box(out[AUDIO_BLOCK_SAMPLES - 1])
                    })
                },
            );
        }
    }
    group.finish();
}

// ============================================================================
// Oscillators
// ============================================================================

fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("oscillator/block");
    for (name, waveform) in [
        ("saw", OscillatorWaveform::Saw),
        ("pulse", OscillatorWaveform::Pulse),
        ("triangle", OscillatorWaveform::Triangle),
        ("noise", OscillatorWaveform::Noise),
    ] {
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.set_frequency(440.0);
        osc.set_waveform(waveform);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..AUDIO_BLOCK_SAMPLES {
                    sum += osc.advance();
                }
                black_box(sum)
            })
        });
    }
    group.finish();
}

// ============================================================================
// Full engine
// ============================================================================

fn bench_synth_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/tick");
    for model in FilterModel::ALL {
        let settings = SynthSettings {
            filter_model: model,
            ..SynthSettings::default()
        };
        let (mut synth, mut control) = Synth::new(&settings).unwrap();
        control.set(SynthParam::Lfo1Depth, 0.3);
        control.set(SynthParam::SubLevel, 0.3);
        for note in [36, 43, 48, 52, 55, 60, 64, 67] {
            control.note_on(note, 0.9);
        }
        group.bench_function(BenchmarkId::new("eight_voices", model.name()), |b| {
            b.iter(|| black_box(synth.tick()[0]))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_filter_cores, bench_oscillator, bench_synth_tick);
criterion_main!(benches);
