//! One synth voice as a block of graph nodes.
//!
//! Every voice is the same chain, wired once at startup:
//!
//! ```text
//!  key DC ────────────────────────────────────────────┐
//!  fenv DC ─ filter env ─┬─ freq/shape mixers ┐       │
//!                        └────────────────────┼─ cutoff mixer ┐
//!  LFO 1/2 ─────────────── freq/shape mixers ─┘               │
//!  osc1, osc2, sub, noise ─ mix A ─┐                          │
//!  ring1 (osc1·osc2) ──────────────┼─ mix B ──────────── filter ─ VCA ─ amp env ─▶
//!  ring2 (sub·osc2) ───────────────┘                    LFO 1/2 ─ amp mixer ┘
//! ```
//!
//! Shared settings live in [`Patch`]; what differs per voice (pitch, gate,
//! key tracking, modulation gains) lives in its [`VoiceHandle`].

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, sync::Arc};
#[cfg(feature = "std")]
use std::sync::Arc;

use polysub_core::nodes::{DcSource, Mixer4, MixerGains, Multiply};
use polysub_core::{GateCell, GraphBuilder, GraphError, NodeId, ParamCell};

use crate::envelope::{EnvelopeNode, EnvelopeParams};
use crate::filter::{FilterModel, FilterNode, FilterParams};
use crate::modulation::{
    ENV_CHANNEL, KEY_CHANNEL, LFO_COUNT, LfoParams, ModulationBus, lfo_channel,
};
use crate::oscillator::{NoiseNode, OscParams, OscillatorNode, OscillatorWaveform};

/// Channel of [`Patch::voice_mix`] for each source.
pub mod mix {
    /// Oscillator 1.
    pub const OSC1: usize = 0;
    /// Oscillator 2.
    pub const OSC2: usize = 1;
    /// Sub oscillator.
    pub const SUB: usize = 2;
    /// Noise.
    pub const NOISE: usize = 3;
    /// Ring 1 on [`Patch::ring_mix`](super::Patch::ring_mix).
    pub const RING1: usize = 1;
    /// Ring 2 on [`Patch::ring_mix`](super::Patch::ring_mix).
    pub const RING2: usize = 2;
}

/// Settings shared by every voice.
#[derive(Debug)]
pub struct Patch {
    /// Oscillators 1 and 2. The sub follows oscillator 1's tuning.
    pub osc: [Arc<OscParams>; 2],
    /// Filter.
    pub filter: Arc<FilterParams>,
    /// Amplitude envelope.
    pub amp_env: Arc<EnvelopeParams>,
    /// Filter envelope.
    pub filter_env: Arc<EnvelopeParams>,
    /// The two global LFOs.
    pub lfo: [Arc<LfoParams>; LFO_COUNT],
    /// Source levels into mix A (see [`mix`]).
    pub voice_mix: Arc<MixerGains>,
    /// Mix A (channel 0, fixed at 1.0) plus the ring modulator levels.
    pub ring_mix: Arc<MixerGains>,
    /// Output level on both bus channels.
    pub master: Arc<MixerGains>,
    /// Constant fed into the filter envelope.
    pub fenv_level: Arc<ParamCell>,
}

impl Patch {
    /// Silent patch running `model`; the control side fills in the rest.
    pub fn new(model: FilterModel) -> Self {
        Self {
            osc: [
                Arc::new(OscParams::new(OscillatorWaveform::Saw)),
                Arc::new(OscParams::new(OscillatorWaveform::Saw)),
            ],
            filter: Arc::new(FilterParams::new(model)),
            amp_env: Arc::new(EnvelopeParams::default()),
            filter_env: Arc::new(EnvelopeParams::default()),
            lfo: [Arc::new(LfoParams::new(2.0)), Arc::new(LfoParams::new(5.0))],
            voice_mix: Arc::new(MixerGains::silent()),
            ring_mix: Arc::new(MixerGains::new([1.0, 0.0, 0.0, 0.0])),
            master: Arc::new(MixerGains::silent()),
            fenv_level: Arc::new(ParamCell::new(1.0)),
        }
    }
}

/// Control-side handle on one voice.
#[derive(Debug)]
pub struct VoiceHandle {
    /// Note frequency in Hz.
    pub pitch: Arc<ParamCell>,
    /// Note gate shared by both envelopes.
    pub gate: Arc<GateCell>,
    /// Key-tracking offset on the cutoff mixer.
    pub key_level: Arc<ParamCell>,
    /// Modulation mixer gains.
    pub bus: ModulationBus,
}

impl VoiceHandle {
    fn new() -> Self {
        let bus = ModulationBus::new();
        bus.cutoff.set(KEY_CHANNEL, 1.0);
        Self {
            pitch: Arc::new(ParamCell::new(261.63)),
            gate: Arc::new(GateCell::new()),
            key_level: Arc::new(ParamCell::new(0.0)),
            bus,
        }
    }
}

/// Register one voice's nodes after the LFOs.
///
/// Returns the handle and the node carrying the voice's output.
pub fn build_voice(
    builder: &mut GraphBuilder,
    patch: &Patch,
    lfos: [NodeId; LFO_COUNT],
    index: usize,
    sample_rate: f32,
) -> Result<(VoiceHandle, NodeId), GraphError> {
    let handle = VoiceHandle::new();
    let bus = &handle.bus;

    let key = builder.add_node(Box::new(DcSource::new(Arc::clone(&handle.key_level))))?;
    let fenv_dc = builder.add_node(Box::new(DcSource::new(Arc::clone(&patch.fenv_level))))?;
    let fenv = builder.add_node(Box::new(EnvelopeNode::new(
        Arc::clone(&patch.filter_env),
        Arc::clone(&handle.gate),
        sample_rate,
    )))?;
    builder.connect(fenv_dc, 0, fenv, 0, 1.0)?;

    // LFO 1 and 2 plus the filter envelope into each modulation mixer.
    let mod_mixer = |builder: &mut GraphBuilder, gains: &Arc<MixerGains>| {
        let node = builder.add_node(Box::new(Mixer4::new(Arc::clone(gains))))?;
        for (lfo, &source) in lfos.iter().enumerate() {
            builder.connect(source, 0, node, lfo_channel(lfo), 1.0)?;
        }
        builder.connect(fenv, 0, node, ENV_CHANNEL, 1.0)?;
        Ok::<_, GraphError>(node)
    };
    let freq1 = mod_mixer(builder, &bus.pitch[0])?;
    let freq2 = mod_mixer(builder, &bus.pitch[1])?;
    let shape1 = mod_mixer(builder, &bus.shape[0])?;
    let shape2 = mod_mixer(builder, &bus.shape[1])?;

    let osc1 = builder.add_node(Box::new(OscillatorNode::new(
        Arc::clone(&handle.pitch),
        Arc::clone(&patch.osc[0]),
        sample_rate,
    )))?;
    builder.connect(freq1, 0, osc1, 0, 1.0)?;
    builder.connect(shape1, 0, osc1, 1, 1.0)?;
    let osc2 = builder.add_node(Box::new(OscillatorNode::new(
        Arc::clone(&handle.pitch),
        Arc::clone(&patch.osc[1]),
        sample_rate,
    )))?;
    builder.connect(freq2, 0, osc2, 0, 1.0)?;
    builder.connect(shape2, 0, osc2, 1, 1.0)?;
    let sub = builder.add_node(Box::new(OscillatorNode::sub(
        Arc::clone(&handle.pitch),
        Arc::clone(&patch.osc[0]),
        sample_rate,
    )))?;
    builder.connect(freq1, 0, sub, 0, 1.0)?;
    let seed = 0x9E37_79B9u32.wrapping_mul(index as u32 + 1);
    let noise = builder.add_node(Box::new(NoiseNode::new(seed)))?;

    let ring1 = builder.add_node(Box::new(Multiply::ring()))?;
    builder.connect(osc1, 0, ring1, 0, 1.0)?;
    builder.connect(osc2, 0, ring1, 1, 1.0)?;
    let ring2 = builder.add_node(Box::new(Multiply::ring()))?;
    builder.connect(sub, 0, ring2, 0, 1.0)?;
    builder.connect(osc2, 0, ring2, 1, 1.0)?;

    let mix_a = builder.add_node(Box::new(Mixer4::new(Arc::clone(&patch.voice_mix))))?;
    builder.connect(osc1, 0, mix_a, mix::OSC1, 1.0)?;
    builder.connect(osc2, 0, mix_a, mix::OSC2, 1.0)?;
    builder.connect(sub, 0, mix_a, mix::SUB, 1.0)?;
    builder.connect(noise, 0, mix_a, mix::NOISE, 1.0)?;
    let mix_b = builder.add_node(Box::new(Mixer4::new(Arc::clone(&patch.ring_mix))))?;
    builder.connect(mix_a, 0, mix_b, 0, 1.0)?;
    builder.connect(ring1, 0, mix_b, mix::RING1, 1.0)?;
    builder.connect(ring2, 0, mix_b, mix::RING2, 1.0)?;

    let cutoff = builder.add_node(Box::new(Mixer4::new(Arc::clone(&bus.cutoff))))?;
    for (lfo, &source) in lfos.iter().enumerate() {
        builder.connect(source, 0, cutoff, lfo_channel(lfo), 1.0)?;
    }
    builder.connect(fenv, 0, cutoff, ENV_CHANNEL, 1.0)?;
    builder.connect(key, 0, cutoff, KEY_CHANNEL, 1.0)?;

    let filter = builder.add_node(Box::new(FilterNode::new(
        Arc::clone(&patch.filter),
        sample_rate,
    )))?;
    builder.connect(mix_b, 0, filter, 0, 1.0)?;
    builder.connect(cutoff, 0, filter, 1, 1.0)?;

    let amp = builder.add_node(Box::new(Mixer4::new(Arc::clone(&bus.amp))))?;
    for (lfo, &source) in lfos.iter().enumerate() {
        builder.connect(source, 0, amp, lfo_channel(lfo), 1.0)?;
    }
    let vca = builder.add_node(Box::new(Multiply::with_bias(1.0)))?;
    builder.connect(filter, 0, vca, 0, 1.0)?;
    builder.connect(amp, 0, vca, 1, 1.0)?;

    let amp_env = builder.add_node(Box::new(
        EnvelopeNode::new(
            Arc::clone(&patch.amp_env),
            Arc::clone(&handle.gate),
            sample_rate,
        )
        .with_velocity(),
    ))?;
    builder.connect(vca, 0, amp_env, 0, 1.0)?;

    Ok((handle, amp_env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::LfoNode;
    use polysub_core::nodes::{OutputBlock, OutputSink};
    use polysub_core::{AUDIO_BLOCK_SAMPLES, BlockPool};

    const SR: f32 = 44100.0;

    fn single_voice() -> (Patch, VoiceHandle, polysub_core::SignalGraph, Arc<OutputBlock>) {
        let patch = Patch::new(FilterModel::Diode);
        patch.voice_mix.set(mix::OSC1, 0.5);
        patch.filter.cutoff.set(5000.0);
        patch.amp_env.attack_ms.set(1.0);
        patch.amp_env.sustain.set(1.0);
        let mut builder = GraphBuilder::new();
        let lfo1 = builder
            .add_node(Box::new(LfoNode::new(Arc::clone(&patch.lfo[0]), SR)))
            .unwrap();
        let lfo2 = builder
            .add_node(Box::new(LfoNode::new(Arc::clone(&patch.lfo[1]), SR)))
            .unwrap();
        let (handle, out_node) = build_voice(&mut builder, &patch, [lfo1, lfo2], 0, SR).unwrap();
        let out = Arc::new(OutputBlock::new());
        let sink = builder
            .add_node(Box::new(OutputSink::new(Arc::clone(&out))))
            .unwrap();
        builder.connect(out_node, 0, sink, 0, 1.0).unwrap();
        (patch, handle, builder.build(BlockPool::new(64)), out)
    }

    fn block_peak(out: &OutputBlock) -> f32 {
        let mut block = [0.0f32; AUDIO_BLOCK_SAMPLES];
        out.read(&mut block);
        block.iter().fold(0.0f32, |m, x| m.max(x.abs()))
    }

    #[test]
    fn test_voice_node_count() {
        let (_patch, _handle, graph, _out) = single_voice();
        // Two LFOs, twenty voice nodes, one sink.
        assert_eq!(graph.node_count(), 23);
    }

    #[test]
    fn test_idle_voice_is_silent() {
        let (_patch, _handle, mut graph, out) = single_voice();
        for _ in 0..10 {
            graph.tick();
        }
        assert_eq!(block_peak(&out), 0.0);
        assert_eq!(graph.pool_stats().in_use, 0);
    }

    #[test]
    fn test_gate_makes_sound_and_release_silences() {
        let (patch, handle, mut graph, out) = single_voice();
        patch.amp_env.release_ms.set(5.0);
        handle.pitch.set(220.0);
        handle.gate.open(1.0);
        let mut peak = 0.0f32;
        for _ in 0..20 {
            graph.tick();
            peak = peak.max(block_peak(&out));
        }
        assert!(peak > 0.05, "peak = {peak}");
        assert!(peak <= 1.0);

        handle.gate.close();
        for _ in 0..200 {
            graph.tick();
        }
        assert_eq!(block_peak(&out), 0.0);
        assert_eq!(graph.pool_stats().in_use, 0);
    }

    #[test]
    fn test_key_channel_open_by_default() {
        let handle = VoiceHandle::new();
        assert_eq!(handle.bus.cutoff.get(KEY_CHANNEL), 1.0);
        assert_eq!(handle.bus.cutoff.get(ENV_CHANNEL), 0.0);
    }
}
