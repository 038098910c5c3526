//! Graph node wrapping one filter core per voice.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use polysub_core::{AUDIO_BLOCK_SAMPLES, ChoiceCell, FloatBlock, NodeIo, ParamCell, SignalNode};

use super::{
    DiodeLadder, FilterCore, FilterModel, MoogLadder, Multimode, MultimodeTopology, XpanderMode,
};

/// Octaves of cutoff shift per unit of cutoff modulation input.
pub const FILTER_MOD_OCTAVES: f32 = 7.0;

/// Filter settings shared by every voice's [`FilterNode`].
///
/// Toggles are stored as `0`/`1` in [`ChoiceCell`]s.
#[derive(Debug)]
pub struct FilterParams {
    /// [`FilterModel`] index.
    pub model: ChoiceCell,
    /// Base cutoff in Hz.
    pub cutoff: ParamCell,
    /// Resonance, `0.0..=1.0`.
    pub resonance: ParamCell,
    /// Multimode pole count, 2 or 4.
    pub poles: ChoiceCell,
    /// Multimode [`XpanderMode`] index.
    pub mode: ChoiceCell,
    /// Multimode 2-pole LP→HP blend.
    pub blend: ParamCell,
    /// Multimode 2-pole band-pass routing.
    pub bandpass: ChoiceCell,
    /// Multimode 2-pole push.
    pub push: ChoiceCell,
    /// Moog HF compensation.
    pub hf_compensation: ChoiceCell,
}

impl FilterParams {
    /// Defaults for `model`: 1 kHz, no resonance, 4-pole LP4.
    pub const fn new(model: FilterModel) -> Self {
        Self {
            model: ChoiceCell::new(model as u8),
            cutoff: ParamCell::new(1000.0),
            resonance: ParamCell::new(0.0),
            poles: ChoiceCell::new(4),
            mode: ChoiceCell::new(0),
            blend: ParamCell::new(0.0),
            bandpass: ChoiceCell::new(0),
            push: ChoiceCell::new(0),
            hf_compensation: ChoiceCell::new(1),
        }
    }

    /// Currently selected model.
    pub fn model(&self) -> FilterModel {
        FilterModel::from_index(self.model.get())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new(FilterModel::default())
    }
}

enum Core {
    Diode(DiodeLadder),
    Moog(MoogLadder),
    Multimode(Multimode),
}

impl Core {
    fn new(model: FilterModel, sample_rate: f32) -> Self {
        match model {
            FilterModel::Diode => Self::Diode(DiodeLadder::new(sample_rate)),
            FilterModel::Moog => Self::Moog(MoogLadder::new(sample_rate)),
            FilterModel::Multimode => Self::Multimode(Multimode::new(sample_rate)),
        }
    }

    fn as_dyn(&mut self) -> &mut dyn FilterCore {
        match self {
            Self::Diode(core) => core,
            Self::Moog(core) => core,
            Self::Multimode(core) => core,
        }
    }

    fn as_dyn_ref(&self) -> &dyn FilterCore {
        match self {
            Self::Diode(core) => core,
            Self::Moog(core) => core,
            Self::Multimode(core) => core,
        }
    }
}

/// Voice filter.
///
/// Inputs: 0 audio, 1 cutoff modulation (±1 = ±[`FILTER_MOD_OCTAVES`]),
/// 2 resonance modulation. Output 0 is the filtered audio.
///
/// The core keeps running when the audio input is silent, so a resonant tail
/// rings out after the note's oscillators stop. Selecting a different model
/// replaces the core with a fresh one.
pub struct FilterNode {
    params: Arc<FilterParams>,
    sample_rate: f32,
    model: FilterModel,
    core: Core,
    audio: FloatBlock,
    cutoff_mod: FloatBlock,
    resonance_mod: FloatBlock,
    out: FloatBlock,
}

impl FilterNode {
    /// Node for `params` at `sample_rate`.
    pub fn new(params: Arc<FilterParams>, sample_rate: f32) -> Self {
        let model = params.model();
        let mut node = Self {
            params,
            sample_rate,
            model,
            core: Core::new(model, sample_rate),
            audio: [0.0; AUDIO_BLOCK_SAMPLES],
            cutoff_mod: [0.0; AUDIO_BLOCK_SAMPLES],
            resonance_mod: [0.0; AUDIO_BLOCK_SAMPLES],
            out: [0.0; AUDIO_BLOCK_SAMPLES],
        };
        node.apply_params();
        node.core.as_dyn().reset();
        node
    }

    /// Model currently running.
    pub fn model(&self) -> FilterModel {
        self.model
    }

    /// Guard trips of the running core.
    pub fn guard_trips(&self) -> u32 {
        self.core.as_dyn_ref().guard().trip_count()
    }

    fn apply_params(&mut self) {
        let params = &*self.params;
        match &mut self.core {
            Core::Diode(_) => {}
            Core::Moog(core) => core.set_hf_compensation(params.hf_compensation.get() != 0),
            Core::Multimode(core) => {
                core.set_topology(MultimodeTopology::from_poles(params.poles.get()));
                core.set_mode(XpanderMode::from_index(params.mode.get()));
                core.set_blend(params.blend.get());
                core.set_bandpass(params.bandpass.get() != 0);
                core.set_push(params.push.get() != 0);
            }
        }
        let core = self.core.as_dyn();
        core.set_cutoff(params.cutoff.get());
        core.set_resonance(params.resonance.get());
    }
}

impl SignalNode for FilterNode {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn inputs(&self) -> usize {
        3
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        let model = self.params.model();
        if model != self.model {
            self.model = model;
            self.core = Core::new(model, self.sample_rate);
            self.apply_params();
            self.core.as_dyn().reset();
        } else {
            self.apply_params();
        }

        io.receive_samples(0, &mut self.audio);
        if io.receive_samples(1, &mut self.cutoff_mod) {
            for m in &mut self.cutoff_mod {
                *m *= FILTER_MOD_OCTAVES;
            }
        }
        io.receive_samples(2, &mut self.resonance_mod);

        self.core
            .as_dyn()
            .process_block(&self.audio, &self.cutoff_mod, &self.resonance_mod, &mut self.out);

        // Below one LSB the block would quantize to silence anyway.
        if self.out.iter().any(|y| y.abs() >= 0.5 / 32767.0) {
            io.transmit_samples(0, &self.out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysub_core::nodes::{DcSource, OutputBlock, OutputSink};
    use polysub_core::{BlockPool, GraphBuilder};

    const SR: f32 = 44100.0;

    fn rig(params: &Arc<FilterParams>, level: f32) -> (polysub_core::SignalGraph, Arc<OutputBlock>) {
        let mut builder = GraphBuilder::new();
        let dc = builder
            .add_node(Box::new(DcSource::new(Arc::new(ParamCell::new(level)))))
            .unwrap();
        let filter = builder
            .add_node(Box::new(FilterNode::new(Arc::clone(params), SR)))
            .unwrap();
        let out = Arc::new(OutputBlock::new());
        let sink = builder
            .add_node(Box::new(OutputSink::new(Arc::clone(&out))))
            .unwrap();
        builder.connect(dc, 0, filter, 0, 1.0).unwrap();
        builder.connect(filter, 0, sink, 0, 1.0).unwrap();
        (builder.build(BlockPool::new(8)), out)
    }

    #[test]
    fn test_dc_passes_every_model() {
        for model in FilterModel::ALL {
            let params = Arc::new(FilterParams::new(model));
            params.cutoff.set(2000.0);
            let (mut graph, out) = rig(&params, 0.2);
            for _ in 0..200 {
                graph.tick();
            }
            let mut samples = [0.0; AUDIO_BLOCK_SAMPLES];
            out.read(&mut samples);
            assert!(
                (samples[127] - 0.2).abs() < 0.02,
                "{} dc {}",
                model.name(),
                samples[127]
            );
        }
    }

    #[test]
    fn test_model_switch_at_runtime() {
        let params = Arc::new(FilterParams::new(FilterModel::Diode));
        params.resonance.set(0.9);
        let (mut graph, out) = rig(&params, 0.5);
        let mut samples = [0.0; AUDIO_BLOCK_SAMPLES];
        for model in [FilterModel::Moog, FilterModel::Multimode, FilterModel::Diode] {
            for _ in 0..50 {
                graph.tick();
            }
            params.model.set(model.index());
            graph.tick();
            out.read(&mut samples);
            assert!(samples.iter().all(|y| y.is_finite() && y.abs() <= 1.0));
        }
        assert_eq!(graph.pool_stats().in_use, 0);
    }

    #[test]
    fn test_silent_filter_sends_nothing() {
        let params = Arc::new(FilterParams::default());
        let (mut graph, out) = rig(&params, 0.0);
        graph.tick();
        let mut samples = [1.0; AUDIO_BLOCK_SAMPLES];
        out.read(&mut samples);
        assert!(samples.iter().all(|&y| y == 0.0));
        assert_eq!(graph.pool_stats().peak_in_use, 0);
    }
}
