//! The complete eight-voice synthesizer.
//!
//! [`Synth::new`] wires the whole graph once and splits the result in two:
//!
//! - [`Synth`] is the audio side. It owns the [`SignalGraph`] and is driven
//!   from the fixed-period tick.
//! - [`SynthControl`] is the control side. It owns the voice allocator and
//!   writes parameter cells; it never touches a block.
//!
//! The two share nothing but atomic cells and the scope, so they can live in
//! different execution contexts.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use polysub_core::nodes::{Mixer4, MixerGains, OutputBlock, OutputSink, Scope, ScopeTap};
use polysub_core::{
    ArenaError, ArenaPlan, AUDIO_BLOCK_SAMPLES, BlockPool, CellWrite, FloatBlock, GraphBuilder,
    GraphError, NoteDivision, ParamDescriptor, ParamId, ParameterInfo, PoolStats, SampleArena,
    SignalGraph, TempoSource, Transaction, note_to_hz,
};

use crate::allocator::{Allocation, MAX_NOTE, VoiceAllocator};
use crate::filter::FilterModel;
use crate::modulation::{ENV_CHANNEL, LfoDestination, LfoNode, route_writes, stage_lfo_route};
use crate::params::{PARAM_COUNT, ParamChange, SynthParam};
use crate::voice::{Patch, VoiceHandle, build_voice, mix};

/// Number of voices.
pub const VOICE_COUNT: usize = 8;

/// Voices summed by each bus mixer.
const VOICES_PER_BUS: usize = 4;

/// Link gain from a voice into its bus, so four full-scale voices stay in
/// range.
const VOICE_BUS_GAIN: f32 = 0.25;

/// Writes one [`ParamTransaction`] can hold: a whole preset.
pub const PARAM_TRANSACTION_CAPACITY: usize = PARAM_COUNT;

/// Key-tracking span: a full octave of offset per this many semitones from
/// middle C at 100 % tracking, once scaled by the filter's modulation range.
const KEY_TRACK_SEMITONES: f32 = 84.0;
const KEY_TRACK_CENTER: u8 = 60;

/// Construction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSettings {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Blocks in the shared pool.
    pub pool_blocks: usize,
    /// Samples held by the scope.
    pub scope_samples: usize,
    /// Filter model at startup.
    pub filter_model: FilterModel,
    /// Memory budget for long-lived sample buffers.
    pub arena: ArenaPlan,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            pool_blocks: 160,
            scope_samples: 2048,
            filter_model: FilterModel::Diode,
            arena: ArenaPlan::default(),
        }
    }
}

/// Construction failure. A running synth never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthError {
    /// The graph could not be wired.
    Graph(GraphError),
    /// A sample buffer did not fit the arena.
    Arena(ArenaError),
}

impl From<GraphError> for SynthError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<ArenaError> for SynthError {
    fn from(err: ArenaError) -> Self {
        Self::Arena(err)
    }
}

#[cfg(feature = "std")]
impl std::fmt::Display for SynthError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "graph wiring failed: {err}"),
            Self::Arena(err) => write!(f, "buffer placement failed: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Arena(err) => Some(err),
        }
    }
}

/// Audio side of the synth.
///
/// # Example
///
/// ```rust
/// use polysub_synth::{Synth, SynthParam, SynthSettings};
///
/// let (mut synth, mut control) = Synth::new(&SynthSettings::default()).unwrap();
/// control.set(SynthParam::Cutoff, 2000.0);
/// control.note_on(60, 1.0);
/// let block = synth.tick();
/// assert!(block.iter().all(|s| s.abs() <= 1.0));
/// ```
pub struct Synth {
    graph: SignalGraph,
    output: Arc<OutputBlock>,
    block: FloatBlock,
    sample_rate: f32,
}

impl Synth {
    /// Wire the graph and return both halves.
    pub fn new(settings: &SynthSettings) -> Result<(Self, SynthControl), SynthError> {
        let sample_rate = settings.sample_rate;
        let patch = Patch::new(settings.filter_model);
        let mut arena = SampleArena::new(settings.arena);
        let scope = Arc::new(Scope::new(arena.alloc_ring(settings.scope_samples)?));

        let mut builder = GraphBuilder::new();
        let lfo1 = builder.add_node(Box::new(LfoNode::new(Arc::clone(&patch.lfo[0]), sample_rate)))?;
        let lfo2 = builder.add_node(Box::new(LfoNode::new(Arc::clone(&patch.lfo[1]), sample_rate)))?;

        let mut voices = Vec::with_capacity(VOICE_COUNT);
        let mut voice_outputs = Vec::with_capacity(VOICE_COUNT);
        for index in 0..VOICE_COUNT {
            let (handle, output) = build_voice(&mut builder, &patch, [lfo1, lfo2], index, sample_rate)?;
            voices.push(handle);
            voice_outputs.push(output);
        }

        let mut buses = Vec::with_capacity(VOICE_COUNT / VOICES_PER_BUS);
        for group in voice_outputs.chunks(VOICES_PER_BUS) {
            let bus = builder.add_node(Box::new(Mixer4::new(Arc::new(MixerGains::unity()))))?;
            for (channel, &voice) in group.iter().enumerate() {
                builder.connect(voice, 0, bus, channel, VOICE_BUS_GAIN)?;
            }
            buses.push(bus);
        }
        let master = builder.add_node(Box::new(Mixer4::new(Arc::clone(&patch.master))))?;
        for (channel, &bus) in buses.iter().enumerate() {
            builder.connect(bus, 0, master, channel, 1.0)?;
        }

        let tap = builder.add_node(Box::new(ScopeTap::new(Arc::clone(&scope))))?;
        builder.connect(master, 0, tap, 0, 1.0)?;
        let output = Arc::new(OutputBlock::new());
        let sink = builder.add_node(Box::new(OutputSink::new(Arc::clone(&output))))?;
        builder.connect(master, 0, sink, 0, 1.0)?;

        let graph = builder.build(BlockPool::new(settings.pool_blocks));

        #[cfg(feature = "tracing")]
        tracing::info!(
            "synth_built: {} nodes, {} links, {} voices, pool {} blocks, {} Hz, filter {}",
            graph.node_count(),
            graph.link_count(),
            VOICE_COUNT,
            settings.pool_blocks,
            sample_rate,
            settings.filter_model.name()
        );

        let mut control = SynthControl {
            patch,
            voices,
            allocator: VoiceAllocator::new(),
            scope,
            values: [0.0; PARAM_COUNT],
        };
        for param in SynthParam::ALL {
            let value = match param {
                SynthParam::FilterModel => f32::from(settings.filter_model.index()),
                _ => param.descriptor().default,
            };
            control.set(param, value);
        }

        Ok((
            Self {
                graph,
                output,
                block: [0.0; AUDIO_BLOCK_SAMPLES],
                sample_rate,
            },
            control,
        ))
    }

    /// Run one sweep and return the rendered block.
    ///
    /// The sweep runs inside a critical section, so a committed transaction
    /// is seen either completely or not at all.
    pub fn tick(&mut self) -> &FloatBlock {
        let graph = &mut self.graph;
        critical_section::with(|_| graph.tick());
        self.output.read(&mut self.block);
        &self.block
    }

    /// Sample rate the graph runs at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Pool usage counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.graph.pool_stats()
    }

    /// Forget the pool high-water mark.
    pub fn reset_pool_peak(&mut self) {
        self.graph.reset_pool_peak();
    }

    /// The frozen graph, for inspection.
    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }
}

/// Control side of the synth: notes, parameters and routing.
pub struct SynthControl {
    patch: Patch,
    voices: Vec<VoiceHandle>,
    allocator: VoiceAllocator<VOICE_COUNT>,
    scope: Arc<Scope>,
    values: [f32; PARAM_COUNT],
}

impl SynthControl {
    /// Start `note` at `velocity` (`0.0..=1.0`).
    pub fn note_on(&mut self, note: u8, velocity: f32) -> Allocation {
        let note = note.min(MAX_NOTE);
        let allocation = self.allocator.note_on(note);
        #[cfg(feature = "tracing")]
        if let Allocation::Stolen {
            voice,
            previous_note,
        } = allocation
        {
            tracing::debug!("voice_steal: voice {voice} {previous_note} -> {note}");
        }
        let key_level = self.key_level(note);
        if let Some(voice) = self.voices.get(allocation.voice()) {
            voice.pitch.set(note_to_hz(f32::from(note)));
            voice.key_level.set(key_level);
            voice.gate.open(velocity);
        }
        allocation
    }

    /// Release `note`. Returns the voice it was playing on.
    pub fn note_off(&mut self, note: u8) -> Option<usize> {
        let voice = self.allocator.note_off(note)?;
        if let Some(handle) = self.voices.get(voice) {
            handle.gate.close();
        }
        Some(voice)
    }

    /// Release every voice. Returns how many were sounding.
    pub fn all_notes_off(&mut self) -> usize {
        let released = self.allocator.release_all();
        for voice in &self.voices {
            voice.gate.close();
        }
        released
    }

    /// Voices currently bound to a held note.
    pub fn sounding_voices(&self) -> usize {
        self.allocator.sounding_count()
    }

    /// Voice playing `note`, if any.
    pub fn voice_for(&self, note: u8) -> Option<usize> {
        self.allocator.voice_for(note)
    }

    /// Per-voice handles.
    pub fn voices(&self) -> &[VoiceHandle] {
        &self.voices
    }

    /// Capture of the master output.
    pub fn scope(&self) -> Arc<Scope> {
        Arc::clone(&self.scope)
    }

    /// Set a parameter. The value is clamped to its range; the stored value
    /// is returned, or `None` for an unknown id.
    pub fn set(&mut self, param: impl Into<ParamId>, value: f32) -> Option<f32> {
        let param = SynthParam::from_id(param.into())?;
        let value = param.descriptor().clamp(value);
        self.apply(param, value);
        self.values[param.index()] = value;
        Some(value)
    }

    /// Last value set for a parameter.
    pub fn get(&self, param: impl Into<ParamId>) -> Option<f32> {
        let param = SynthParam::from_id(param.into())?;
        Some(self.values[param.index()])
    }

    /// Move LFO `lfo` (0 or 1) to `destination` on every voice at once.
    ///
    /// Returns `false` for an unknown LFO.
    pub fn route_lfo(&mut self, lfo: usize, destination: LfoDestination) -> bool {
        let param = match lfo {
            0 => SynthParam::Lfo1Dest,
            1 => SynthParam::Lfo2Dest,
            _ => return false,
        };
        self.set(param, f32::from(destination.index())).is_some()
    }

    /// Retune LFO `lfo` to one `division` per cycle at the tempo `tempo`
    /// reports. Returns the rate set, clamped to the LFO range.
    pub fn sync_lfo_to_tempo(
        &mut self,
        lfo: usize,
        tempo: &dyn TempoSource,
        division: NoteDivision,
    ) -> Option<f32> {
        let param = match lfo {
            0 => SynthParam::Lfo1Rate,
            1 => SynthParam::Lfo2Rate,
            _ => return None,
        };
        let rate = self.set(param, tempo.division_to_hz(division))?;
        #[cfg(feature = "tracing")]
        tracing::debug!("lfo_tempo_sync: lfo {lfo} {division:?} at {} bpm -> {rate} Hz", tempo.bpm());
        Some(rate)
    }

    /// Start a batch of parameter writes that the tick sees all at once.
    pub fn transaction(&mut self) -> ParamTransaction<'_> {
        ParamTransaction {
            control: self,
            staged: Transaction::new(),
        }
    }

    fn key_level(&self, note: u8) -> f32 {
        let tracking = self.values[SynthParam::KeyTrack.index()];
        tracking * (f32::from(note) - f32::from(KEY_TRACK_CENTER)) / KEY_TRACK_SEMITONES
    }

    fn stage_route(&self, lfo: usize, destination: LfoDestination) {
        let mut tx: Transaction<CellWrite<'_>, { route_writes(VOICE_COUNT) }> = Transaction::new();
        if stage_lfo_route(&mut tx, self.voices.iter().map(|v| &v.bus), lfo, destination) {
            tx.apply();
            #[cfg(feature = "tracing")]
            tracing::debug!("lfo_route: lfo {} -> {}", lfo + 1, destination.name());
        }
    }

    fn apply(&mut self, param: SynthParam, value: f32) {
        let p = &self.patch;
        let choice = value as u8;
        match param {
            SynthParam::Osc1Wave => p.osc[0].waveform.set(choice),
            SynthParam::Osc1PulseWidth => p.osc[0].pulse_width.set(value),
            SynthParam::Osc1Tune => p.osc[0].semitones.set(value),
            SynthParam::Osc1Level => p.voice_mix.set(mix::OSC1, value),
            SynthParam::Osc2Wave => p.osc[1].waveform.set(choice),
            SynthParam::Osc2PulseWidth => p.osc[1].pulse_width.set(value),
            SynthParam::Osc2Tune => p.osc[1].semitones.set(value),
            SynthParam::Osc2Detune => p.osc[1].detune.set(value),
            SynthParam::Osc2Level => p.voice_mix.set(mix::OSC2, value),
            SynthParam::SubLevel => p.voice_mix.set(mix::SUB, value),
            SynthParam::NoiseLevel => p.voice_mix.set(mix::NOISE, value),
            SynthParam::Ring1Level => p.ring_mix.set(mix::RING1, value),
            SynthParam::Ring2Level => p.ring_mix.set(mix::RING2, value),
            SynthParam::FilterModel => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "filter_model: {} -> {}",
                    FilterModel::from_index(self.values[param.index()] as u8).name(),
                    FilterModel::from_index(choice).name()
                );
                p.filter.model.set(choice);
            }
            SynthParam::Cutoff => p.filter.cutoff.set(value),
            SynthParam::Resonance => p.filter.resonance.set(value),
            SynthParam::FilterEnvAmount => {
                for voice in &self.voices {
                    voice.bus.cutoff.set(ENV_CHANNEL, value);
                }
            }
            SynthParam::KeyTrack => {
                self.values[SynthParam::KeyTrack.index()] = value;
                for (index, voice) in self.voices.iter().enumerate() {
                    if let Some(slot) = self.allocator.slot(index) {
                        voice.key_level.set(self.key_level(slot.note));
                    }
                }
            }
            SynthParam::FilterPoles => p.filter.poles.set(if choice == 0 { 2 } else { 4 }),
            SynthParam::FilterMode => p.filter.mode.set(choice),
            SynthParam::FilterBlend => p.filter.blend.set(value),
            SynthParam::FilterBandpass => p.filter.bandpass.set(choice),
            SynthParam::FilterPush => p.filter.push.set(choice),
            SynthParam::HfCompensation => p.filter.hf_compensation.set(choice),
            SynthParam::AmpAttack => p.amp_env.attack_ms.set(value),
            SynthParam::AmpDecay => p.amp_env.decay_ms.set(value),
            SynthParam::AmpSustain => p.amp_env.sustain.set(value),
            SynthParam::AmpRelease => p.amp_env.release_ms.set(value),
            SynthParam::FilterAttack => p.filter_env.attack_ms.set(value),
            SynthParam::FilterDecay => p.filter_env.decay_ms.set(value),
            SynthParam::FilterSustain => p.filter_env.sustain.set(value),
            SynthParam::FilterRelease => p.filter_env.release_ms.set(value),
            SynthParam::Lfo1Rate => p.lfo[0].rate.set(value),
            SynthParam::Lfo1Wave => p.lfo[0].waveform.set(choice),
            SynthParam::Lfo1Depth => p.lfo[0].depth.set(value),
            SynthParam::Lfo1Dest => self.stage_route(0, LfoDestination::from_index(choice)),
            SynthParam::Lfo2Rate => p.lfo[1].rate.set(value),
            SynthParam::Lfo2Wave => p.lfo[1].waveform.set(choice),
            SynthParam::Lfo2Depth => p.lfo[1].depth.set(value),
            SynthParam::Lfo2Dest => self.stage_route(1, LfoDestination::from_index(choice)),
            SynthParam::PitchEnvAmount => {
                for voice in &self.voices {
                    for mixer in &voice.bus.pitch {
                        mixer.set(ENV_CHANNEL, value);
                    }
                }
            }
            SynthParam::PwmEnvAmount => {
                for voice in &self.voices {
                    for mixer in &voice.bus.shape {
                        mixer.set(ENV_CHANNEL, value);
                    }
                }
            }
            SynthParam::MasterVolume => {
                p.master.set(0, value);
                p.master.set(1, value);
            }
        }
    }
}

impl ParameterInfo for SynthControl {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        SynthParam::ALL.get(index).map(|p| p.descriptor())
    }

    fn get_param(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if let Some(&param) = SynthParam::ALL.get(index) {
            self.set(param, value);
        }
    }
}

/// A batch of parameter writes committed in one critical section.
///
/// Dropping the batch without [`commit`](Self::commit) discards it.
///
/// ```rust
/// use polysub_synth::{Synth, SynthParam, SynthSettings};
///
/// let (_synth, mut control) = Synth::new(&SynthSettings::default()).unwrap();
/// let mut tx = control.transaction();
/// tx.stage(SynthParam::Cutoff, 400.0);
/// tx.stage(SynthParam::Resonance, 0.9);
/// assert_eq!(tx.commit(), 2);
/// assert_eq!(control.get(SynthParam::Cutoff), Some(400.0));
/// ```
pub struct ParamTransaction<'a> {
    control: &'a mut SynthControl,
    staged: Transaction<ParamChange, PARAM_TRANSACTION_CAPACITY>,
}

impl ParamTransaction<'_> {
    /// Stage a write. Returns `false` for an unknown id or a full batch.
    pub fn stage(&mut self, param: impl Into<ParamId>, value: f32) -> bool {
        match SynthParam::from_id(param.into()) {
            Some(param) => self.staged.stage(ParamChange { param, value }),
            None => false,
        }
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Apply every staged write. Returns the number applied.
    pub fn commit(self) -> usize {
        let control = self.control;
        self.staged.commit(|change| {
            control.set(change.param, change.value);
        })
    }
}
