//! Modulation bus and LFO routing.
//!
//! Every voice has six [`Mixer4`](polysub_core::nodes::Mixer4) nodes that sum
//! modulation into one destination each. Their channels are fixed:
//!
//! | channel | source |
//! |---|---|
//! | [`LFO1_CHANNEL`] | global LFO 1 |
//! | [`LFO2_CHANNEL`] | global LFO 2 |
//! | [`ENV_CHANNEL`] | filter envelope |
//! | [`KEY_CHANNEL`] | key tracking (cutoff mixer only) |
//!
//! Each LFO feeds exactly one [`LfoDestination`]. Re-routing zeroes the
//! LFO's channel on every mixer of every voice and sets it to 1.0 on the
//! destination mixers, all in one transaction, so the audio tick never sees
//! a half-moved route.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use polysub_core::nodes::MixerGains;
use polysub_core::{
    AUDIO_BLOCK_SAMPLES, CellWrite, ChoiceCell, FloatBlock, Lfo, LfoWaveform, NodeIo, ParamCell,
    SignalNode, Transaction,
};

/// Mixer channel carrying LFO 1.
pub const LFO1_CHANNEL: usize = 0;
/// Mixer channel carrying LFO 2.
pub const LFO2_CHANNEL: usize = 1;
/// Mixer channel carrying the filter envelope.
pub const ENV_CHANNEL: usize = 2;
/// Mixer channel carrying key tracking.
pub const KEY_CHANNEL: usize = 3;

/// Number of global LFOs.
pub const LFO_COUNT: usize = 2;

/// Mixers per voice on the bus.
pub const BUS_MIXERS: usize = 6;

/// Cell writes needed to re-route one LFO across `voices` voices.
pub const fn route_writes(voices: usize) -> usize {
    voices * BUS_MIXERS + voices * 2
}

/// Where an LFO's output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LfoDestination {
    /// Both oscillator frequencies.
    Pitch,
    /// Filter cutoff.
    #[default]
    Filter,
    /// Both oscillator pulse widths.
    Shape,
    /// Voice amplitude (tremolo).
    Amplitude,
}

impl LfoDestination {
    /// All destinations in choice-index order.
    pub const ALL: [Self; 4] = [Self::Pitch, Self::Filter, Self::Shape, Self::Amplitude];

    /// Destination for a stored choice index; out of range means filter.
    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    /// Choice index.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Filter => "filter",
            Self::Shape => "shape",
            Self::Amplitude => "amplitude",
        }
    }
}

/// Channel of LFO `lfo` (0 or 1) on the bus mixers.
#[inline]
pub fn lfo_channel(lfo: usize) -> usize {
    if lfo == 0 { LFO1_CHANNEL } else { LFO2_CHANNEL }
}

/// Gains of one voice's modulation mixers.
#[derive(Debug)]
pub struct ModulationBus {
    /// Oscillator 1 and 2 frequency.
    pub pitch: [Arc<MixerGains>; 2],
    /// Oscillator 1 and 2 pulse width.
    pub shape: [Arc<MixerGains>; 2],
    /// Filter cutoff.
    pub cutoff: Arc<MixerGains>,
    /// Amplitude.
    pub amp: Arc<MixerGains>,
}

impl ModulationBus {
    /// All gains zero.
    pub fn new() -> Self {
        Self {
            pitch: [Arc::new(MixerGains::silent()), Arc::new(MixerGains::silent())],
            shape: [Arc::new(MixerGains::silent()), Arc::new(MixerGains::silent())],
            cutoff: Arc::new(MixerGains::silent()),
            amp: Arc::new(MixerGains::silent()),
        }
    }

    /// Every mixer on the bus.
    pub fn mixers(&self) -> [&MixerGains; BUS_MIXERS] {
        [
            &self.pitch[0],
            &self.pitch[1],
            &self.shape[0],
            &self.shape[1],
            &self.cutoff,
            &self.amp,
        ]
    }

    /// Mixers fed by an LFO routed to `destination`.
    pub fn destination_mixers(&self, destination: LfoDestination) -> [Option<&MixerGains>; 2] {
        match destination {
            LfoDestination::Pitch => [Some(&self.pitch[0]), Some(&self.pitch[1])],
            LfoDestination::Shape => [Some(&self.shape[0]), Some(&self.shape[1])],
            LfoDestination::Filter => [Some(&self.cutoff), None],
            LfoDestination::Amplitude => [Some(&self.amp), None],
        }
    }

    /// Destination currently carrying LFO `lfo`, if any.
    pub fn routed_destination(&self, lfo: usize) -> Option<LfoDestination> {
        let channel = lfo_channel(lfo);
        LfoDestination::ALL.into_iter().find(|&dest| {
            self.destination_mixers(dest)
                .into_iter()
                .flatten()
                .all(|mixer| mixer.get(channel) != 0.0)
        })
    }
}

impl Default for ModulationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage the writes that move LFO `lfo` to `destination` on every bus.
///
/// Returns `false` if the transaction ran out of room; it must then be
/// dropped rather than committed.
pub fn stage_lfo_route<'a, I, const N: usize>(
    tx: &mut Transaction<CellWrite<'a>, N>,
    buses: I,
    lfo: usize,
    destination: LfoDestination,
) -> bool
where
    I: IntoIterator<Item = &'a ModulationBus> + Clone,
{
    let channel = lfo_channel(lfo);
    let mut ok = true;
    for bus in buses.clone() {
        for mixer in bus.mixers() {
            if let Some(cell) = mixer.cell(channel) {
                ok &= tx.set(cell, 0.0);
            }
        }
    }
    for bus in buses {
        for mixer in bus.destination_mixers(destination).into_iter().flatten() {
            if let Some(cell) = mixer.cell(channel) {
                ok &= tx.set(cell, 1.0);
            }
        }
    }
    ok
}

/// Settings of one global LFO.
#[derive(Debug)]
pub struct LfoParams {
    /// Rate in Hz.
    pub rate: ParamCell,
    /// [`LfoWaveform`] index.
    pub waveform: ChoiceCell,
    /// Output depth, `0.0..=1.0`.
    pub depth: ParamCell,
}

impl LfoParams {
    /// Sine at `rate` Hz with zero depth.
    pub const fn new(rate: f32) -> Self {
        Self {
            rate: ParamCell::new(rate),
            waveform: ChoiceCell::new(0),
            depth: ParamCell::new(0.0),
        }
    }
}

impl Default for LfoParams {
    fn default() -> Self {
        Self::new(2.0)
    }
}

/// Global LFO source node. No inputs; transmits `depth · lfo` on output 0.
///
/// The phase keeps running at zero depth so turning the depth up does not
/// restart the cycle.
pub struct LfoNode {
    lfo: Lfo,
    params: Arc<LfoParams>,
    out: FloatBlock,
}

impl LfoNode {
    /// LFO driven by `params`.
    pub fn new(params: Arc<LfoParams>, sample_rate: f32) -> Self {
        Self {
            lfo: Lfo::new(sample_rate, params.rate.get()),
            params,
            out: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }
}

impl SignalNode for LfoNode {
    fn name(&self) -> &'static str {
        "lfo"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        self.lfo.set_frequency(self.params.rate.get());
        self.lfo
            .set_waveform(LfoWaveform::from_index(self.params.waveform.get()));
        let depth = self.params.depth.get();
        for s in &mut self.out {
            *s = self.lfo.next() * depth;
        }
        if depth != 0.0 {
            io.transmit_samples(0, &self.out);
        }
    }
}
