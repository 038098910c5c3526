//! Nonlinear resonant low-pass filter cores.
//!
//! Three independent models share one interface, [`FilterCore`]:
//!
//! - [`DiodeLadder`] - cross-coupled four-stage diode ladder
//! - [`MoogLadder`] - four-stage transistor ladder with per-stage tanh
//! - [`Multimode`] - OB-X style 2-pole/4-pole filter with Xpander pole mixing
//!
//! Every core is wrapped by a [`StateGuard`]: each sample the states are
//! checked, and a core that diverges is reset to zero and muted for
//! [`GUARD_COOLDOWN_BLOCKS`] blocks while it settles again.
//!
//! [`FilterNode`] puts a core into the signal graph.

mod diode;
mod feedback;
mod guard;
mod moog;
mod multimode;
mod node;

pub use diode::DiodeLadder;
pub use guard::{GUARD_COOLDOWN_BLOCKS, GUARD_LIMIT, StateGuard};
pub use moog::MoogLadder;
pub use multimode::{Multimode, MultimodeTopology, XPANDER_MODES, XpanderMode};
pub use node::{FILTER_MOD_OCTAVES, FilterNode, FilterParams};

use polysub_core::FloatBlock;

/// Lowest cutoff any core runs at.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Cutoff smoothing time constant.
pub(crate) const CUTOFF_SMOOTHING_MS: f32 = 2.0;

/// Selectable filter model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterModel {
    /// Diode ladder.
    #[default]
    Diode,
    /// Transistor ladder.
    Moog,
    /// OB-X style multimode.
    Multimode,
}

impl FilterModel {
    /// All models in choice-index order.
    pub const ALL: [Self; 3] = [Self::Diode, Self::Moog, Self::Multimode];

    /// Model for a stored choice index; out of range falls back to diode.
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
            Self::Diode => "diode",
            Self::Moog => "moog",
            Self::Multimode => "multimode",
        }
    }
}

/// Common interface of the filter cores.
///
/// `process_block` takes the audio block plus two per-sample modulation
/// blocks: cutoff modulation in octaves and resonance modulation added to the
/// resonance setting. It always runs the full recurrence, also on silent
/// input, so resonant tails ring out.
pub trait FilterCore: Send {
    /// Base cutoff in Hz. Clamped to `[MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO·fs]`.
    fn set_cutoff(&mut self, cutoff_hz: f32);

    /// Base resonance, normalized `0.0..=1.0`.
    fn set_resonance(&mut self, resonance: f32);

    /// Zero every state, tracker and smoother.
    fn reset(&mut self);

    /// Filter one block.
    fn process_block(
        &mut self,
        input: &FloatBlock,
        cutoff_mod: &FloatBlock,
        resonance_mod: &FloatBlock,
        output: &mut FloatBlock,
    );

    /// The core's divergence guard.
    fn guard(&self) -> &StateGuard;

    /// Overwrite every integrator state with `value`.
    #[doc(hidden)]
    fn inject_state(&mut self, value: f32);
}

/// Clamp a cutoff to the stable range for `sample_rate`.
#[inline]
pub(crate) fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    if cutoff_hz.is_nan() {
        return MIN_CUTOFF_HZ;
    }
    cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO * sample_rate)
}

/// Pre-warped integrator gain `tan(π·fc/fs)`.
#[inline]
pub(crate) fn prewarp(cutoff_hz: f32, sample_rate: f32) -> f32 {
    libm::tanf(core::f32::consts::PI * cutoff_hz / sample_rate)
}

#[cfg(test)]
pub(crate) mod test_support {
    use polysub_core::{AUDIO_BLOCK_SAMPLES, FloatBlock};

    use super::FilterCore;

    pub const SR: f32 = 44100.0;
    pub const ZERO: FloatBlock = [0.0; AUDIO_BLOCK_SAMPLES];

    /// Largest magnitude over `blocks` blocks of the core's response to a
    /// short impulse followed by silence, plus whether everything was finite.
    pub fn impulse_then_silence(core: &mut dyn FilterCore, blocks: usize) -> (f32, bool) {
        let mut input = ZERO;
        input[..32].fill(0.5);
        let mut out = ZERO;
        core.process_block(&input, &ZERO, &ZERO, &mut out);
        let mut peak = 0.0f32;
        let mut finite = true;
        for _ in 0..blocks {
            core.process_block(&ZERO, &ZERO, &ZERO, &mut out);
            for &y in &out {
                finite &= y.is_finite();
                peak = peak.max(y.abs());
            }
        }
        (peak, finite)
    }

    pub fn sine_block(freq: f32, amplitude: f32, block_index: usize) -> FloatBlock {
        core::array::from_fn(|i| {
            let n = (block_index * AUDIO_BLOCK_SAMPLES + i) as f32;
            amplitude * libm::sinf(core::f32::consts::TAU * freq * n / SR)
        })
    }

    pub fn rms(samples: &[f32]) -> f32 {
        libm::sqrtf(samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32)
    }
}
