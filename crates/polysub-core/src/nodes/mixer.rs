#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::block::{AUDIO_BLOCK_SAMPLES, FloatBlock, SAMPLE_SCALE};
use crate::graph::{NodeIo, SignalNode};
use crate::param_cell::ParamCell;

/// Number of inputs on a [`Mixer4`].
pub const MIXER_CHANNELS: usize = 4;

/// Runtime gains of a [`Mixer4`], shared with the control context.
#[derive(Debug, Default)]
pub struct MixerGains {
    channels: [ParamCell; MIXER_CHANNELS],
}

impl MixerGains {
    /// Gains set to `gains`.
    pub const fn new(gains: [f32; MIXER_CHANNELS]) -> Self {
        Self {
            channels: [
                ParamCell::new(gains[0]),
                ParamCell::new(gains[1]),
                ParamCell::new(gains[2]),
                ParamCell::new(gains[3]),
            ],
        }
    }

    /// All channels at 1.0.
    pub const fn unity() -> Self {
        Self::new([1.0; MIXER_CHANNELS])
    }

    /// All channels at 0.0.
    pub const fn silent() -> Self {
        Self::new([0.0; MIXER_CHANNELS])
    }

    /// Gain of `channel`; out-of-range channels read as 0.0.
    #[inline]
    pub fn get(&self, channel: usize) -> f32 {
        self.channels.get(channel).map_or(0.0, ParamCell::get)
    }

    /// Set the gain of `channel`; out-of-range channels are ignored.
    #[inline]
    pub fn set(&self, channel: usize, gain: f32) {
        if let Some(cell) = self.channels.get(channel) {
            cell.set(gain);
        }
    }

    /// The cell behind `channel`, for staging in a transaction.
    pub fn cell(&self, channel: usize) -> Option<&ParamCell> {
        self.channels.get(channel)
    }
}

/// Four-input summing mixer.
///
/// Output is `Σ gainᵢ · linkᵢ · xᵢ`: the runtime gain from [`MixerGains`]
/// times the static link gain. Missing inputs and zero gains are skipped; if
/// nothing contributes, nothing is transmitted.
pub struct Mixer4 {
    gains: Arc<MixerGains>,
    acc: FloatBlock,
}

impl Mixer4 {
    /// Mixer reading its gains from `gains`.
    pub fn new(gains: Arc<MixerGains>) -> Self {
        Self {
            gains,
            acc: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }
}

impl SignalNode for Mixer4 {
    fn name(&self) -> &'static str {
        "mixer4"
    }

    fn inputs(&self) -> usize {
        MIXER_CHANNELS
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        let mut contributed = false;
        for channel in 0..MIXER_CHANNELS {
            let Some(input) = io.receive(channel) else {
                continue;
            };
            let gain = self.gains.get(channel) * input.gain();
            let block = input.into_block();
            if gain != 0.0 {
                let scale = gain * SAMPLE_SCALE;
                let samples = io.read(&block);
                if contributed {
                    for (acc, &s) in self.acc.iter_mut().zip(samples.iter()) {
                        *acc += f32::from(s) * scale;
                    }
                } else {
                    for (acc, &s) in self.acc.iter_mut().zip(samples.iter()) {
                        *acc = f32::from(s) * scale;
                    }
                    contributed = true;
                }
            }
            io.release(block);
        }
        if contributed {
            io.transmit_samples(0, &self.acc);
        }
    }
}
