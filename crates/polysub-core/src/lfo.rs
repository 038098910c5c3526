//! Control-rate low frequency oscillator.
//!
//! Drives the two global modulation sources. The phase accumulator runs per
//! sample so rates up to a few tens of hertz stay smooth at block output.

use core::f32::consts::TAU;
use libm::sinf;

/// LFO waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Sine.
    #[default]
    Sine,
    /// Symmetric triangle.
    Triangle,
    /// Rising ramp.
    Saw,
    /// Square.
    Square,
    /// Random step per cycle.
    SampleAndHold,
}

impl LfoWaveform {
    /// All waveforms in choice-index order.
    pub const ALL: [Self; 5] = [
        Self::Sine,
        Self::Triangle,
        Self::Saw,
        Self::Square,
        Self::SampleAndHold,
    ];

    /// Waveform for a stored choice index; out-of-range indices wrap to sine.
    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    /// Choice index of this waveform.
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Phase-accumulating LFO producing values in `[-1, 1]`.
///
/// # Example
///
/// ```rust
/// use polysub_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(1000.0, 250.0);
/// lfo.set_waveform(LfoWaveform::Square);
/// assert_eq!(lfo.next(), 1.0);
/// lfo.next();
/// assert_eq!(lfo.next(), -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
    held: f32,
    rng: u32,
}

impl Lfo {
    /// LFO at `freq_hz`, sine, phase 0.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz.max(0.0) / sample_rate,
            sample_rate,
            waveform: LfoWaveform::Sine,
            held: 0.0,
            rng: 0x1234_5678,
        }
    }

    /// Set the rate in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz.max(0.0) / self.sample_rate;
    }

    /// Current rate in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Select the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Selected waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Restart the cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce the next value and advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let output = match self.waveform {
            LfoWaveform::Sine => sinf(self.phase * TAU),
            LfoWaveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            LfoWaveform::Saw => 2.0 * self.phase - 1.0,
            LfoWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::SampleAndHold => {
                if self.phase == 0.0 {
                    self.held = self.random();
                }
                self.held
            }
        };

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
            if self.waveform == LfoWaveform::SampleAndHold {
                self.held = self.random();
            }
        }
        output
    }

    fn random(&mut self) -> f32 {
        // xorshift32
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(44100.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_waveforms_bounded() {
        for waveform in LfoWaveform::ALL {
            let mut lfo = Lfo::new(1000.0, 7.0);
            lfo.set_waveform(waveform);
            for _ in 0..5000 {
                let v = lfo.next();
                assert!((-1.0..=1.0).contains(&v), "{waveform:?} produced {v}");
            }
        }
    }

    #[test]
    fn test_frequency_sets_period() {
        let mut lfo = Lfo::new(1000.0, 10.0);
        lfo.set_waveform(LfoWaveform::Saw);
        // 100-sample period; stop mid-cycle so drift cannot move a wrap
        // across the window edge.
        let mut wraps = 0;
        let mut prev = lfo.next();
        for _ in 0..1050 {
            let v = lfo.next();
            if v < prev {
                wraps += 1;
            }
            prev = v;
        }
        assert_eq!(wraps, 10);
    }

    #[test]
    fn test_sample_and_hold_steps_per_cycle() {
        let mut lfo = Lfo::new(100.0, 10.0);
        lfo.set_waveform(LfoWaveform::SampleAndHold);
        let first: [f32; 10] = core::array::from_fn(|_| lfo.next());
        assert!(first.iter().all(|&v| v == first[0]), "held within a cycle");
        assert_ne!(lfo.next(), first[0]);
    }

    #[test]
    fn test_waveform_index_roundtrip() {
        for waveform in LfoWaveform::ALL {
            assert_eq!(LfoWaveform::from_index(waveform.index()), waveform);
        }
        assert_eq!(LfoWaveform::from_index(200), LfoWaveform::Sine);
    }
}
