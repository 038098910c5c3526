//! Diode ladder core.
//!
//! Four one-pole TPT stages whose inputs are coupled to their neighbours, as
//! in a diode ladder where every capacitor sees the stages on both sides:
//!
//! ```text
//! u1 = x_fb + y2      (integrator gain 2g)
//! u2 = (y1 + y3) / 2  (g)
//! u3 = (y2 + y4) / 2  (g)
//! u4 = y3 / 2         (g)
//! ```
//!
//! The coupled system is solved per sample by relaxed Gauss-Seidel passes
//! starting from the previous outputs, then every integrator commits once.
//! The feedback sum goes through a tanh limiter, so the stage network stays
//! bounded at any cutoff and full resonance self-oscillates. The feedback
//! tap's DC tracker follows the cutoff down, which keeps the loop above
//! unity at the bottom of the range.

use libm::tanhf;
use polysub_core::math::{fast_exp2, flush_denormal};
use polysub_core::{FloatBlock, SmoothedParam};

use super::feedback::FeedbackConditioner;
use super::{CUTOFF_SMOOTHING_MS, FilterCore, StateGuard, clamp_cutoff, prewarp};

/// Feedback gain at full resonance.
const K_MAX: f32 = 20.0;
const SOLVER_PASSES: usize = 3;
const RELAXATION: f32 = 0.6;

const GATE_ENGAGE: f32 = 0.5;
const GATE_RELEASE: f32 = 0.3;
const GATE_DEPTH: f32 = 0.35;

/// Diode ladder low-pass.
///
/// # Example
///
/// ```rust
/// use polysub_synth::filter::{DiodeLadder, FilterCore};
/// use polysub_core::AUDIO_BLOCK_SAMPLES;
///
/// let mut core = DiodeLadder::new(44100.0);
/// core.set_cutoff(800.0);
/// core.set_resonance(0.7);
///
/// let input = [0.25; AUDIO_BLOCK_SAMPLES];
/// let zero = [0.0; AUDIO_BLOCK_SAMPLES];
/// let mut out = [0.0; AUDIO_BLOCK_SAMPLES];
/// core.process_block(&input, &zero, &zero, &mut out);
/// assert!(out.iter().all(|y| y.is_finite() && y.abs() <= 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct DiodeLadder {
    sample_rate: f32,
    cutoff: SmoothedParam,
    resonance: f32,
    s: [f32; 4],
    y: [f32; 4],
    feedback: FeedbackConditioner,
    guard: StateGuard,
}

impl DiodeLadder {
    /// Core at 1 kHz, no resonance.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            cutoff: SmoothedParam::with_config(1000.0, sample_rate, CUTOFF_SMOOTHING_MS),
            resonance: 0.0,
            s: [0.0; 4],
            y: [0.0; 4],
            feedback: FeedbackConditioner::new(sample_rate, GATE_ENGAGE, GATE_RELEASE, GATE_DEPTH),
            guard: StateGuard::new(),
        }
    }

    #[inline]
    fn tick(&mut self, x: f32, cutoff_mod: f32, resonance_mod: f32) -> f32 {
        let fc = clamp_cutoff(self.cutoff.advance() * fast_exp2(cutoff_mod), self.sample_rate);
        let g = prewarp(fc, self.sample_rate);
        let g1 = 2.0 * g / (1.0 + 2.0 * g);
        let gn = g / (1.0 + g);

        let k = (self.resonance + resonance_mod).clamp(0.0, 1.0) * K_MAX;
        self.feedback.track_cutoff(fc);
        let (tap, scale) = self.feedback.process(self.y[3]);
        let x_fb = tanhf(x - k * scale * tap);

        let s = self.s;
        let mut y = self.y;
        for _ in 0..SOLVER_PASSES {
            let t = g1 * (x_fb + y[1]) + (1.0 - g1) * s[0];
            y[0] += RELAXATION * (t - y[0]);
            let t = gn * 0.5 * (y[0] + y[2]) + (1.0 - gn) * s[1];
            y[1] += RELAXATION * (t - y[1]);
            let t = gn * 0.5 * (y[1] + y[3]) + (1.0 - gn) * s[2];
            y[2] += RELAXATION * (t - y[2]);
            let t = gn * 0.5 * y[2] + (1.0 - gn) * s[3];
            y[3] += RELAXATION * (t - y[3]);
        }
        for (state, &out) in self.s.iter_mut().zip(y.iter()) {
            *state = flush_denormal(2.0 * out - *state);
        }
        self.y = y;
        y[3]
    }

    fn clear_states(&mut self) {
        self.s = [0.0; 4];
        self.y = [0.0; 4];
        self.feedback.reset();
    }
}

impl FilterCore for DiodeLadder {
    fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff.set_target(clamp_cutoff(cutoff_hz, self.sample_rate));
    }

    fn set_resonance(&mut self, resonance: f32) {
        self.resonance = if resonance.is_nan() { 0.0 } else { resonance.clamp(0.0, 1.0) };
    }

    fn reset(&mut self) {
        self.clear_states();
        self.cutoff.snap_to_target();
    }

    fn process_block(
        &mut self,
        input: &FloatBlock,
        cutoff_mod: &FloatBlock,
        resonance_mod: &FloatBlock,
        output: &mut FloatBlock,
    ) {
        for i in 0..output.len() {
            let y = self.tick(input[i], cutoff_mod[i], resonance_mod[i]);
            let healthy = self.guard.check(&self.s) && self.guard.check(&self.y);
            if !healthy {
                self.clear_states();
            }
            output[i] = if self.guard.is_muted() {
                0.0
            } else {
                y.clamp(-1.0, 1.0)
            };
        }
        self.guard.end_block();
    }

    fn guard(&self) -> &StateGuard {
        &self.guard
    }

    fn inject_state(&mut self, value: f32) {
        self.s = [value; 4];
        self.y = [value; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{SR, ZERO, impulse_then_silence, rms, sine_block};
    use super::super::GUARD_COOLDOWN_BLOCKS;
    use super::*;

    #[test]
    fn test_unity_dc_gain() {
        let mut core = DiodeLadder::new(SR);
        core.set_cutoff(2000.0);
        core.reset();
        let input = [0.3; polysub_core::AUDIO_BLOCK_SAMPLES];
        let mut out = ZERO;
        for _ in 0..100 {
            core.process_block(&input, &ZERO, &ZERO, &mut out);
        }
        assert!((out[127] - 0.3).abs() < 0.02, "dc out {}", out[127]);
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let mut core = DiodeLadder::new(SR);
        core.set_cutoff(300.0);
        core.reset();
        let mut out = ZERO;
        let mut collected = Vec::new();
        for b in 0..80 {
            let input = sine_block(5000.0, 0.5, b);
            core.process_block(&input, &ZERO, &ZERO, &mut out);
            if b >= 40 {
                collected.extend_from_slice(&out);
            }
        }
        assert!(rms(&collected) < 0.01, "5 kHz leaked: {}", rms(&collected));
    }

    #[test]
    fn test_bounded_at_full_resonance_across_range() {
        for cutoff in [40.0, 200.0, 1000.0, 5000.0, 12_000.0, 19_000.0] {
            let mut core = DiodeLadder::new(SR);
            core.set_cutoff(cutoff);
            core.set_resonance(1.0);
            core.reset();
            let (peak, finite) = impulse_then_silence(&mut core, 1000);
            assert!(finite, "non-finite at {cutoff} Hz");
            assert!(peak <= 1.0);
            assert_eq!(core.guard().trip_count(), 0, "guard tripped at {cutoff} Hz");
        }
    }

    #[test]
    fn test_full_resonance_self_oscillates_across_range() {
        for cutoff in [20.0, 40.0, 100.0, 1000.0, 10_000.0, 19_000.0] {
            let mut core = DiodeLadder::new(SR);
            core.set_cutoff(cutoff);
            core.set_resonance(1.0);
            core.reset();
            let (_, finite) = impulse_then_silence(&mut core, 1000);
            assert!(finite);
            // 40 blocks cover two full periods at 20 Hz.
            let mut tail = Vec::new();
            let mut out = ZERO;
            for _ in 0..40 {
                core.process_block(&ZERO, &ZERO, &ZERO, &mut out);
                tail.extend_from_slice(&out);
            }
            assert!(rms(&tail) > 0.01, "tail died at {cutoff} Hz: rms {}", rms(&tail));
        }
    }

    #[test]
    fn test_injected_divergence_recovers() {
        for bad in [f32::NAN, f32::INFINITY, 1e9] {
            let mut core = DiodeLadder::new(SR);
            core.set_cutoff(1000.0);
            core.set_resonance(1.0);
            core.reset();
            let input = sine_block(220.0, 0.5, 0);
            let mut out = ZERO;
            core.process_block(&input, &ZERO, &ZERO, &mut out);
            core.inject_state(bad);

            for block in 0..GUARD_COOLDOWN_BLOCKS as usize {
                core.process_block(&sine_block(220.0, 0.5, block + 1), &ZERO, &ZERO, &mut out);
                assert_eq!(out, ZERO, "block {block} not muted after {bad}");
            }
            let mut after = Vec::new();
            for block in 0..4 {
                let input = sine_block(220.0, 0.5, block + 5);
                core.process_block(&input, &ZERO, &ZERO, &mut out);
                after.extend_from_slice(&out);
            }
            assert!(after.iter().all(|y| y.is_finite()));
            assert!(rms(&after) > 0.01, "no output after recovery from {bad}");
            assert_eq!(core.guard().trip_count(), 1);
        }
    }
}
