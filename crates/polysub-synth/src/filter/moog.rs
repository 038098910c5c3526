//! Transistor ladder core.
//!
//! Four one-pole stages, each with a tanh on its input and on its own
//! output. The implicit per-stage equation
//!
//! ```text
//! y = s + g·(tanh(u) − tanh(y))
//! ```
//!
//! is solved with two fixed-point iterations linearized around `y`. The
//! input and the feedback sum pass through a soft saturator with a
//! ±1.5 ceiling.
//!
//! Near the top of the cutoff range the 4-pole output is crossfaded towards
//! the 2-pole tap ("HF compensation") so the passband doesn't collapse when
//! the stages approach Nyquist.

use libm::tanhf;
use polysub_core::math::{fast_exp2, flush_denormal, smoothstep};
use polysub_core::{FloatBlock, SmoothedParam};

use super::feedback::FeedbackConditioner;
use super::{
    CUTOFF_SMOOTHING_MS, FilterCore, MAX_CUTOFF_RATIO, StateGuard, clamp_cutoff, prewarp,
};

/// Feedback gain at resonance 1.0.
const K_MAX: f32 = 4.2;
/// Resonance plus modulation may overdrive up to this.
const MAX_RESONANCE: f32 = 1.2;
const SATURATION_CEILING: f32 = 1.5;
const STAGE_ITERATIONS: usize = 2;

const GATE_ENGAGE: f32 = 0.9;
const GATE_RELEASE: f32 = 0.6;
const GATE_DEPTH: f32 = 0.3;

#[inline]
fn saturate(x: f32) -> f32 {
    SATURATION_CEILING * tanhf(x / SATURATION_CEILING)
}

/// Four-pole transistor ladder low-pass.
#[derive(Debug, Clone)]
pub struct MoogLadder {
    sample_rate: f32,
    cutoff: SmoothedParam,
    resonance: f32,
    hf_compensation: bool,
    s: [f32; 4],
    y: [f32; 4],
    feedback: FeedbackConditioner,
    guard: StateGuard,
}

impl MoogLadder {
    /// Core at 1 kHz, no resonance, HF compensation on.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            cutoff: SmoothedParam::with_config(1000.0, sample_rate, CUTOFF_SMOOTHING_MS),
            resonance: 0.0,
            hf_compensation: true,
            s: [0.0; 4],
            y: [0.0; 4],
            feedback: FeedbackConditioner::new(sample_rate, GATE_ENGAGE, GATE_RELEASE, GATE_DEPTH),
            guard: StateGuard::new(),
        }
    }

    /// Enable or disable the 2-pole crossfade near the top of the range.
    pub fn set_hf_compensation(&mut self, enabled: bool) {
        self.hf_compensation = enabled;
    }

    /// Whether HF compensation is on.
    pub fn hf_compensation(&self) -> bool {
        self.hf_compensation
    }

    #[inline]
    fn tick(&mut self, x: f32, cutoff_mod: f32, resonance_mod: f32) -> f32 {
        let ceiling = MAX_CUTOFF_RATIO * self.sample_rate;
        let fc = clamp_cutoff(self.cutoff.advance() * fast_exp2(cutoff_mod), self.sample_rate);
        let g = prewarp(fc, self.sample_rate);

        let k = (self.resonance + resonance_mod).clamp(0.0, MAX_RESONANCE) * K_MAX;
        let (tap, scale) = self.feedback.process(self.y[3]);
        let mut input = saturate(x - k * scale * tap);

        for stage in 0..4 {
            let state = self.s[stage];
            let driven = tanhf(input);
            let mut y = state;
            for _ in 0..STAGE_ITERATIONS {
                y = (state + g * (driven - tanhf(y) + y)) / (1.0 + g);
            }
            self.s[stage] = flush_denormal(y + g * (driven - tanhf(y)));
            self.y[stage] = y;
            input = y;
        }

        let out = self.y[3];
        if self.hf_compensation {
            let blend = smoothstep(0.5, 1.0, fc / ceiling);
            out + (self.y[1] - out) * blend
        } else {
            out
        }
    }

    fn clear_states(&mut self) {
        self.s = [0.0; 4];
        self.y = [0.0; 4];
        self.feedback.reset();
    }
}

impl FilterCore for MoogLadder {
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

    fn passband_ratio(amplitude: f32) -> f32 {
        let mut core = MoogLadder::new(SR);
        core.set_cutoff(1000.0);
        core.reset();
        let mut out = ZERO;
        let (mut dry, mut wet) = (Vec::new(), Vec::new());
        for b in 0..345 {
            let input = sine_block(100.0, amplitude, b);
            core.process_block(&input, &ZERO, &ZERO, &mut out);
            if b >= 35 {
                dry.extend_from_slice(&input);
                wet.extend_from_slice(&out);
            }
        }
        rms(&wet) / rms(&dry)
    }

    #[test]
    fn test_passband_level_preserved() {
        let ratio = passband_ratio(0.5);
        assert!((0.9..=1.1).contains(&ratio), "rms ratio {ratio}");
    }

    #[test]
    fn test_bounded_at_full_resonance_across_range() {
        for cutoff in [40.0, 100.0, 1000.0, 5000.0, 10_000.0, 19_000.0] {
            let mut core = MoogLadder::new(SR);
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
    fn test_overdriven_resonance_modulation_stays_bounded() {
        let mut core = MoogLadder::new(SR);
        core.set_cutoff(2000.0);
        core.set_resonance(1.0);
        core.reset();
        let res_mod = [1.0; polysub_core::AUDIO_BLOCK_SAMPLES];
        let mut out = ZERO;
        for b in 0..500 {
            let input = sine_block(220.0, 1.0, b);
            core.process_block(&input, &ZERO, &res_mod, &mut out);
            assert!(out.iter().all(|y| y.is_finite() && y.abs() <= 1.0));
        }
        assert_eq!(core.guard().trip_count(), 0);
    }

    #[test]
    fn test_injected_divergence_recovers() {
        let mut core = MoogLadder::new(SR);
        core.set_cutoff(1000.0);
        core.reset();
        core.inject_state(f32::NAN);
        let mut out = ZERO;
        for block in 0..GUARD_COOLDOWN_BLOCKS as usize {
            let input = sine_block(100.0, 0.5, block);
            core.process_block(&input, &ZERO, &ZERO, &mut out);
            assert_eq!(out, ZERO, "block {block} not muted");
        }
        assert_eq!(core.guard().trip_count(), 1);
        let input = sine_block(100.0, 0.5, GUARD_COOLDOWN_BLOCKS as usize);
        core.process_block(&input, &ZERO, &ZERO, &mut out);
        assert!(!core.guard().is_muted());
        assert!(out.iter().all(|y| y.is_finite()));
        assert!(out.iter().any(|&y| y != 0.0));
    }

    /// Output/input RMS for a sine at 0.8 of the cutoff.
    fn hf_gain(cutoff: f32, compensated: bool) -> f32 {
        let mut core = MoogLadder::new(SR);
        core.set_hf_compensation(compensated);
        core.set_cutoff(cutoff);
        core.reset();
        let mut out = ZERO;
        let (mut dry, mut wet) = (Vec::new(), Vec::new());
        for block in 0..60 {
            let input = sine_block(0.8 * cutoff, 0.5, block);
            core.process_block(&input, &ZERO, &ZERO, &mut out);
            if block >= 20 {
                dry.extend_from_slice(&input);
                wet.extend_from_slice(&out);
            }
        }
        rms(&wet) / rms(&dry)
    }

    #[test]
    fn test_hf_compensation_only_near_ceiling() {
        let mut plain = MoogLadder::new(SR);
        plain.set_hf_compensation(false);
        let mut comp = MoogLadder::new(SR);
        assert!(comp.hf_compensation());
        for core in [&mut plain, &mut comp] {
            core.set_cutoff(2000.0);
            core.reset();
        }
        let mut a = ZERO;
        let mut b = ZERO;
        for block in 0..20 {
            let input = sine_block(300.0, 0.5, block);
            plain.process_block(&input, &ZERO, &ZERO, &mut a);
            comp.process_block(&input, &ZERO, &ZERO, &mut b);
        }
        assert_eq!(a, b, "below half the ceiling the taps are not blended");
    }

    #[test]
    fn test_hf_compensation_lifts_passband_near_ceiling() {
        let plain = hf_gain(19_000.0, false);
        let comp = hf_gain(19_000.0, true);
        assert!(comp > plain + 0.08, "19 kHz: {plain} -> {comp}");
        let plain = hf_gain(15_000.0, false);
        let comp = hf_gain(15_000.0, true);
        assert!(comp > plain, "15 kHz: {plain} -> {comp}");
    }
}
