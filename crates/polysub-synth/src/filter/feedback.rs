//! Conditioning of the ladder feedback tap.
//!
//! Both ladder cores feed their last stage back AC-coupled and let a
//! hysteretic gate pull resonance down while the tap is loud.

use polysub_core::{DcBlocker, EnvelopeFollower, SmoothedParam};

const FOLLOWER_ATTACK_MS: f32 = 1.0;
const FOLLOWER_RELEASE_MS: f32 = 50.0;
const GATE_SMOOTHING_MS: f32 = 5.0;
/// Tracker corner as a fraction of the filter cutoff, below the fixed corner.
const TRACKER_CUTOFF_RATIO: f32 = 0.01;

/// DC tracker, envelope follower and resonance gate for one feedback path.
#[derive(Debug, Clone)]
pub(crate) struct FeedbackConditioner {
    sample_rate: f32,
    dc: DcBlocker,
    follower: EnvelopeFollower,
    gate: SmoothedParam,
    engaged: bool,
    engage_above: f32,
    release_below: f32,
    depth: f32,
}

impl FeedbackConditioner {
    /// Gate that closes above `engage_above`, opens again below
    /// `release_below`, and cuts feedback by up to `depth`.
    pub(crate) fn new(sample_rate: f32, engage_above: f32, release_below: f32, depth: f32) -> Self {
        Self {
            sample_rate,
            dc: DcBlocker::new(sample_rate),
            follower: EnvelopeFollower::with_times(
                sample_rate,
                FOLLOWER_ATTACK_MS,
                FOLLOWER_RELEASE_MS,
            ),
            gate: SmoothedParam::with_config(0.0, sample_rate, GATE_SMOOTHING_MS),
            engaged: false,
            engage_above,
            release_below,
            depth,
        }
    }

    /// Follow the filter cutoff with the DC tracker corner: `cutoff / 100`,
    /// never above [`DcBlocker::FEEDBACK_CUTOFF_HZ`].
    #[inline]
    pub(crate) fn track_cutoff(&mut self, cutoff_hz: f32) {
        let corner = (cutoff_hz * TRACKER_CUTOFF_RATIO).min(DcBlocker::FEEDBACK_CUTOFF_HZ);
        self.dc.set_cutoff(self.sample_rate, corner);
    }

    /// Feed the previous last-stage output. Returns the AC-coupled tap and
    /// the factor to scale the feedback gain by.
    #[inline]
    pub(crate) fn process(&mut self, tap: f32) -> (f32, f32) {
        let ac = self.dc.process(tap);
        let level = self.follower.process(ac);
        if self.engaged {
            if level < self.release_below {
                self.engaged = false;
            }
        } else if level > self.engage_above {
            self.engaged = true;
        }
        self.gate.set_target(if self.engaged { 1.0 } else { 0.0 });
        let amount = self.gate.advance();
        (ac, 1.0 - self.depth * amount)
    }

    /// Whether the gate is currently closed on the feedback.
    #[cfg(test)]
    pub(crate) fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub(crate) fn reset(&mut self) {
        self.dc.reset();
        self.follower.reset();
        self.gate.set_immediate(0.0);
        self.engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_hysteresis() {
        let mut fb = FeedbackConditioner::new(44100.0, 0.5, 0.3, 0.35);
        // Loud alternating tap: no DC, follower climbs above the threshold.
        for i in 0..2000 {
            fb.process(if i % 2 == 0 { 0.8 } else { -0.8 });
        }
        assert!(fb.is_engaged());
        // Drop to a level between the thresholds: stays engaged.
        for i in 0..20_000 {
            fb.process(if i % 2 == 0 { 0.4 } else { -0.4 });
        }
        assert!(fb.is_engaged());
        // Silence: releases.
        for _ in 0..20_000 {
            fb.process(0.0);
        }
        assert!(!fb.is_engaged());
    }

    #[test]
    fn test_scale_bounded_by_depth() {
        let mut fb = FeedbackConditioner::new(44100.0, 0.5, 0.3, 0.35);
        let mut min_scale = 1.0f32;
        for i in 0..20_000 {
            let (_, scale) = fb.process(if i % 2 == 0 { 1.0 } else { -1.0 });
            min_scale = min_scale.min(scale);
        }
        assert!(min_scale >= 0.65 - 1e-4);
        assert!(min_scale < 0.7);
    }

    #[test]
    fn test_tracked_corner_keeps_low_tap() {
        // 30 Hz tap at the 40 Hz cutoff's tracker corner loses almost nothing.
        let sr = 44100.0;
        let mut fb = FeedbackConditioner::new(sr, 0.5, 0.3, 0.35);
        fb.track_cutoff(40.0);
        let mut peak = 0.0f32;
        for i in 0..88_200 {
            let x = 0.1 * libm::sinf(core::f32::consts::TAU * 30.0 * i as f32 / sr);
            let (ac, _) = fb.process(x);
            if i > 44_100 {
                peak = peak.max(ac.abs());
            }
        }
        assert!(peak > 0.099, "tap attenuated to {peak}");
    }
}
