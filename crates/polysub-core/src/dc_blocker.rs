//! One-pole DC tracker for feedback paths.
//!
//! Resonant ladders feed their last stage back into the input. Any offset on
//! that tap (asymmetric drive, a stuck note) is amplified by the loop gain, so
//! the feedback signal is taken AC-coupled: a slow one-pole low-pass follows
//! the mean and is subtracted.
//!
//! ```text
//! m[n] = m[n-1] + a · (x[n] − m[n-1])      a = 1 − exp(−2π·fc/fs)
//! y[n] = x[n] − m[n]
//! ```

use core::f32::consts::PI;

use libm::expf;

use crate::math::flush_denormal;

/// AC coupler: removes the running mean from a signal.
///
/// ## Example
///
/// ```rust
/// use polysub_core::DcBlocker;
///
/// let mut blocker = DcBlocker::with_cutoff(44100.0, 10.0);
/// let mut y = 1.0;
/// for _ in 0..44100 {
///     y = blocker.process(0.25);
/// }
/// assert!(y.abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    coeff: f32,
    mean: f32,
}

impl DcBlocker {
    /// Tracker cutoff used by the filter feedback paths.
    pub const FEEDBACK_CUTOFF_HZ: f32 = 10.0;

    /// Blocker at [`FEEDBACK_CUTOFF_HZ`](Self::FEEDBACK_CUTOFF_HZ).
    pub fn new(sample_rate: f32) -> Self {
        Self::with_cutoff(sample_rate, Self::FEEDBACK_CUTOFF_HZ)
    }

    /// Blocker with an explicit tracker cutoff.
    pub fn with_cutoff(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self {
            coeff: Self::coeff_for(cutoff_hz, sample_rate),
            mean: 0.0,
        }
    }

    /// Remove the tracked mean from `input`.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.mean = flush_denormal(self.mean + self.coeff * (input - self.mean));
        input - self.mean
    }

    /// Move the corner without disturbing the mean estimate.
    #[inline]
    pub fn set_cutoff(&mut self, sample_rate: f32, cutoff_hz: f32) {
        self.coeff = Self::coeff_for(cutoff_hz, sample_rate);
    }

    /// Current mean estimate.
    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Forget the tracked mean.
    pub fn reset(&mut self) {
        self.mean = 0.0;
    }

    fn coeff_for(cutoff_hz: f32, sample_rate: f32) -> f32 {
        if sample_rate <= 0.0 {
            return 1.0;
        }
        (1.0 - expf(-2.0 * PI * cutoff_hz.max(0.0) / sample_rate)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_offset() {
        let mut blocker = DcBlocker::new(44100.0);
        let mut out = 0.0;
        for _ in 0..44100 {
            out = blocker.process(0.6);
        }
        assert!(out.abs() < 0.01, "offset left: {out}");
        assert!((blocker.mean() - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_passes_audio_band() {
        let sr = 44100.0;
        let mut blocker = DcBlocker::new(sr);
        let mut peak = 0.0f32;
        for i in 0..8820 {
            let x = libm::sinf(2.0 * PI * 440.0 * i as f32 / sr);
            let y = blocker.process(x);
            if i > 4410 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.97, "440 Hz attenuated to {peak}");
    }

    #[test]
    fn test_reset() {
        let mut blocker = DcBlocker::new(44100.0);
        for _ in 0..100 {
            blocker.process(1.0);
        }
        blocker.reset();
        assert_eq!(blocker.mean(), 0.0);
    }

    #[test]
    fn test_lower_corner_passes_low_frequencies() {
        let sr = 44100.0;
        let peak_at = |blocker: &mut DcBlocker| {
            let mut peak = 0.0f32;
            for i in 0..88_200 {
                let y = blocker.process(libm::sinf(2.0 * PI * 20.0 * i as f32 / sr));
                if i > 44_100 {
                    peak = peak.max(y.abs());
                }
            }
            peak
        };
        let fixed = peak_at(&mut DcBlocker::new(sr));
        let mut lowered = DcBlocker::new(sr);
        lowered.set_cutoff(sr, 0.2);
        let lowered = peak_at(&mut lowered);
        assert!(lowered > 0.99, "20 Hz through 0.2 Hz corner: {lowered}");
        assert!(lowered > fixed);
    }
}
