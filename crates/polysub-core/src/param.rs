//! One-pole parameter smoothing.
//!
//! Control values arrive once per block from parameter cells; the audio path
//! reads them per sample through a [`SmoothedParam`] so a cutoff sweep or a
//! gate transition ramps instead of stepping.
//!
//! ```rust
//! use polysub_core::SmoothedParam;
//!
//! let mut cutoff = SmoothedParam::with_config(1000.0, 44100.0, 5.0);
//! cutoff.set_target(2000.0);
//! for _ in 0..2205 {
//!     cutoff.advance();
//! }
//! assert!((cutoff.get() - 2000.0).abs() < 1.0);
//! ```

use libm::expf;

/// Exponentially smoothed value.
///
/// `y[n] = y[n-1] + a · (target − y[n-1])` with `a = 1 − exp(−1/(τ·fs))`.
/// A smoothing time of zero makes changes instant.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// Unsmoothed parameter at `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Parameter at `initial` with a `smoothing_time_ms` time constant.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.set_smoothing(sample_rate, smoothing_time_ms);
        param
    }

    /// Change the time constant.
    pub fn set_smoothing(&mut self, sample_rate: f32, smoothing_time_ms: f32) {
        self.coeff = if smoothing_time_ms <= 0.0 || sample_rate <= 0.0 {
            1.0
        } else {
            1.0 - expf(-1.0 / (smoothing_time_ms / 1000.0 * sample_rate))
        };
    }

    /// Value to glide towards.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value`.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Step one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the value is within `1e-6` of its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Finish the glide now.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsmoothed_is_instant() {
        let mut p = SmoothedParam::new(0.0);
        p.set_target(1.0);
        assert_eq!(p.advance(), 1.0);
        assert!(p.is_settled());
    }

    #[test]
    fn test_one_time_constant() {
        let mut p = SmoothedParam::with_config(0.0, 1000.0, 10.0);
        p.set_target(1.0);
        for _ in 0..10 {
            p.advance();
        }
        // 1 - e^-1
        assert!((p.get() - 0.632).abs() < 0.01, "got {}", p.get());
    }

    #[test]
    fn test_snap() {
        let mut p = SmoothedParam::with_config(0.0, 44100.0, 50.0);
        p.set_target(3.0);
        p.advance();
        assert!(!p.is_settled());
        p.snap_to_target();
        assert_eq!(p.get(), 3.0);
    }
}
