//! Peak envelope follower.
//!
//! The resonance gate in the ladder cores watches the level of the feedback
//! tap with one of these: a fast attack catches the onset of
//! self-oscillation, a slower release keeps the gate from chattering.

use libm::expf;

use crate::math::flush_denormal;

/// Rectifying follower with separate attack and release times.
///
/// # Example
///
/// ```rust
/// use polysub_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::with_times(44100.0, 1.0, 50.0);
/// for _ in 0..441 {
///     env.process(-0.8);
/// }
/// assert!(env.level() > 0.75);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    /// Follower with `attack_ms` rise and `release_ms` fall time constants.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: Self::coeff(attack_ms.max(0.01), sample_rate),
            release_coeff: Self::coeff(release_ms.max(0.01), sample_rate),
        }
    }

    /// Feed one sample; returns the updated level.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let magnitude = input.abs();
        let coeff = if magnitude > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = flush_denormal(coeff * self.envelope + (1.0 - coeff) * magnitude);
        self.envelope
    }

    /// Current level.
    #[inline]
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Drop the level to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn coeff(time_ms: f32, sample_rate: f32) -> f32 {
        // exp(-1 / samples-per-time-constant)
        expf(-1.0 / (time_ms * sample_rate.max(1.0) / 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_attack() {
        let mut env = EnvelopeFollower::with_times(44100.0, 1.0, 50.0);
        let mut level = 0.0;
        for _ in 0..220 {
            level = env.process(1.0);
        }
        assert!(level > 0.99, "attack too slow: {level}");
    }

    #[test]
    fn test_slow_release() {
        let mut env = EnvelopeFollower::with_times(44100.0, 1.0, 50.0);
        for _ in 0..441 {
            env.process(1.0);
        }
        // 10 ms of silence is a fifth of the release constant.
        let mut level = 0.0;
        for _ in 0..441 {
            level = env.process(0.0);
        }
        assert!(level > 0.75 && level < 0.9, "release level {level}");
    }

    #[test]
    fn test_reset() {
        let mut env = EnvelopeFollower::with_times(44100.0, 1.0, 50.0);
        env.process(1.0);
        env.reset();
        assert_eq!(env.level(), 0.0);
    }
}
