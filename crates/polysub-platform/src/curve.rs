//! Control-change value curves.
//!
//! A controller sends 7-bit values. A [`Curve`] turns one into an engine
//! value and back. The pairing is exact: continuous curves satisfy
//! `to_cc(to_value(cc)) == cc` for every `cc`; stepped curves satisfy
//! `to_value(to_cc(v)) == v` for every step `v` and report the first
//! controller value of each step.

use libm::{logf, powf, roundf};

/// Largest 7-bit controller value.
pub const CC_MAX: u8 = 127;

/// Mapping between a controller value and an engine value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// `min · (max/min)^(cc/127)`. For frequencies and times; `min > 0`.
    Exponential {
        /// Value at controller 0.
        min: f32,
        /// Value at controller 127.
        max: f32,
    },
    /// Straight line from `min` to `max`.
    Linear {
        /// Value at controller 0.
        min: f32,
        /// Value at controller 127.
        max: f32,
    },
    /// `steps` equal bands, yielding `0.0..=steps-1`.
    Stepped {
        /// Number of choices (1–128).
        steps: u8,
    },
    /// Off below 64, on from 64.
    Toggle,
}

impl Curve {
    /// Engine value for controller value `cc` (values above 127 saturate).
    ///
    /// ```rust
    /// use polysub_platform::Curve;
    ///
    /// let cutoff = Curve::Exponential { min: 20.0, max: 10_000.0 };
    /// assert!((cutoff.to_value(0) - 20.0).abs() < 1e-3);
    /// assert!((cutoff.to_value(127) - 10_000.0).abs() < 0.01);
    /// assert_eq!(cutoff.to_cc(cutoff.to_value(64)), 64);
    /// ```
    pub fn to_value(self, cc: u8) -> f32 {
        let cc = cc.min(CC_MAX);
        let t = f32::from(cc) / f32::from(CC_MAX);
        match self {
            Self::Exponential { min, max } => min * powf(max / min, t),
            Self::Linear { min, max } => min + (max - min) * t,
            Self::Stepped { steps } => {
                let steps = u32::from(steps.max(1));
                let step = (u32::from(cc) * steps / 128).min(steps - 1);
                step as f32
            }
            Self::Toggle => {
                if cc >= 64 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Controller value for engine value `value`, saturating outside the
    /// curve's range. NaN maps to 0.
    pub fn to_cc(self, value: f32) -> u8 {
        if value.is_nan() {
            return 0;
        }
        let t = match self {
            Self::Exponential { min, max } => {
                if value <= min {
                    0.0
                } else {
                    logf(value / min) / logf(max / min)
                }
            }
            Self::Linear { min, max } => (value - min) / (max - min),
            Self::Stepped { steps } => {
                let steps = u32::from(steps.max(1));
                let step = (roundf(value).max(0.0) as u32).min(steps - 1);
                let cc = (step * 128).div_ceil(steps);
                return cc.min(u32::from(CC_MAX)) as u8;
            }
            Self::Toggle => return if value >= 0.5 { CC_MAX } else { 0 },
        };
        roundf(t.clamp(0.0, 1.0) * f32::from(CC_MAX)) as u8
    }
}
