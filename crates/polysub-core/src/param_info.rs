//! Parameter descriptors and index-based introspection.
//!
//! Every user-facing synth parameter is described by a static
//! [`ParamDescriptor`]: range, default, unit, scale and a stable [`ParamId`].
//! Controllers, CC maps and patch capture only ever talk to a synth through
//! these descriptors and the [`ParameterInfo`] trait, so they never need to
//! know which node or cell a value ends up in.
//!
//! # Example
//!
//! ```rust
//! use polysub_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};
//!
//! let cutoff = ParamDescriptor::continuous("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 10_000.0, 1000.0)
//!     .with_scale(ParamScale::Logarithmic)
//!     .with_id(ParamId(3), "flt_cutoff");
//!
//! assert_eq!(cutoff.clamp(50_000.0), 10_000.0);
//! assert!((cutoff.denormalize(cutoff.normalize(440.0)) - 440.0).abs() < 0.01);
//! ```

/// Mapping between a plain value and `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// Equal resolution per ratio. Requires `min > 0`.
    Logarithmic,
    /// `normalized = linear^(1/exp)`; exponents above 1 favour the low end.
    Power(f32),
}

/// Stable parameter identifier.
///
/// The number is part of the control surface: CC maps and stored patches
/// refer to it, so it never changes once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

/// Capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// Continuous, visible.
    pub const NONE: Self = Self(0);
    /// Integer choice; [`ParamDescriptor::clamp`] rounds.
    pub const STEPPED: Self = Self(1 << 0);
    /// Not shown in generic listings.
    pub const HIDDEN: Self = Self(1 << 1);

    /// All bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Both flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Index-based parameter access.
///
/// Indices run over `0..param_count()` and never change for a given
/// implementation. Setters clamp instead of rejecting.
pub trait ParameterInfo {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Descriptor at `index`, `None` past the end.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current plain value at `index`; `0.0` past the end.
    fn get_param(&self, index: usize) -> f32;

    /// Set the plain value at `index`, clamped to the descriptor range.
    /// Out-of-range indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Index of the parameter whose name or short name matches
    /// (ASCII case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
                    || desc.string_id.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Index of the parameter carrying `id`. Linear scan.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Name for small displays, eight characters at most.
    pub short_name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Lowest value.
    pub min: f32,
    /// Highest value.
    pub max: f32,
    /// Power-on value.
    pub default: f32,
    /// Encoder increment.
    pub step: f32,
    /// Stable id.
    pub id: ParamId,
    /// Stable text id, `"group_name"` style.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Flags.
    pub flags: ParamFlags,
    /// Grouping for listings (`"osc"`, `"filter"`, ...).
    pub group: &'static str,
}

impl ParamDescriptor {
    /// Continuous parameter over `min..=max`.
    pub const fn continuous(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step: (max - min) / 100.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::NONE,
            group: "",
        }
    }

    /// Choice among `count` options, stored as `0.0..=count-1`.
    pub const fn choice(name: &'static str, short_name: &'static str, count: u8, default: u8) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min: 0.0,
            max: (count.saturating_sub(1)) as f32,
            default: default as f32,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::STEPPED,
            group: "",
        }
    }

    /// Set the stable ids.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Set the normalization curve.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the group.
    pub const fn with_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Add flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Whether values are integer choices.
    #[inline]
    pub fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamp to the range; stepped parameters also round. NaN maps to the
    /// default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.is_stepped() {
            libm::roundf(clamped)
        } else {
            clamped
        }
    }

    /// Plain value to `[0, 1]` through the scale.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let value = value.clamp(self.min, self.max);
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return (value - self.min) / range;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => libm::powf((value - self.min) / range, 1.0 / exp),
        }
    }

    /// `[0, 1]` to plain value; inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min + normalized * (self.max - self.min);
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => {
                self.min + libm::powf(normalized, exp) * (self.max - self.min)
            }
        }
    }
}

/// Display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Hz.
    Hertz,
    /// ms.
    Milliseconds,
    /// Semitones.
    Semitones,
    /// Percent, stored as `0.0..=1.0`.
    Percent,
    /// Dimensionless.
    None,
}

impl ParamUnit {
    /// Suffix for value display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Semitones => " st",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUTOFF: ParamDescriptor =
        ParamDescriptor::continuous("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 10_000.0, 1000.0)
            .with_scale(ParamScale::Logarithmic)
            .with_id(ParamId(3), "flt_cutoff");

    struct TwoParams {
        values: [f32; 2],
    }

    impl ParameterInfo for TwoParams {
        fn param_count(&self) -> usize {
            2
        }

        fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
            match index {
                0 => Some(CUTOFF),
                1 => Some(ParamDescriptor::choice("Model", "Model", 3, 0).with_id(ParamId(9), "flt_model")),
                _ => None,
            }
        }

        fn get_param(&self, index: usize) -> f32 {
            self.values.get(index).copied().unwrap_or(0.0)
        }

        fn set_param(&mut self, index: usize, value: f32) {
            if let (Some(desc), Some(slot)) = (self.param_info(index), self.values.get_mut(index)) {
                *slot = desc.clamp(value);
            }
        }
    }

    #[test]
    fn test_log_scale_midpoint_is_geometric_mean() {
        let mid = CUTOFF.denormalize(0.5);
        assert!((mid - libm::sqrtf(20.0 * 10_000.0)).abs() < 0.1, "mid = {mid}");
    }

    #[test]
    fn test_choice_clamp_rounds() {
        let model = ParamDescriptor::choice("Model", "Model", 3, 0);
        assert!(model.is_stepped());
        assert_eq!(model.clamp(1.4), 1.0);
        assert_eq!(model.clamp(1.6), 2.0);
        assert_eq!(model.clamp(7.0), 2.0);
        assert_eq!(model.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn test_power_scale_inverse() {
        let attack = ParamDescriptor::continuous("Attack", "Atk", ParamUnit::Milliseconds, 1.0, 5000.0, 10.0)
            .with_scale(ParamScale::Power(3.0));
        for v in [1.0, 10.0, 250.0, 4999.0] {
            let back = attack.denormalize(attack.normalize(v));
            assert!((back - v).abs() / v < 1e-3, "{v} -> {back}");
        }
    }

    #[test]
    fn test_trait_lookup_helpers() {
        let mut p = TwoParams { values: [1000.0, 0.0] };
        assert_eq!(p.find_param_by_name("cutoff"), Some(0));
        assert_eq!(p.find_param_by_name("flt_model"), Some(1));
        assert_eq!(p.param_index_by_id(ParamId(9)), Some(1));
        assert_eq!(p.param_index_by_id(ParamId(99)), None);
        p.set_param(0, 1.0);
        assert_eq!(p.get_param(0), 20.0);
        p.set_param(5, 1.0);
    }
}
