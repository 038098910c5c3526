//! Applies controller moves to a running synth.

use polysub_synth::{ParamChange, SynthControl};

use crate::cc_map::CcMap;
use crate::curve::CC_MAX;

/// Routes control-change messages through a [`CcMap`] into a
/// [`SynthControl`].
///
/// # Example
///
/// ```rust
/// use polysub_platform::ControlDispatcher;
/// use polysub_synth::{Synth, SynthParam, SynthSettings};
///
/// let (_synth, mut control) = Synth::new(&SynthSettings::default()).unwrap();
/// let dispatcher = ControlDispatcher::default();
///
/// let change = dispatcher.handle(&mut control, 74, 127).unwrap();
/// assert_eq!(change.param, SynthParam::Cutoff);
/// assert_eq!(dispatcher.read_back(&control, 74), Some(127));
///
/// // Unmapped controllers are ignored.
/// assert!(dispatcher.handle(&mut control, 3, 10).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControlDispatcher {
    map: CcMap,
}

impl ControlDispatcher {
    /// Dispatcher over a custom map.
    pub fn new(map: CcMap) -> Self {
        Self { map }
    }

    /// The active map.
    pub fn map(&self) -> &CcMap {
        &self.map
    }

    /// Mutable access for remapping at runtime.
    pub fn map_mut(&mut self) -> &mut CcMap {
        &mut self.map
    }

    /// Apply controller `cc` moved to `value` (saturated to 127).
    ///
    /// Returns the parameter write as stored after clamping, or `None` when
    /// `cc` is unmapped.
    pub fn handle(&self, control: &mut SynthControl, cc: u8, value: u8) -> Option<ParamChange> {
        let entry = self.map.get(cc)?;
        let target = entry.curve.to_value(value.min(CC_MAX));
        let value = control.set(entry.param, target)?;
        Some(ParamChange {
            param: entry.param,
            value,
        })
    }

    /// Controller value that reproduces the current setting of whatever
    /// `cc` drives. `None` when `cc` is unmapped.
    pub fn read_back(&self, control: &SynthControl, cc: u8) -> Option<u8> {
        let entry = self.map.get(cc)?;
        let value = control.get(entry.param)?;
        Some(entry.curve.to_cc(value))
    }
}
