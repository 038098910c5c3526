//! Controller-number to parameter table.
//!
//! [`CcMap`] is a fixed-capacity table associating MIDI control-change
//! numbers with a [`SynthParam`] and the [`Curve`] that scales the 7-bit
//! value. It never allocates, so it can live on an embedded target next to
//! the engine.

use polysub_synth::SynthParam;

use crate::curve::Curve;

/// Maximum number of entries in a [`CcMap`].
pub const CC_MAP_CAPACITY: usize = 32;

/// One mapped controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcEntry {
    /// Controller number (0–127).
    pub cc: u8,
    /// Parameter it drives.
    pub param: SynthParam,
    /// Scaling from controller value to parameter value.
    pub curve: Curve,
}

/// Maps controller numbers to parameters.
///
/// # Example
///
/// ```rust
/// use polysub_platform::{CcMap, Curve};
/// use polysub_synth::SynthParam;
///
/// let mut map = CcMap::new();
/// assert!(map.map(20, SynthParam::Resonance, Curve::Linear { min: 0.0, max: 1.0 }));
/// assert_eq!(map.get(20).map(|e| e.param), Some(SynthParam::Resonance));
/// assert_eq!(map.cc_for(SynthParam::Resonance), Some(20));
///
/// // The stock layout puts cutoff on CC 74.
/// let stock = CcMap::default();
/// assert_eq!(stock.get(74).map(|e| e.param), Some(SynthParam::Cutoff));
/// ```
#[derive(Debug, Clone)]
pub struct CcMap {
    entries: [Option<CcEntry>; CC_MAP_CAPACITY],
    count: usize,
}

const fn exp(min: f32, max: f32) -> Curve {
    Curve::Exponential { min, max }
}

const fn lin(min: f32, max: f32) -> Curve {
    Curve::Linear { min, max }
}

const UNIT: Curve = lin(0.0, 1.0);
const ENV_TIME: Curve = exp(1.0, 10_000.0);

const DEFAULT_LAYOUT: [(u8, SynthParam, Curve); 24] = [
    (1, SynthParam::Lfo1Depth, UNIT),
    (7, SynthParam::MasterVolume, UNIT),
    (70, SynthParam::FilterModel, Curve::Stepped { steps: 3 }),
    (71, SynthParam::Resonance, UNIT),
    (72, SynthParam::AmpRelease, ENV_TIME),
    (73, SynthParam::AmpAttack, ENV_TIME),
    (74, SynthParam::Cutoff, exp(20.0, 10_000.0)),
    (75, SynthParam::AmpDecay, ENV_TIME),
    (76, SynthParam::Lfo1Rate, exp(0.01, 50.0)),
    (77, SynthParam::FilterEnvAmount, lin(-1.0, 1.0)),
    (78, SynthParam::KeyTrack, UNIT),
    (79, SynthParam::AmpSustain, UNIT),
    (80, SynthParam::Osc1Wave, Curve::Stepped { steps: 5 }),
    (81, SynthParam::Osc2Wave, Curve::Stepped { steps: 5 }),
    (82, SynthParam::Osc2Detune, lin(-50.0, 50.0)),
    (83, SynthParam::FilterMode, Curve::Stepped { steps: 15 }),
    (84, SynthParam::FilterPoles, Curve::Toggle),
    (85, SynthParam::FilterPush, Curve::Toggle),
    (86, SynthParam::Lfo1Dest, Curve::Stepped { steps: 4 }),
    (87, SynthParam::Lfo2Dest, Curve::Stepped { steps: 4 }),
    (88, SynthParam::SubLevel, UNIT),
    (89, SynthParam::NoiseLevel, UNIT),
    (90, SynthParam::Osc1Level, UNIT),
    (91, SynthParam::Osc2Level, UNIT),
];

impl CcMap {
    /// Empty map.
    pub const fn new() -> Self {
        Self {
            entries: [None; CC_MAP_CAPACITY],
            count: 0,
        }
    }

    /// Number of mapped controllers.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// `true` when nothing is mapped.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of entries.
    #[inline]
    pub const fn capacity(&self) -> usize {
        CC_MAP_CAPACITY
    }

    /// Map `cc` to `param`, replacing any existing entry for `cc`.
    ///
    /// Returns `false` when `cc` is not a 7-bit controller number or the
    /// table is full.
    pub fn map(&mut self, cc: u8, param: SynthParam, curve: Curve) -> bool {
        if cc > 127 {
            return false;
        }
        let entry = CcEntry { cc, param, curve };
        for existing in self.entries.iter_mut().flatten() {
            if existing.cc == cc {
                *existing = entry;
                return true;
            }
        }
        for slot in &mut self.entries {
            if slot.is_none() {
                *slot = Some(entry);
                self.count += 1;
                return true;
            }
        }
        false
    }

    /// Remove the entry for `cc`. Returns `false` if it was not mapped.
    pub fn unmap(&mut self, cc: u8) -> bool {
        for slot in &mut self.entries {
            if let Some(entry) = slot
                && entry.cc == cc
            {
                *slot = None;
                self.count -= 1;
                return true;
            }
        }
        false
    }

    /// Entry for `cc`.
    #[inline]
    pub fn get(&self, cc: u8) -> Option<&CcEntry> {
        self.entries.iter().flatten().find(|entry| entry.cc == cc)
    }

    /// First controller mapped to `param`.
    pub fn cc_for(&self, param: SynthParam) -> Option<u8> {
        self.entries
            .iter()
            .flatten()
            .find(|entry| entry.param == param)
            .map(|entry| entry.cc)
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &CcEntry> {
        self.entries.iter().flatten()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries = [None; CC_MAP_CAPACITY];
        self.count = 0;
    }
}

impl Default for CcMap {
    /// The stock front-panel layout.
    fn default() -> Self {
        let mut map = Self::new();
        for (cc, param, curve) in DEFAULT_LAYOUT {
            map.map(cc, param, curve);
        }
        map
    }
}
