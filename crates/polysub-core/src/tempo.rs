//! Musical time for tempo-synced modulation.
//!
//! The synth never owns a clock. Whatever keeps time (an external MIDI clock
//! parser, a sequencer, a tap-tempo button) implements [`TempoSource`], and
//! LFO rates are derived from it on request. [`TempoManager`] is the simple
//! free-running implementation.

/// Note lengths an LFO cycle can be locked to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteDivision {
    /// Four beats.
    Whole,
    /// Two beats.
    Half,
    /// One beat.
    #[default]
    Quarter,
    /// Half a beat.
    Eighth,
    /// Quarter of a beat.
    Sixteenth,
    /// Three beats.
    DottedHalf,
    /// One and a half beats.
    DottedQuarter,
    /// Three quarters of a beat.
    DottedEighth,
    /// Two thirds of a beat.
    TripletQuarter,
    /// One third of a beat.
    TripletEighth,
}

impl NoteDivision {
    /// All divisions, longest first within each family.
    pub const ALL: [Self; 10] = [
        Self::Whole,
        Self::Half,
        Self::Quarter,
        Self::Eighth,
        Self::Sixteenth,
        Self::DottedHalf,
        Self::DottedQuarter,
        Self::DottedEighth,
        Self::TripletQuarter,
        Self::TripletEighth,
    ];

    /// Length in beats.
    pub fn beats(self) -> f32 {
        match self {
            Self::Whole => 4.0,
            Self::Half => 2.0,
            Self::Quarter => 1.0,
            Self::Eighth => 0.5,
            Self::Sixteenth => 0.25,
            Self::DottedHalf => 3.0,
            Self::DottedQuarter => 1.5,
            Self::DottedEighth => 0.75,
            Self::TripletQuarter => 2.0 / 3.0,
            Self::TripletEighth => 1.0 / 3.0,
        }
    }

    /// Cycles per second at `bpm`.
    ///
    /// ```rust
    /// use polysub_core::NoteDivision;
    ///
    /// assert!((NoteDivision::Quarter.to_hz(120.0) - 2.0).abs() < 1e-6);
    /// assert!((NoteDivision::DottedEighth.to_hz(90.0) - 2.0).abs() < 1e-6);
    /// ```
    pub fn to_hz(self, bpm: f32) -> f32 {
        bpm / 60.0 / self.beats()
    }
}

/// Anything that can report a tempo.
pub trait TempoSource {
    /// Beats per minute.
    fn bpm(&self) -> f32;

    /// Rate in Hz of one `division` per cycle.
    fn division_to_hz(&self, division: NoteDivision) -> f32 {
        division.to_hz(self.bpm())
    }
}

/// Free-running clock with a settable tempo.
///
/// # Example
///
/// ```rust
/// use polysub_core::{NoteDivision, TempoManager, TempoSource};
///
/// let mut tempo = TempoManager::new(44100.0, 120.0);
/// tempo.advance(44100);
/// assert!((tempo.beat_position() - 2.0).abs() < 1e-3);
/// assert!((tempo.division_to_hz(NoteDivision::Eighth) - 4.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct TempoManager {
    bpm: f32,
    sample_rate: f32,
    position: u64,
}

impl TempoManager {
    /// Lowest accepted tempo.
    pub const MIN_BPM: f32 = 20.0;
    /// Highest accepted tempo.
    pub const MAX_BPM: f32 = 300.0;

    /// Clock at `bpm` (clamped to the accepted range).
    pub fn new(sample_rate: f32, bpm: f32) -> Self {
        Self {
            bpm: bpm.clamp(Self::MIN_BPM, Self::MAX_BPM),
            sample_rate,
            position: 0,
        }
    }

    /// Change the tempo (clamped).
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.clamp(Self::MIN_BPM, Self::MAX_BPM);
    }

    /// Move the clock forward by `samples`.
    pub fn advance(&mut self, samples: usize) {
        self.position += samples as u64;
    }

    /// Elapsed beats since construction or [`reset`](Self::reset).
    pub fn beat_position(&self) -> f32 {
        self.position as f32 / (self.sample_rate * 60.0 / self.bpm)
    }

    /// Back to beat zero.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl TempoSource for TempoManager {
    fn bpm(&self) -> f32 {
        self.bpm
    }
}

impl Default for TempoManager {
    fn default() -> Self {
        Self::new(44100.0, 120.0)
    }
}
