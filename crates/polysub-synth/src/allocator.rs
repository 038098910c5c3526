//! Note-to-voice allocation with least-recently-triggered stealing.

/// Highest MIDI note; higher notes are clamped to it.
pub const MAX_NOTE: u8 = 127;

/// Whether a voice is bound to a held note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Available. May still be sounding its release tail.
    #[default]
    Free,
    /// Bound to a note.
    Sounding,
}

/// One voice's allocation record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceSlot {
    /// Note last assigned to the voice.
    pub note: u8,
    /// Free or sounding.
    pub state: VoiceState,
    /// Counter value of the last trigger; 0 for a voice never used.
    pub timestamp: u64,
}

/// Result of [`VoiceAllocator::note_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// The note was already sounding on `voice`; it retriggers in place.
    Retrigger {
        /// Voice index.
        voice: usize,
    },
    /// A free voice was taken.
    Fresh {
        /// Voice index.
        voice: usize,
    },
    /// Every voice was busy; the least recently triggered one was stolen.
    Stolen {
        /// Voice index.
        voice: usize,
        /// Note that was playing on it.
        previous_note: u8,
    },
}

impl Allocation {
    /// Voice the note ended up on.
    pub fn voice(self) -> usize {
        match self {
            Self::Retrigger { voice } | Self::Fresh { voice } | Self::Stolen { voice, .. } => voice,
        }
    }
}

/// Maps the 128 MIDI notes onto `N` voices.
///
/// A free voice is preferred, the one released longest ago first. With no
/// voice free, the sounding voice with the oldest trigger is stolen.
///
/// # Example
///
/// ```rust
/// use polysub_synth::{Allocation, VoiceAllocator};
///
/// let mut alloc: VoiceAllocator<2> = VoiceAllocator::new();
/// assert_eq!(alloc.note_on(60), Allocation::Fresh { voice: 0 });
/// assert_eq!(alloc.note_on(64), Allocation::Fresh { voice: 1 });
/// assert_eq!(alloc.note_on(67), Allocation::Stolen { voice: 0, previous_note: 60 });
/// assert_eq!(alloc.note_off(60), None);
/// ```
///
/// `N` must be between 1 and 256; anything else fails to build:
///
/// ```compile_fail
/// let _ = polysub_synth::VoiceAllocator::<0>::new();
/// ```
#[derive(Debug, Clone)]
pub struct VoiceAllocator<const N: usize> {
    slots: [VoiceSlot; N],
    note_to_voice: [Option<u8>; 128],
    clock: u64,
}

impl<const N: usize> VoiceAllocator<N> {
    const VOICE_COUNT_OK: () = assert!(
        N > 0 && N <= u8::MAX as usize + 1,
        "VoiceAllocator needs 1..=256 voices"
    );

    /// All voices free.
    pub fn new() -> Self {
        let () = Self::VOICE_COUNT_OK;
        Self {
            slots: [VoiceSlot::default(); N],
            note_to_voice: [None; 128],
            clock: 0,
        }
    }

    /// Number of voices.
    pub const fn voice_count(&self) -> usize {
        N
    }

    /// Assign `note` to a voice.
    pub fn note_on(&mut self, note: u8) -> Allocation {
        let note = note.min(MAX_NOTE);
        self.clock += 1;
        let stamp = self.clock;

        if let Some(voice) = self.note_to_voice[note as usize] {
            let voice = voice as usize;
            self.slots[voice].timestamp = stamp;
            return Allocation::Retrigger { voice };
        }

        let free = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state == VoiceState::Free)
            .min_by_key(|(_, slot)| slot.timestamp)
            .map(|(i, _)| i);

        let allocation = match free {
            Some(voice) => Allocation::Fresh { voice },
            None => {
                let voice = (1..N).fold(0, |oldest, i| {
                    if self.slots[i].timestamp < self.slots[oldest].timestamp {
                        i
                    } else {
                        oldest
                    }
                });
                let previous_note = self.slots[voice].note;
                self.note_to_voice[previous_note as usize] = None;
                Allocation::Stolen {
                    voice,
                    previous_note,
                }
            }
        };

        let voice = allocation.voice();
        self.slots[voice] = VoiceSlot {
            note,
            state: VoiceState::Sounding,
            timestamp: stamp,
        };
        self.note_to_voice[note as usize] = Some(voice as u8);
        allocation
    }

    /// Release `note`. Returns the voice it was on, or `None` if the note
    /// is not mapped (never played, already released, or stolen).
    pub fn note_off(&mut self, note: u8) -> Option<usize> {
        let note = note.min(MAX_NOTE);
        let voice = self.note_to_voice[note as usize].take()? as usize;
        self.slots[voice].state = VoiceState::Free;
        Some(voice)
    }

    /// Release every sounding voice. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        self.note_to_voice = [None; 128];
        let mut released = 0;
        for slot in &mut self.slots {
            if slot.state == VoiceState::Sounding {
                slot.state = VoiceState::Free;
                released += 1;
            }
        }
        released
    }

    /// Number of voices bound to a note.
    pub fn sounding_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == VoiceState::Sounding)
            .count()
    }

    /// Voice currently playing `note`.
    pub fn voice_for(&self, note: u8) -> Option<usize> {
        self.note_to_voice[note.min(MAX_NOTE) as usize].map(usize::from)
    }

    /// Allocation record of `voice`.
    pub fn slot(&self, voice: usize) -> Option<&VoiceSlot> {
        self.slots.get(voice)
    }
}

impl<const N: usize> Default for VoiceAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}
