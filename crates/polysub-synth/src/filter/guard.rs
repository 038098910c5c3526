//! Divergence detection for filter states.

use polysub_core::math::is_bounded;

/// Blocks of forced silence after a guard trip, counting the block in which
/// it tripped.
pub const GUARD_COOLDOWN_BLOCKS: u8 = 4;

/// Largest state magnitude still considered healthy.
pub const GUARD_LIMIT: f32 = 1.0e4;

/// Tracks guard trips and the mute cooldown of one filter core.
///
/// The core calls [`check`](Self::check) on its states every sample. A
/// failed check counts a trip and starts the cooldown; the core then zeroes
/// its states and keeps processing, while [`is_muted`](Self::is_muted) tells
/// it to output silence until the cooldown has run out.
#[derive(Debug, Clone, Default)]
pub struct StateGuard {
    cooldown: u8,
    trips: u32,
}

impl StateGuard {
    /// Fresh guard.
    pub const fn new() -> Self {
        Self {
            cooldown: 0,
            trips: 0,
        }
    }

    /// `true` when every value is finite and within [`GUARD_LIMIT`]. On
    /// failure the trip is recorded and the cooldown restarts.
    #[inline]
    pub fn check(&mut self, values: &[f32]) -> bool {
        if values.iter().all(|&v| is_bounded(v, GUARD_LIMIT)) {
            return true;
        }
        self.trips = self.trips.saturating_add(1);
        self.cooldown = GUARD_COOLDOWN_BLOCKS;
        false
    }

    /// Whether output is forced to silence.
    #[inline]
    pub fn is_muted(&self) -> bool {
        self.cooldown > 0
    }

    /// Count down the cooldown; call once at the end of every block.
    #[inline]
    pub fn end_block(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Number of trips since construction.
    pub fn trip_count(&self) -> u32 {
        self.trips
    }
}
