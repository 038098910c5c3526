//! Lock-free parameter cells shared between the control context and the
//! audio tick, plus batched transactions.
//!
//! A setter writes exactly one primitive through an atomic store; the next
//! tick picks it up. Nothing tears, because every field is a single machine
//! word. A change may land one tick late, which is fine for knobs.
//!
//! Changes that must appear together (a preset, an LFO re-route) are staged
//! in a [`Transaction`] and committed inside one critical section. The audio
//! tick runs inside a critical section as well, so it sees either none or all
//! of a committed batch.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// An `f32` parameter stored as its bit pattern in an [`AtomicU32`].
///
/// # Example
///
/// ```rust
/// use polysub_core::ParamCell;
///
/// let cutoff = ParamCell::new(1000.0);
/// cutoff.set(440.0);
/// assert_eq!(cutoff.get(), 440.0);
/// ```
pub struct ParamCell(AtomicU32);

impl ParamCell {
    /// Create a cell holding `value`.
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Store a new value.
    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for ParamCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl core::fmt::Debug for ParamCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ParamCell").field(&self.get()).finish()
    }
}

/// A small enumerated choice (waveform, filter model, mode row).
#[derive(Default)]
pub struct ChoiceCell(AtomicU8);

impl ChoiceCell {
    /// Create a cell holding `value`.
    pub const fn new(value: u8) -> Self {
        Self(AtomicU8::new(value))
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    /// Store a new value.
    #[inline]
    pub fn set(&self, value: u8) {
        self.0.store(value, Ordering::Relaxed);
    }
}

impl core::fmt::Debug for ChoiceCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ChoiceCell").field(&self.get()).finish()
    }
}

/// Note-on/note-off signalling for envelope nodes.
///
/// Every [`open`](Self::open) bumps a generation counter, so the audio side
/// notices a retrigger even if the gate was never seen closed in between.
#[derive(Debug, Default)]
pub struct GateCell {
    generation: AtomicU32,
    held: AtomicBool,
    velocity: ParamCell,
}

impl GateCell {
    /// Create a closed gate.
    pub const fn new() -> Self {
        Self {
            generation: AtomicU32::new(0),
            held: AtomicBool::new(false),
            velocity: ParamCell::new(1.0),
        }
    }

    /// Open (or retrigger) the gate with a velocity in `0.0..=1.0`.
    pub fn open(&self, velocity: f32) {
        self.velocity.set(velocity.clamp(0.0, 1.0));
        self.held.store(true, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Close the gate. The generation is left alone.
    pub fn close(&self) {
        self.held.store(false, Ordering::Relaxed);
    }

    /// Number of opens so far (wrapping).
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether the gate is currently held.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }

    /// Velocity of the latest open.
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.velocity.get()
    }
}

/// A fixed-capacity batch of staged writes, applied in one critical section.
///
/// Staging never allocates; [`stage`](Self::stage) returns `false` once the
/// batch is full and the item is dropped.
///
/// # Example
///
/// ```rust
/// use polysub_core::{ParamCell, Transaction};
///
/// let a = ParamCell::new(0.0);
/// let b = ParamCell::new(1.0);
///
/// let mut tx: Transaction<_, 4> = Transaction::new();
/// tx.set(&a, 1.0);
/// tx.set(&b, 0.0);
/// assert_eq!(tx.apply(), 2);
/// assert_eq!((a.get(), b.get()), (1.0, 0.0));
/// ```
pub struct Transaction<T: Copy, const N: usize> {
    staged: [Option<T>; N],
    len: usize,
}

/// A staged write of `value` into a [`ParamCell`].
pub type CellWrite<'a> = (&'a ParamCell, f32);

impl<T: Copy, const N: usize> Transaction<T, N> {
    /// Create an empty batch.
    pub const fn new() -> Self {
        Self {
            staged: [None; N],
            len: 0,
        }
    }

    /// Add an item. Returns `false` (dropping the item) when full.
    pub fn stage(&mut self, item: T) -> bool {
        if self.len == N {
            return false;
        }
        self.staged[self.len] = Some(item);
        self.len += 1;
        true
    }

    /// Number of staged items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of items.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Staged items in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.staged[..self.len].iter().flatten()
    }

    /// Apply every staged item with `apply` inside a single critical section.
    /// Returns the number of items applied.
    pub fn commit<F: FnMut(T)>(self, mut apply: F) -> usize {
        let len = self.len;
        critical_section::with(|_| {
            for item in self.staged[..len].iter().flatten() {
                apply(*item);
            }
        });
        len
    }
}

impl<T: Copy, const N: usize> Default for Transaction<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> Transaction<CellWrite<'a>, N> {
    /// Stage `cell = value`.
    pub fn set(&mut self, cell: &'a ParamCell, value: f32) -> bool {
        self.stage((cell, value))
    }

    /// Commit all staged cell writes.
    pub fn apply(self) -> usize {
        self.commit(|(cell, value)| cell.set(value))
    }
}
