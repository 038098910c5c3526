//! Reference-counted pool of audio blocks.
//!
//! The [`BlockPool`] owns every [`Block`] the signal graph will ever use.
//! All storage is allocated once in [`BlockPool::new`]; after that the pool
//! only moves indices between its free list and the callers.
//!
//! A block handed out by [`acquire`](BlockPool::acquire) is represented by a
//! move-only [`BlockRef`]. Fanning a block out to several readers goes through
//! [`share`](BlockPool::share), which bumps the reference count and returns a
//! second handle to the same storage. Each handle must be given back with
//! [`release`](BlockPool::release); the block returns to the free list only
//! when the last handle is released.
//!
//! A shared block is read-only: [`write`](BlockPool::write) refuses mutable
//! access while more than one handle exists.
//!
//! Exhaustion is not an error. `acquire` returns `None`, the caller skips its
//! output for this tick and downstream nodes see silence.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::block::{AUDIO_BLOCK_SAMPLES, Block};

/// Handle to one pooled block.
///
/// Not `Clone`: a second handle can only be obtained through
/// [`BlockPool::share`], which keeps the reference count honest.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a BlockRef must be transmitted or released back to the pool"]
pub struct BlockRef(u16);

impl BlockRef {
    /// Index of the underlying block inside its pool.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Pool occupancy counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Total number of blocks.
    pub capacity: usize,
    /// Blocks currently held by at least one handle.
    pub in_use: usize,
    /// Highest `in_use` seen since construction or the last [`BlockPool::reset_peak`].
    pub peak_in_use: usize,
    /// Number of `acquire` calls that found the pool empty.
    pub exhaustion_count: u32,
}

/// Fixed-capacity pool of reference-counted [`Block`]s.
///
/// # Example
///
/// ```rust
/// use polysub_core::BlockPool;
///
/// let mut pool = BlockPool::new(4);
/// let block = pool.acquire().expect("pool has room");
/// let copy = pool.share(&block);
///
/// pool.release(block);
/// assert_eq!(pool.stats().in_use, 1); // still held by `copy`
///
/// pool.release(copy);
/// assert_eq!(pool.stats().in_use, 0);
/// ```
pub struct BlockPool {
    blocks: Vec<Block>,
    refs: Vec<u16>,
    free: Vec<u16>,
    peak_in_use: usize,
    exhaustion_count: u32,
}

impl BlockPool {
    /// Upper bound on pool size, limited by the 16-bit block index.
    pub const MAX_CAPACITY: usize = u16::MAX as usize;

    /// Preallocate `capacity` blocks. The capacity is clamped to
    /// `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Self::MAX_CAPACITY);
        // Free list is popped from the back, so store it reversed to hand out
        // low indices first.
        let free = (0..capacity as u16).rev().collect();
        Self {
            blocks: vec![[0; AUDIO_BLOCK_SAMPLES]; capacity],
            refs: vec![0; capacity],
            free,
            peak_in_use: 0,
            exhaustion_count: 0,
        }
    }

    /// Take a free block, or `None` if the pool is exhausted.
    ///
    /// The contents of a freshly acquired block are unspecified; the caller
    /// writes every sample before transmitting it.
    #[inline]
    pub fn acquire(&mut self) -> Option<BlockRef> {
        let Some(index) = self.free.pop() else {
            self.exhaustion_count = self.exhaustion_count.saturating_add(1);
            return None;
        };
        self.refs[index as usize] = 1;
        let in_use = self.in_use();
        if in_use > self.peak_in_use {
            self.peak_in_use = in_use;
        }
        Some(BlockRef(index))
    }

    /// Add a reader to `block` and return the new handle.
    #[inline]
    pub fn share(&mut self, block: &BlockRef) -> BlockRef {
        let count = &mut self.refs[block.index()];
        debug_assert!(*count > 0, "sharing a released block");
        *count = count.saturating_add(1);
        BlockRef(block.0)
    }

    /// Drop one handle. The block returns to the free list when its last
    /// handle is released.
    #[inline]
    pub fn release(&mut self, block: BlockRef) {
        let count = &mut self.refs[block.index()];
        debug_assert!(*count > 0, "double release of block {}", block.0);
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.free.push(block.0);
        }
    }

    /// Read access to a block's samples.
    #[inline]
    pub fn read(&self, block: &BlockRef) -> &Block {
        &self.blocks[block.index()]
    }

    /// Write access to a block's samples, or `None` while the block is shared.
    #[inline]
    pub fn write(&mut self, block: &BlockRef) -> Option<&mut Block> {
        if self.refs[block.index()] == 1 {
            Some(&mut self.blocks[block.index()])
        } else {
            None
        }
    }

    /// Current reference count of `block`.
    #[inline]
    pub fn ref_count(&self, block: &BlockRef) -> usize {
        self.refs[block.index()] as usize
    }

    /// Total number of blocks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks on the free list.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of blocks held by at least one handle.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.blocks.len() - self.free.len()
    }

    /// Snapshot of the occupancy counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
            peak_in_use: self.peak_in_use,
            exhaustion_count: self.exhaustion_count,
        }
    }

    /// Restart peak tracking from the current occupancy and clear the
    /// exhaustion counter.
    pub fn reset_peak(&mut self) {
        self.peak_in_use = self.in_use();
        self.exhaustion_count = 0;
    }
}

impl core::fmt::Debug for BlockPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockPool")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .field("peak_in_use", &self.peak_in_use)
            .finish_non_exhaustive()
    }
}
