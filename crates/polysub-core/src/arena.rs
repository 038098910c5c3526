//! Startup memory budgeting for long-lived sample buffers.
//!
//! Embedded targets usually have a small fast internal RAM and an optional
//! large external region. Buffers are placed once, at startup: the
//! [`ArenaPlan`] picks the large region when it still has room and falls back
//! to internal memory otherwise. Nothing is placed or moved after that.
//!
//! On a host both regions are ordinary heap; the arena only does the
//! accounting, so the same construction code runs everywhere.

use crate::ring::RingBuffer;

/// Where a buffer was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Large, slower external memory (e.g. PSRAM).
    Large,
    /// Regular internal RAM.
    Internal,
}

/// Byte budgets of the two regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaPlan {
    /// Bytes available in the large region. Zero when absent.
    pub large_bytes: usize,
    /// Bytes available in internal RAM for arena use.
    pub internal_bytes: usize,
}

impl ArenaPlan {
    /// Region for a request of `bytes`: large first, internal as fallback,
    /// `None` when neither fits.
    pub fn select(&self, bytes: usize) -> Option<MemoryRegion> {
        if bytes <= self.large_bytes {
            Some(MemoryRegion::Large)
        } else if bytes <= self.internal_bytes {
            Some(MemoryRegion::Internal)
        } else {
            None
        }
    }
}

impl Default for ArenaPlan {
    fn default() -> Self {
        Self {
            large_bytes: 0,
            internal_bytes: 64 * 1024,
        }
    }
}

/// Arena allocation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaError {
    /// Bytes requested.
    pub requested: usize,
    /// Largest request that would still have fit.
    pub available: usize,
}

#[cfg(feature = "std")]
impl std::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "arena cannot place {} bytes ({} bytes available)",
            self.requested, self.available
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ArenaError {}

/// Budget tracker that hands out fixed-capacity buffers.
///
/// # Example
///
/// ```rust
/// use polysub_core::arena::{ArenaPlan, MemoryRegion, SampleArena};
///
/// let mut arena = SampleArena::new(ArenaPlan { large_bytes: 0, internal_bytes: 8192 });
/// let ring = arena.alloc_ring(1024).expect("fits in internal RAM");
/// assert_eq!(ring.capacity(), 1024);
/// assert_eq!(arena.last_region(), Some(MemoryRegion::Internal));
/// assert_eq!(arena.remaining().internal_bytes, 8192 - 2048);
/// ```
#[derive(Debug, Clone)]
pub struct SampleArena {
    remaining: ArenaPlan,
    last_region: Option<MemoryRegion>,
}

impl SampleArena {
    /// Start with the full budgets of `plan`.
    pub fn new(plan: ArenaPlan) -> Self {
        Self {
            remaining: plan,
            last_region: None,
        }
    }

    /// Budgets still available.
    pub fn remaining(&self) -> ArenaPlan {
        self.remaining
    }

    /// Region of the most recent successful allocation.
    pub fn last_region(&self) -> Option<MemoryRegion> {
        self.last_region
    }

    /// Reserve `bytes`, returning the region charged.
    pub fn reserve(&mut self, bytes: usize) -> Result<MemoryRegion, ArenaError> {
        let region = self.remaining.select(bytes).ok_or(ArenaError {
            requested: bytes,
            available: self.remaining.large_bytes.max(self.remaining.internal_bytes),
        })?;
        match region {
            MemoryRegion::Large => self.remaining.large_bytes -= bytes,
            MemoryRegion::Internal => self.remaining.internal_bytes -= bytes,
        }
        self.last_region = Some(region);
        #[cfg(feature = "tracing")]
        tracing::debug!("arena_reserve: {bytes} bytes in {region:?}");
        Ok(region)
    }

    /// Allocate a [`RingBuffer`] of `capacity` samples.
    pub fn alloc_ring(&mut self, capacity: usize) -> Result<RingBuffer, ArenaError> {
        let capacity = capacity.max(1);
        self.reserve(capacity * core::mem::size_of::<i16>())?;
        Ok(RingBuffer::with_capacity(capacity))
    }
}
