//! Fixed-capacity sample ring buffer.
//!
//! Capacity is chosen once, at construction, from a
//! [`SampleArena`](crate::arena::SampleArena). Writes overwrite the oldest
//! samples; nothing is reallocated afterwards.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Ring of 16-bit samples holding the most recent `capacity` writes.
///
/// # Example
///
/// ```rust
/// use polysub_core::RingBuffer;
///
/// let mut ring = RingBuffer::with_capacity(4);
/// ring.push_slice(&[1, 2, 3, 4, 5, 6]);
///
/// let mut out = [0i16; 4];
/// assert_eq!(ring.latest(&mut out), 4);
/// assert_eq!(out, [3, 4, 5, 6]);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<i16>,
    write: usize,
    len: usize,
}

impl RingBuffer {
    /// Allocate a ring of `capacity` samples (at least one).
    ///
    /// Prefer [`SampleArena::alloc_ring`](crate::arena::SampleArena::alloc_ring)
    /// so the allocation is accounted against a memory region.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut data = Vec::with_capacity(capacity);
        data.resize(capacity, 0);
        Self {
            data,
            write: 0,
            len: 0,
        }
    }

    /// Maximum number of samples held.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of valid samples (saturates at capacity).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` before the first write or after [`clear`](Self::clear).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one sample, overwriting the oldest when full.
    #[inline]
    pub fn push(&mut self, sample: i16) {
        self.data[self.write] = sample;
        self.write += 1;
        if self.write == self.data.len() {
            self.write = 0;
        }
        if self.len < self.data.len() {
            self.len += 1;
        }
    }

    /// Append a run of samples.
    pub fn push_slice(&mut self, samples: &[i16]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Copy the newest `min(out.len(), len())` samples into `out`, oldest first.
    /// Returns the number copied.
    pub fn latest(&self, out: &mut [i16]) -> usize {
        let count = out.len();
        let mut copied = 0;
        for (dst, sample) in out.iter_mut().zip(self.iter_latest(count)) {
            *dst = sample;
            copied += 1;
        }
        copied
    }

    /// Iterate the newest `min(count, len())` samples, oldest first.
    pub fn iter_latest(&self, count: usize) -> impl Iterator<Item = i16> + '_ {
        let count = count.min(self.len);
        let capacity = self.data.len();
        let start = (self.write + capacity - count) % capacity;
        (0..count).map(move |i| self.data[(start + i) % capacity])
    }

    /// Forget all samples.
    pub fn clear(&mut self) {
        self.write = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_fill() {
        let mut ring = RingBuffer::with_capacity(8);
        ring.push_slice(&[10, 20, 30]);
        let mut out = [0i16; 8];
        assert_eq!(ring.latest(&mut out), 3);
        assert_eq!(&out[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_wraparound_keeps_newest() {
        let mut ring = RingBuffer::with_capacity(3);
        for v in 0..10 {
            ring.push(v);
        }
        assert_eq!(ring.len(), 3);
        let mut out = [0i16; 2];
        assert_eq!(ring.latest(&mut out), 2);
        assert_eq!(out, [8, 9]);
    }

    #[test]
    fn test_clear() {
        let mut ring = RingBuffer::with_capacity(4);
        ring.push_slice(&[1, 2]);
        ring.clear();
        assert!(ring.is_empty());
        let mut out = [7i16; 2];
        assert_eq!(ring.latest(&mut out), 0);
        assert_eq!(out, [7, 7]);
    }
}
