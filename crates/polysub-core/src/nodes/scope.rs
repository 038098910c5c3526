use core::cell::RefCell;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use critical_section::Mutex;

use crate::block::sample_to_f32;
use crate::graph::{NodeIo, SignalNode};
use crate::ring::RingBuffer;

/// Shared capture buffer written by a [`ScopeTap`] and read by a display.
pub struct Scope {
    ring: Mutex<RefCell<RingBuffer>>,
}

impl Scope {
    /// Scope capturing into `ring`.
    pub fn new(ring: RingBuffer) -> Self {
        Self {
            ring: Mutex::new(RefCell::new(ring)),
        }
    }

    /// Copy the newest samples into `out`, oldest first. Returns the count.
    pub fn snapshot(&self, out: &mut [f32]) -> usize {
        critical_section::with(|cs| {
            let ring = self.ring.borrow_ref(cs);
            let count = out.len();
            let mut copied = 0;
            for (dst, sample) in out.iter_mut().zip(ring.iter_latest(count)) {
                *dst = sample_to_f32(sample);
                copied += 1;
            }
            copied
        })
    }

    /// Capacity of the capture ring.
    pub fn capacity(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).capacity())
    }

    fn record(&self, samples: &[i16]) {
        critical_section::with(|cs| self.ring.borrow_ref_mut(cs).push_slice(samples));
    }
}

/// Passive monitoring endpoint.
///
/// Reads its single input and copies it into a [`Scope`]. It never writes to
/// the block and has no outputs, so the signal path it hangs off is left
/// untouched.
pub struct ScopeTap {
    scope: Arc<Scope>,
}

impl ScopeTap {
    /// Tap recording into `scope`.
    pub fn new(scope: Arc<Scope>) -> Self {
        Self { scope }
    }
}

impl SignalNode for ScopeTap {
    fn name(&self) -> &'static str {
        "scope_tap"
    }

    fn inputs(&self) -> usize {
        1
    }

    fn outputs(&self) -> usize {
        0
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        match io.receive(0) {
            Some(input) => {
                let block = input.into_block();
                self.scope.record(io.read(&block));
                io.release(block);
            }
            None => self.scope.record(&crate::block::SILENT_BLOCK),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_returns_newest_oldest_first() {
        let scope = Scope::new(RingBuffer::with_capacity(4));
        scope.record(&[0, 8192, 16384, -16384, -8192]);
        let mut out = [9.0f32; 2];
        assert_eq!(scope.snapshot(&mut out), 2);
        assert_eq!(out, [-0.5, -0.25]);

        let mut wide = [9.0f32; 6];
        assert_eq!(scope.snapshot(&mut wide), 4);
        assert_eq!(&wide[..4], &[0.25, 0.5, -0.5, -0.25]);
        assert_eq!(wide[4], 9.0);
    }
}
