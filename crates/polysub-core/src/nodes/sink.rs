use core::cell::RefCell;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use critical_section::Mutex;

use crate::block::{AUDIO_BLOCK_SAMPLES, FloatBlock};
use crate::graph::{NodeIo, SignalNode};

/// The most recent block delivered to an [`OutputSink`].
pub struct OutputBlock {
    samples: Mutex<RefCell<FloatBlock>>,
}

impl OutputBlock {
    /// Silent block.
    pub const fn new() -> Self {
        Self {
            samples: Mutex::new(RefCell::new([0.0; AUDIO_BLOCK_SAMPLES])),
        }
    }

    /// Copy the latest block into `out`.
    pub fn read(&self, out: &mut FloatBlock) {
        critical_section::with(|cs| out.copy_from_slice(&*self.samples.borrow_ref(cs)));
    }

    fn store(&self, samples: &FloatBlock) {
        critical_section::with(|cs| {
            self.samples.borrow_ref_mut(cs).copy_from_slice(samples);
        });
    }
}

impl Default for OutputBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Final summed output of the graph.
///
/// Converts its input to floats each tick; a missing input stores silence.
pub struct OutputSink {
    out: Arc<OutputBlock>,
    scratch: FloatBlock,
}

impl OutputSink {
    /// Sink publishing into `out`.
    pub fn new(out: Arc<OutputBlock>) -> Self {
        Self {
            out,
            scratch: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }
}

impl SignalNode for OutputSink {
    fn name(&self) -> &'static str {
        "output"
    }

    fn inputs(&self) -> usize {
        1
    }

    fn outputs(&self) -> usize {
        0
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        io.receive_samples(0, &mut self.scratch);
        self.out.store(&self.scratch);
    }
}
