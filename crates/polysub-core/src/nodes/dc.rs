#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::block::{AUDIO_BLOCK_SAMPLES, f32_to_sample};
use crate::graph::{NodeIo, SignalNode};
use crate::param_cell::ParamCell;

/// Constant-level source, e.g. envelope drive or key-tracking offset.
///
/// Transmits a block filled with the cell's current value; a level of exactly
/// zero transmits nothing.
pub struct DcSource {
    level: Arc<ParamCell>,
}

impl DcSource {
    /// Source driven by `level` (normalized, clamped to [-1, 1] on output).
    pub fn new(level: Arc<ParamCell>) -> Self {
        Self { level }
    }

    /// Shared handle to the level cell.
    pub fn level(&self) -> Arc<ParamCell> {
        Arc::clone(&self.level)
    }
}

impl SignalNode for DcSource {
    fn name(&self) -> &'static str {
        "dc"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        let value = f32_to_sample(self.level.get());
        if value == 0 || !io.is_connected(0) {
            return;
        }
        let Some(block) = io.acquire() else {
            return;
        };
        if let Some(data) = io.write(&block) {
            *data = [value; AUDIO_BLOCK_SAMPLES];
        }
        io.transmit(&block, 0);
        io.release(block);
    }
}
