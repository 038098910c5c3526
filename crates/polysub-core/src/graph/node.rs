//! The [`SignalNode`] capability and the per-update I/O context.
//!
//! A node sees the rest of the graph only through [`NodeIo`]: it receives the
//! blocks that upstream nodes transmitted to its input slots, acquires fresh
//! blocks from the pool, and transmits blocks to its output slots. Transmitting
//! shares the block once per outgoing link; the node still owns its own handle
//! and must release it.

use crate::block::{Block, FloatBlock, block_to_f32, f32_to_block};
use crate::pool::{BlockPool, BlockRef};

use super::link::Link;

/// Index of a node inside a [`SignalGraph`](super::SignalGraph).
///
/// Assigned sequentially by [`GraphBuilder::add_node`](super::GraphBuilder::add_node);
/// the order of assignment is the processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u16);

impl NodeId {
    /// Position of the node in processing order.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A block waiting in an input slot, together with the gain of the link that
/// delivered it.
#[derive(Debug)]
pub struct Input {
    pub(crate) block: BlockRef,
    pub(crate) gain: f32,
}

impl Input {
    /// Static gain of the delivering link.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Take the block handle out; the caller becomes responsible for releasing it.
    #[inline]
    pub fn into_block(self) -> BlockRef {
        self.block
    }
}

/// A processing stage in the signal graph.
///
/// `update` is called exactly once per tick, in registration order, from the
/// audio context. Implementations must not block, allocate or hold a
/// [`BlockRef`] past the end of the call.
///
/// Nodes with internal state that rings on without input (filters,
/// envelopes, oscillators) keep running their recurrences on missing inputs
/// instead of skipping the tick.
pub trait SignalNode: Send {
    /// Short static name for diagnostics and logging.
    fn name(&self) -> &'static str;

    /// Number of input slots.
    fn inputs(&self) -> usize;

    /// Number of output slots.
    fn outputs(&self) -> usize;

    /// Process one block.
    fn update(&mut self, io: &mut NodeIo<'_>);
}

/// The view of the graph a node gets during [`SignalNode::update`].
pub struct NodeIo<'a> {
    pub(crate) pool: &'a mut BlockPool,
    pub(crate) inbox: &'a mut [Option<Input>],
    pub(crate) input_base: usize,
    pub(crate) input_count: usize,
    pub(crate) links: &'a [Link],
    pub(crate) slot_base: &'a [u32],
}

impl NodeIo<'_> {
    /// Take whatever arrived on input `slot` this tick.
    ///
    /// Returns `None` when nothing was transmitted (upstream silent, pool
    /// exhausted, or the slot is unconnected). A second call for the same slot
    /// also returns `None`.
    #[inline]
    pub fn receive(&mut self, slot: usize) -> Option<Input> {
        if slot >= self.input_count {
            return None;
        }
        self.inbox[self.input_base + slot].take()
    }

    /// Receive input `slot` as floats with the link gain applied, releasing the
    /// block. A missing input yields zeros and `false`.
    pub fn receive_samples(&mut self, slot: usize, out: &mut FloatBlock) -> bool {
        match self.receive(slot) {
            Some(input) => {
                block_to_f32(self.pool.read(&input.block), input.gain, out);
                self.pool.release(input.block);
                true
            }
            None => {
                out.fill(0.0);
                false
            }
        }
    }

    /// Acquire a fresh block, or `None` when the pool is exhausted.
    #[inline]
    pub fn acquire(&mut self) -> Option<BlockRef> {
        self.pool.acquire()
    }

    /// Read a block's samples.
    #[inline]
    pub fn read(&self, block: &BlockRef) -> &Block {
        self.pool.read(block)
    }

    /// Write a block's samples; `None` if the block is shared.
    #[inline]
    pub fn write(&mut self, block: &BlockRef) -> Option<&mut Block> {
        self.pool.write(block)
    }

    /// Give a handle back to the pool.
    #[inline]
    pub fn release(&mut self, block: BlockRef) {
        self.pool.release(block);
    }

    /// Whether anything listens on `output`.
    #[inline]
    pub fn is_connected(&self, output: usize) -> bool {
        self.links.iter().any(|link| link.output as usize == output)
    }

    /// Share `block` to every link leaving `output`. The caller keeps (and must
    /// still release) its own handle.
    pub fn transmit(&mut self, block: &BlockRef, output: usize) {
        let links = self.links;
        for link in links.iter().filter(|link| link.output as usize == output) {
            let slot = self.slot_base[link.target.index()] as usize + link.input as usize;
            let delivered = Input {
                block: self.pool.share(block),
                gain: link.gain,
            };
            if let Some(stale) = self.inbox[slot].replace(delivered) {
                self.pool.release(stale.block);
            }
        }
    }

    /// Convert `samples` into a fresh block and transmit it on `output`.
    ///
    /// Returns `false` when the pool is exhausted, in which case nothing is
    /// sent and downstream nodes see silence. Skips the pool entirely when
    /// the output is unconnected.
    pub fn transmit_samples(&mut self, output: usize, samples: &FloatBlock) -> bool {
        if !self.is_connected(output) {
            return true;
        }
        let Some(block) = self.pool.acquire() else {
            return false;
        };
        if let Some(data) = self.pool.write(&block) {
            f32_to_block(samples, data);
        }
        self.transmit(&block, output);
        self.pool.release(block);
        true
    }
}
