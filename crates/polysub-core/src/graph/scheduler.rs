//! The frozen graph and its per-tick sweep.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::pool::{BlockPool, PoolStats};

use super::link::{Link, LinkId};
use super::node::{Input, NodeId, NodeIo, SignalNode};

/// A built signal graph: nodes in processing order, a routing table and the
/// block pool they share.
///
/// Links are stored grouped by source node, so each node's outgoing links are
/// one contiguous slice. `link_slot` maps a [`LinkId`] (creation order) to
/// the link's position in that layout. Input slots of all nodes live in one flat inbox;
/// `slot_base[i]..slot_base[i + 1]` are node `i`'s slots.
pub struct SignalGraph {
    nodes: Vec<Box<dyn SignalNode>>,
    links: Vec<Link>,
    link_slot: Vec<u16>,
    link_ranges: Vec<(u32, u32)>,
    slot_base: Vec<u32>,
    inbox: Vec<Option<Input>>,
    pool: BlockPool,
    ticks: u64,
}

impl SignalGraph {
    pub(crate) fn from_parts(
        nodes: Vec<Box<dyn SignalNode>>,
        created: Vec<Link>,
        pool: BlockPool,
    ) -> Self {
        // Stable, so links from one source keep their creation order.
        let mut order: Vec<usize> = (0..created.len()).collect();
        order.sort_by_key(|&index| created[index].source);
        let mut link_slot = Vec::with_capacity(created.len());
        link_slot.resize(created.len(), 0u16);
        for (position, &index) in order.iter().enumerate() {
            link_slot[index] = position as u16;
        }
        let links: Vec<Link> = order.iter().map(|&index| created[index]).collect();

        let mut link_ranges = Vec::with_capacity(nodes.len());
        let mut cursor = 0usize;
        for index in 0..nodes.len() {
            let start = cursor;
            while cursor < links.len() && links[cursor].source.index() == index {
                cursor += 1;
            }
            link_ranges.push((start as u32, cursor as u32));
        }

        let mut slot_base = Vec::with_capacity(nodes.len() + 1);
        let mut total = 0u32;
        for node in &nodes {
            slot_base.push(total);
            total += node.inputs() as u32;
        }
        slot_base.push(total);

        let inbox = (0..total).map(|_| None).collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_build: {} nodes, {} links, {} input slots, pool of {} blocks",
            nodes.len(),
            links.len(),
            total,
            pool.capacity()
        );

        Self {
            nodes,
            links,
            link_slot,
            link_ranges,
            slot_base,
            inbox,
            pool,
            ticks: 0,
        }
    }

    /// Run one block: `update()` every node once, in registration order.
    ///
    /// Inputs a node leaves unconsumed are released right after its update,
    /// so every block is back in the pool when the sweep ends.
    pub fn tick(&mut self) {
        let Self {
            nodes,
            links,
            link_slot: _,
            link_ranges,
            slot_base,
            inbox,
            pool,
            ticks,
        } = self;

        for (index, node) in nodes.iter_mut().enumerate() {
            let (start, end) = link_ranges[index];
            let base = slot_base[index] as usize;
            let count = slot_base[index + 1] as usize - base;
            {
                let mut io = NodeIo {
                    pool: &mut *pool,
                    inbox: &mut inbox[..],
                    input_base: base,
                    input_count: count,
                    links: &links[start as usize..end as usize],
                    slot_base: &slot_base[..],
                };
                node.update(&mut io);
            }
            for slot in &mut inbox[base..base + count] {
                if let Some(unread) = slot.take() {
                    pool.release(unread.block);
                }
            }
        }
        *ticks += 1;
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Diagnostic name of a node.
    pub fn node_name(&self, id: NodeId) -> Option<&'static str> {
        self.nodes.get(id.index()).map(|node| node.name())
    }

    /// The link `connect` returned `id` for.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        let slot = *self.link_slot.get(id.index())?;
        self.links.get(slot as usize)
    }

    /// Links leaving `id`.
    pub fn links_from(&self, id: NodeId) -> &[Link] {
        match self.link_ranges.get(id.index()) {
            Some(&(start, end)) => &self.links[start as usize..end as usize],
            None => &[],
        }
    }

    /// Pool occupancy counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Restart the pool's peak tracking.
    pub fn reset_pool_peak(&mut self) {
        self.pool.reset_peak();
    }
}

impl core::fmt::Debug for SignalGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalGraph")
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("pool", &self.pool)
            .field("ticks", &self.ticks)
            .finish()
    }
}
