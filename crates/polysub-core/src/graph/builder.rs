//! Construction-time wiring of the signal graph.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::pool::BlockPool;

use super::link::{Link, LinkId, MAX_FANOUT};
use super::node::{NodeId, SignalNode};
use super::scheduler::SignalGraph;

/// Errors raised while wiring a graph.
///
/// Only [`GraphBuilder`] can fail; a built [`SignalGraph`] never returns errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The node id does not belong to this builder.
    NodeNotFound(NodeId),
    /// The source node has no such output slot.
    InvalidOutput {
        /// Node that was asked for the slot.
        node: NodeId,
        /// Requested output slot.
        slot: usize,
    },
    /// The target node has no such input slot.
    InvalidInput {
        /// Node that was asked for the slot.
        node: NodeId,
        /// Requested input slot.
        slot: usize,
    },
    /// The target was registered before the source. Processing order is
    /// registration order, so the target would read last tick's silence.
    OrderViolation {
        /// Producing node.
        source: NodeId,
        /// Consuming node.
        target: NodeId,
    },
    /// The input slot already has a link. Sum through a mixer instead.
    InputOccupied {
        /// Node owning the slot.
        node: NodeId,
        /// Occupied input slot.
        slot: usize,
    },
    /// The output slot already feeds [`MAX_FANOUT`] links.
    FanoutExceeded {
        /// Node owning the slot.
        node: NodeId,
        /// Saturated output slot.
        slot: usize,
    },
    /// Node or link ids would overflow their 16-bit index.
    TooManyNodes,
}

#[cfg(feature = "std")]
impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::InvalidOutput { node, slot } => write!(f, "{node} has no output slot {slot}"),
            Self::InvalidInput { node, slot } => write!(f, "{node} has no input slot {slot}"),
            Self::OrderViolation { source, target } => {
                write!(f, "{target} is registered before its source {source}")
            }
            Self::InputOccupied { node, slot } => {
                write!(f, "input slot {slot} of {node} is already connected")
            }
            Self::FanoutExceeded { node, slot } => {
                write!(f, "output slot {slot} of {node} exceeds {MAX_FANOUT} links")
            }
            Self::TooManyNodes => write!(f, "graph exceeds the 16-bit id space"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Collects nodes and links, then freezes them into a [`SignalGraph`].
///
/// Nodes must be added upstream-first: a link is only accepted from an
/// earlier node to a later one, so registration order is a valid
/// processing order and no sort is needed at build time.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use polysub_core::{BlockPool, GraphBuilder, ParamCell};
/// use polysub_core::nodes::{DcSource, OutputBlock, OutputSink};
///
/// let mut builder = GraphBuilder::new();
/// let dc = builder.add_node(Box::new(DcSource::new(Arc::new(ParamCell::new(0.5)))))?;
/// let sink = builder.add_node(Box::new(OutputSink::new(Arc::new(OutputBlock::new()))))?;
/// builder.connect(dc, 0, sink, 0, 1.0)?;
///
/// let mut graph = builder.build(BlockPool::new(8));
/// graph.tick();
/// assert_eq!(graph.pool_stats().in_use, 0);
/// # Ok::<(), polysub_core::GraphError>(())
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Box<dyn SignalNode>>,
    links: Vec<Link>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Its id is its position in processing order.
    pub fn add_node(&mut self, node: Box<dyn SignalNode>) -> Result<NodeId, GraphError> {
        let index = u16::try_from(self.nodes.len()).map_err(|_| GraphError::TooManyNodes)?;
        let id = NodeId(index);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", node.name());
        self.nodes.push(node);
        Ok(id)
    }

    /// Link `source`'s `output` slot to `target`'s `input` slot with a static gain.
    pub fn connect(
        &mut self,
        source: NodeId,
        output: usize,
        target: NodeId,
        input: usize,
        gain: f32,
    ) -> Result<LinkId, GraphError> {
        let src = self
            .nodes
            .get(source.index())
            .ok_or(GraphError::NodeNotFound(source))?;
        let dst = self
            .nodes
            .get(target.index())
            .ok_or(GraphError::NodeNotFound(target))?;

        if target <= source {
            return Err(GraphError::OrderViolation { source, target });
        }
        if output >= src.outputs() || output > u8::MAX as usize {
            return Err(GraphError::InvalidOutput {
                node: source,
                slot: output,
            });
        }
        if input >= dst.inputs() || input > u8::MAX as usize {
            return Err(GraphError::InvalidInput {
                node: target,
                slot: input,
            });
        }
        if self
            .links
            .iter()
            .any(|l| l.target == target && l.input as usize == input)
        {
            return Err(GraphError::InputOccupied {
                node: target,
                slot: input,
            });
        }
        let fanout = self
            .links
            .iter()
            .filter(|l| l.source == source && l.output as usize == output)
            .count();
        if fanout >= MAX_FANOUT {
            return Err(GraphError::FanoutExceeded {
                node: source,
                slot: output,
            });
        }

        let id = LinkId(u16::try_from(self.links.len()).map_err(|_| GraphError::TooManyNodes)?);
        self.links.push(Link {
            source,
            output: output as u8,
            target,
            input: input as u8,
            gain,
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {source}:{output} → {target}:{input} (gain={gain:.2})");
        Ok(id)
    }

    /// Number of nodes registered so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links created so far.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Freeze the topology into a routing table backed by `pool`.
    pub fn build(self, pool: BlockPool) -> SignalGraph {
        SignalGraph::from_parts(self.nodes, self.links, pool)
    }
}
