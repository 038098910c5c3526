//! Static signal graph driven once per audio tick.
//!
//! The graph is wired once at startup and never changes shape afterwards:
//!
//! - [`GraphBuilder`] collects boxed [`SignalNode`]s and [`Link`]s, validating
//!   each connection as it is made ([`GraphError`]).
//! - [`GraphBuilder::build`] freezes everything into a [`SignalGraph`], a
//!   routing table indexed by small integers with one flat inbox of input
//!   slots.
//! - [`SignalGraph::tick`] calls every node's `update()` once, in registration
//!   order.
//!
//! # Block flow
//!
//! Blocks come from the [`BlockPool`](crate::BlockPool) the graph owns. During
//! its update a node receives blocks from its input slots, acquires output
//! blocks, writes them and transmits them. Transmission shares the block once
//! per outgoing link and drops the shared handle into the target's input
//! slot. Everything a node still holds at the end of its update is released,
//! and the scheduler releases inputs the node never looked at, so the pool is
//! full again at the end of each tick.
//!
//! A missing input is silence. When the pool runs dry a producer simply sends
//! nothing; the consumer sees an empty slot and carries on.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use polysub_core::{BlockPool, GraphBuilder, ParamCell};
//! use polysub_core::nodes::{DcSource, Mixer4, MixerGains, OutputBlock, OutputSink};
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder.add_node(Box::new(DcSource::new(Arc::new(ParamCell::new(0.25)))))?;
//! let b = builder.add_node(Box::new(DcSource::new(Arc::new(ParamCell::new(0.25)))))?;
//! let mix = builder.add_node(Box::new(Mixer4::new(Arc::new(MixerGains::unity()))))?;
//! let out = Arc::new(OutputBlock::new());
//! let sink = builder.add_node(Box::new(OutputSink::new(Arc::clone(&out))))?;
//! builder.connect(a, 0, mix, 0, 1.0)?;
//! builder.connect(b, 0, mix, 1, 1.0)?;
//! builder.connect(mix, 0, sink, 0, 1.0)?;
//!
//! let mut graph = builder.build(BlockPool::new(16));
//! graph.tick();
//!
//! let mut samples = [0.0f32; polysub_core::AUDIO_BLOCK_SAMPLES];
//! out.read(&mut samples);
//! assert!((samples[0] - 0.5).abs() < 1e-3);
//! # Ok::<(), polysub_core::GraphError>(())
//! ```

mod builder;
pub mod link;
pub mod node;
mod scheduler;

pub use builder::{GraphBuilder, GraphError};
pub use link::{Link, LinkId, MAX_FANOUT};
pub use node::{Input, NodeId, NodeIo, SignalNode};
pub use scheduler::SignalGraph;
