//! polysub core: block-based signal graph and DSP primitives for a
//! polyphonic subtractive synthesizer.
//!
//! Everything here runs under a hard per-block deadline on small targets, so
//! nothing allocates after construction and nothing in the audio path can
//! fail.
//!
//! # Core Abstractions
//!
//! ## Blocks and the pool
//!
//! - [`Block`] - 128 signed 16-bit samples, the unit of data flow
//! - [`BlockPool`] - fixed set of reference-counted blocks shared by every node
//!
//! ## Signal graph
//!
//! - [`SignalNode`] - a processing stage, updated once per tick
//! - [`GraphBuilder`] - wiring with construction-time validation ([`GraphError`])
//! - [`SignalGraph`] - the frozen routing table and its per-tick sweep
//! - [`nodes`] - DC sources, mixers, multipliers, scope tap and output sink
//!
//! ## Control plumbing
//!
//! - [`ParamCell`], [`ChoiceCell`], [`GateCell`] - lock-free values written by
//!   the control side, read by the tick
//! - [`Transaction`] - batched writes applied in one critical section
//! - [`ParamDescriptor`] / [`ParameterInfo`] - ranges, scales, stable ids
//!
//! ## Buffers
//!
//! - [`SampleArena`] - startup placement of long-lived buffers
//! - [`RingBuffer`] - fixed-capacity sample ring
//!
//! ## DSP helpers
//!
//! - [`SmoothedParam`], [`DcBlocker`], [`EnvelopeFollower`], [`Lfo`]
//! - [`TempoSource`] / [`TempoManager`] / [`NoteDivision`]
//!
//! # no_std Support
//!
//! The crate is `no_std` + `alloc`. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polysub-core = { version = "0.1", default-features = false }
//! ```
//!
//! Batched writes and the scope use the `critical-section` crate; the target
//! must provide an implementation (on a host, enable `critical-section/std`).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arena;
pub mod block;
pub mod dc_blocker;
pub mod envelope;
pub mod graph;
pub mod lfo;
pub mod math;
pub mod nodes;
pub mod param;
pub mod param_cell;
pub mod param_info;
pub mod pool;
pub mod ring;
pub mod tempo;

pub use arena::{ArenaError, ArenaPlan, MemoryRegion, SampleArena};
pub use block::{AUDIO_BLOCK_SAMPLES, Block, FloatBlock, SAMPLE_SCALE};
pub use dc_blocker::DcBlocker;
pub use envelope::EnvelopeFollower;
pub use graph::{
    GraphBuilder, GraphError, Input, Link, LinkId, MAX_FANOUT, NodeId, NodeIo, SignalGraph,
    SignalNode,
};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{flush_denormal, note_to_hz};
pub use param::SmoothedParam;
pub use param_cell::{CellWrite, ChoiceCell, GateCell, ParamCell, Transaction};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use pool::{BlockPool, BlockRef, PoolStats};
pub use ring::RingBuffer;
pub use tempo::{NoteDivision, TempoManager, TempoSource};
