//! General-purpose signal nodes.
//!
//! These carry no synthesis logic of their own: constant sources, summing
//! mixers, a multiplier for ring modulation and VCAs, and the two graph
//! endpoints (the output sink and the passive scope tap). Runtime-controllable
//! values live in shared cells (`Arc<ParamCell>`, `Arc<MixerGains>`) so the
//! control context can change them without touching the graph.

mod dc;
mod mixer;
mod multiply;
mod scope;
mod sink;

pub use dc::DcSource;
pub use mixer::{MIXER_CHANNELS, Mixer4, MixerGains};
pub use multiply::Multiply;
pub use scope::{Scope, ScopeTap};
pub use sink::{OutputBlock, OutputSink};
