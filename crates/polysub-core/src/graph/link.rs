//! Signal links: static bindings from an output slot to an input slot.

use super::node::NodeId;

/// Maximum number of links leaving a single output slot.
pub const MAX_FANOUT: usize = 64;

/// Identifier of a link, in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkId(pub(crate) u16);

impl LinkId {
    /// Creation index of the link.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for LinkId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LinkId({})", self.0)
    }
}

/// A fixed connection `(source, output) → (target, input)`.
///
/// `gain` scales the block when the target receives it; mixers use it as a
/// static per-input trim on top of their runtime gains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    /// Producing node.
    pub source: NodeId,
    /// Output slot on the producing node.
    pub output: u8,
    /// Consuming node.
    pub target: NodeId,
    /// Input slot on the consuming node.
    pub input: u8,
    /// Static gain applied on receive.
    pub gain: f32,
}
