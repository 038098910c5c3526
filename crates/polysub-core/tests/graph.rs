//! Integration tests for the signal graph: wiring validation, block
//! lifetimes across a tick, and behaviour under pool exhaustion.

use std::sync::Arc;

use polysub_core::nodes::{
    DcSource, MIXER_CHANNELS, Mixer4, MixerGains, Multiply, OutputBlock, OutputSink, Scope,
    ScopeTap,
};
use polysub_core::{
    AUDIO_BLOCK_SAMPLES, BlockPool, FloatBlock, GraphBuilder, GraphError, MAX_FANOUT, NodeIo,
    ParamCell, RingBuffer, SignalNode,
};

fn dc(level: f32) -> Box<DcSource> {
    Box::new(DcSource::new(Arc::new(ParamCell::new(level))))
}

fn sink() -> (Box<OutputSink>, Arc<OutputBlock>) {
    let out = Arc::new(OutputBlock::new());
    (Box::new(OutputSink::new(Arc::clone(&out))), out)
}

fn read(out: &OutputBlock) -> FloatBlock {
    let mut samples = [0.0; AUDIO_BLOCK_SAMPLES];
    out.read(&mut samples);
    samples
}

/// Has one input and never looks at it.
struct Deaf;

impl SignalNode for Deaf {
    fn name(&self) -> &'static str {
        "deaf"
    }
    fn inputs(&self) -> usize {
        1
    }
    fn outputs(&self) -> usize {
        0
    }
    fn update(&mut self, _io: &mut NodeIo<'_>) {}
}

// ============================================================================
// Wiring validation
// ============================================================================

#[test]
fn test_connect_rejects_backward_link() {
    let mut b = GraphBuilder::new();
    let (s, _) = sink();
    let mix = b.add_node(Box::new(Mixer4::new(Arc::new(MixerGains::unity())))).unwrap();
    let src = b.add_node(dc(0.5)).unwrap();
    let out = b.add_node(s).unwrap();
    assert_eq!(
        b.connect(src, 0, mix, 0, 1.0),
        Err(GraphError::OrderViolation { source: src, target: mix })
    );
    assert_eq!(
        b.connect(out, 0, out, 0, 1.0),
        Err(GraphError::OrderViolation { source: out, target: out })
    );
}

#[test]
fn test_connect_rejects_bad_slots() {
    let mut b = GraphBuilder::new();
    let (s, _) = sink();
    let src = b.add_node(dc(0.5)).unwrap();
    let out = b.add_node(s).unwrap();
    assert_eq!(
        b.connect(src, 1, out, 0, 1.0),
        Err(GraphError::InvalidOutput { node: src, slot: 1 })
    );
    assert_eq!(
        b.connect(src, 0, out, 3, 1.0),
        Err(GraphError::InvalidInput { node: out, slot: 3 })
    );
}

#[test]
fn test_connect_rejects_second_link_into_slot() {
    let mut b = GraphBuilder::new();
    let (s, _) = sink();
    let a = b.add_node(dc(0.1)).unwrap();
    let c = b.add_node(dc(0.2)).unwrap();
    let out = b.add_node(s).unwrap();
    b.connect(a, 0, out, 0, 1.0).unwrap();
    assert_eq!(
        b.connect(c, 0, out, 0, 1.0),
        Err(GraphError::InputOccupied { node: out, slot: 0 })
    );
    assert_eq!(b.link_count(), 1);
}

#[test]
fn test_fanout_limit() {
    let mut b = GraphBuilder::new();
    let src = b.add_node(dc(0.5)).unwrap();
    let targets: Vec<_> = (0..=MAX_FANOUT)
        .map(|_| b.add_node(Box::new(Deaf)).unwrap())
        .collect();
    for &t in &targets[..MAX_FANOUT] {
        b.connect(src, 0, t, 0, 1.0).unwrap();
    }
    assert_eq!(
        b.connect(src, 0, targets[MAX_FANOUT], 0, 1.0),
        Err(GraphError::FanoutExceeded { node: src, slot: 0 })
    );
}

#[test]
fn test_unknown_node() {
    let mut other = GraphBuilder::new();
    other.add_node(dc(0.0)).unwrap();
    let foreign = other.add_node(dc(0.0)).unwrap();

    let mut b = GraphBuilder::new();
    let src = b.add_node(dc(0.5)).unwrap();
    assert_eq!(b.connect(src, 0, foreign, 0, 1.0), Err(GraphError::NodeNotFound(foreign)));
}

#[test]
fn test_link_ids_resolve_after_build() {
    let mut b = GraphBuilder::new();
    let (s, _) = sink();
    let gains = Arc::new(MixerGains::unity());
    let a = b.add_node(dc(0.1)).unwrap();
    let c = b.add_node(dc(0.2)).unwrap();
    let mix = b.add_node(Box::new(Mixer4::new(gains))).unwrap();
    let out = b.add_node(s).unwrap();
    // Created out of source order, so build() regroups them.
    let from_c = b.connect(c, 0, mix, 1, 0.25).unwrap();
    let from_a = b.connect(a, 0, mix, 0, 0.5).unwrap();
    let to_out = b.connect(mix, 0, out, 0, 1.0).unwrap();
    let graph = b.build(BlockPool::new(4));

    let link = graph.link(from_c).unwrap();
    assert_eq!((link.source, link.input, link.gain), (c, 1, 0.25));
    let link = graph.link(from_a).unwrap();
    assert_eq!((link.source, link.input, link.gain), (a, 0, 0.5));
    assert_eq!(graph.link(to_out).unwrap().target, out);
    assert_eq!(graph.links_from(a)[0], *graph.link(from_a).unwrap());
}

// ============================================================================
// Block lifetimes
// ============================================================================

#[test]
fn test_fanout_delivers_to_every_link_and_returns_all_blocks() {
    let mut b = GraphBuilder::new();
    let (s1, out1) = sink();
    let (s2, out2) = sink();
    let src = b.add_node(dc(0.5)).unwrap();
    let a = b.add_node(s1).unwrap();
    let c = b.add_node(s2).unwrap();
    b.connect(src, 0, a, 0, 1.0).unwrap();
    b.connect(src, 0, c, 0, 0.5).unwrap();

    let mut graph = b.build(BlockPool::new(4));
    for _ in 0..10 {
        graph.tick();
        let stats = graph.pool_stats();
        assert_eq!(stats.in_use, 0, "blocks leaked after tick");
        // One block shared to two links: never more than one in use.
        assert_eq!(stats.peak_in_use, 1);
    }
    assert!((read(&out1)[0] - 0.5).abs() < 1e-3);
    assert!((read(&out2)[0] - 0.25).abs() < 1e-3, "link gain applied on receive");
}

#[test]
fn test_unread_inputs_are_released_by_scheduler() {
    let mut b = GraphBuilder::new();
    let src = b.add_node(dc(0.9)).unwrap();
    let deaf = b.add_node(Box::new(Deaf)).unwrap();
    b.connect(src, 0, deaf, 0, 1.0).unwrap();
    let mut graph = b.build(BlockPool::new(2));
    for _ in 0..100 {
        graph.tick();
    }
    assert_eq!(graph.pool_stats().in_use, 0);
    assert_eq!(graph.pool_stats().exhaustion_count, 0);
    assert_eq!(graph.ticks(), 100);
}

#[test]
fn test_exhaustion_is_silence_not_panic() {
    let mut b = GraphBuilder::new();
    let (s, out) = sink();
    let first = b.add_node(dc(0.25)).unwrap();
    let second = b.add_node(dc(0.5)).unwrap();
    let mix = b.add_node(Box::new(Mixer4::new(Arc::new(MixerGains::unity())))).unwrap();
    let sink = b.add_node(s).unwrap();
    b.connect(first, 0, mix, 0, 1.0).unwrap();
    b.connect(second, 0, mix, 1, 1.0).unwrap();
    b.connect(mix, 0, sink, 0, 1.0).unwrap();

    // The first block sits in the mixer's inbox while the second source runs.
    let mut graph = b.build(BlockPool::new(1));
    graph.tick();

    let stats = graph.pool_stats();
    assert_eq!(stats.exhaustion_count, 1);
    assert_eq!(stats.in_use, 0);
    assert!((read(&out)[0] - 0.25).abs() < 1e-3, "only the first source got through");
}

#[test]
fn test_missing_input_reaches_sink_as_zeros() {
    let mut b = GraphBuilder::new();
    let (s, out) = sink();
    let silent = b.add_node(dc(0.0)).unwrap();
    let sink = b.add_node(s).unwrap();
    b.connect(silent, 0, sink, 0, 1.0).unwrap();
    let mut graph = b.build(BlockPool::new(2));
    graph.tick();
    assert!(read(&out).iter().all(|&x| x == 0.0));
}

// ============================================================================
// Generic nodes
// ============================================================================

#[test]
fn test_mixer_runtime_gains() {
    let gains = Arc::new(MixerGains::new([1.0, 0.5, 0.0, 0.0]));
    let mut b = GraphBuilder::new();
    let (s, out) = sink();
    let sources: Vec<_> = (0..MIXER_CHANNELS).map(|_| b.add_node(dc(0.2)).unwrap()).collect();
    let mix = b.add_node(Box::new(Mixer4::new(Arc::clone(&gains)))).unwrap();
    let sink = b.add_node(s).unwrap();
    for (ch, &src) in sources.iter().enumerate() {
        b.connect(src, 0, mix, ch, 1.0).unwrap();
    }
    b.connect(mix, 0, sink, 0, 1.0).unwrap();
    let mut graph = b.build(BlockPool::new(8));

    graph.tick();
    assert!((read(&out)[0] - 0.3).abs() < 1e-3);

    gains.set(3, 1.0);
    graph.tick();
    assert!((read(&out)[0] - 0.5).abs() < 1e-3);
}

#[test]
fn test_multiply_bias() {
    let mut b = GraphBuilder::new();
    let (s_ring, ring_out) = sink();
    let (s_vca, vca_out) = sink();
    let a = b.add_node(dc(0.5)).unwrap();
    let m = b.add_node(dc(-0.5)).unwrap();
    let ring = b.add_node(Box::new(Multiply::ring())).unwrap();
    let vca = b.add_node(Box::new(Multiply::with_bias(1.0))).unwrap();
    let r_out = b.add_node(s_ring).unwrap();
    let v_out = b.add_node(s_vca).unwrap();
    b.connect(a, 0, ring, 0, 1.0).unwrap();
    b.connect(m, 0, ring, 1, 1.0).unwrap();
    b.connect(a, 0, vca, 0, 1.0).unwrap();
    b.connect(m, 0, vca, 1, 1.0).unwrap();
    b.connect(ring, 0, r_out, 0, 1.0).unwrap();
    b.connect(vca, 0, v_out, 0, 1.0).unwrap();
    let mut graph = b.build(BlockPool::new(8));
    graph.tick();
    assert!((read(&ring_out)[0] + 0.25).abs() < 1e-3);
    assert!((read(&vca_out)[0] - 0.25).abs() < 1e-3);
    assert_eq!(graph.pool_stats().in_use, 0);
}

#[test]
fn test_scope_tap_records_without_disturbing_output() {
    let scope = Arc::new(Scope::new(RingBuffer::with_capacity(512)));
    let mut b = GraphBuilder::new();
    let (s, out) = sink();
    let src = b.add_node(dc(0.75)).unwrap();
    let tap = b.add_node(Box::new(ScopeTap::new(Arc::clone(&scope)))).unwrap();
    let sink = b.add_node(s).unwrap();
    b.connect(src, 0, tap, 0, 1.0).unwrap();
    b.connect(src, 0, sink, 0, 1.0).unwrap();
    let mut graph = b.build(BlockPool::new(4));
    for _ in 0..3 {
        graph.tick();
    }

    let mut captured = [0.0f32; 512];
    assert_eq!(scope.snapshot(&mut captured), 3 * AUDIO_BLOCK_SAMPLES);
    let direct = read(&out);
    assert!((captured[0] - direct[0]).abs() < 1e-6);
    assert!((direct[0] - 0.75).abs() < 1e-3);
}
