use crate::block::{AUDIO_BLOCK_SAMPLES, FloatBlock};
use crate::graph::{NodeIo, SignalNode};

/// Two-input multiplier: `out = a · (b + bias)`.
///
/// With `bias = 0` this is a ring modulator; with `bias = 1` and a bipolar
/// modulation signal on `b` it is a VCA whose missing modulation input leaves
/// `a` untouched. A missing `a` produces no output.
pub struct Multiply {
    bias: f32,
    a: FloatBlock,
    b: FloatBlock,
}

impl Multiply {
    /// Ring modulator (`bias = 0`).
    pub fn ring() -> Self {
        Self::with_bias(0.0)
    }

    /// Multiplier with a fixed bias added to input `b`.
    pub fn with_bias(bias: f32) -> Self {
        Self {
            bias,
            a: [0.0; AUDIO_BLOCK_SAMPLES],
            b: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }
}

impl SignalNode for Multiply {
    fn name(&self) -> &'static str {
        "multiply"
    }

    fn inputs(&self) -> usize {
        2
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        if !io.receive_samples(0, &mut self.a) {
            return;
        }
        let has_b = io.receive_samples(1, &mut self.b);
        if !has_b && self.bias == 0.0 {
            return;
        }
        for (a, &b) in self.a.iter_mut().zip(self.b.iter()) {
            *a *= b + self.bias;
        }
        io.transmit_samples(0, &self.a);
    }
}
