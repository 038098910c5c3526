//! Fixed-length audio block format.
//!
//! Every signal in the graph travels as a [`Block`] of
//! [`AUDIO_BLOCK_SAMPLES`] signed 16-bit samples. Samples are logically
//! normalized to [-1, 1] by the fixed scale `1/32768`; conversion back from
//! float saturates at ±32767 so an overdriven mixer clips instead of wrapping.
//!
//! Nodes usually work in `f32` internally and convert at the edges with
//! [`block_to_f32`] and [`f32_to_block`].

/// Number of samples in one block (one scheduler tick).
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Scale from `i16` sample to normalized float.
pub const SAMPLE_SCALE: f32 = 1.0 / 32768.0;

/// One block of 16-bit samples.
pub type Block = [i16; AUDIO_BLOCK_SAMPLES];

/// One block of float samples, the working format inside nodes.
pub type FloatBlock = [f32; AUDIO_BLOCK_SAMPLES];

/// An all-zero block.
pub const SILENT_BLOCK: Block = [0; AUDIO_BLOCK_SAMPLES];

/// Convert a single 16-bit sample to a normalized float.
///
/// # Example
///
/// ```rust
/// use polysub_core::block::sample_to_f32;
///
/// assert_eq!(sample_to_f32(0), 0.0);
/// assert_eq!(sample_to_f32(-32768), -1.0);
/// ```
#[inline]
pub fn sample_to_f32(sample: i16) -> f32 {
    f32::from(sample) * SAMPLE_SCALE
}

/// Convert a normalized float to a 16-bit sample, saturating out-of-range
/// input and mapping NaN to zero.
///
/// # Example
///
/// ```rust
/// use polysub_core::block::f32_to_sample;
///
/// assert_eq!(f32_to_sample(2.0), i16::MAX);
/// assert_eq!(f32_to_sample(-2.0), -i16::MAX);
/// assert_eq!(f32_to_sample(f32::NAN), 0);
/// ```
#[inline]
pub fn f32_to_sample(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let scaled = value * 32767.0;
    scaled.clamp(-32767.0, 32767.0) as i16
}

/// Convert a whole block to floats, multiplying by `gain`.
#[inline]
pub fn block_to_f32(block: &Block, gain: f32, out: &mut FloatBlock) {
    let scale = SAMPLE_SCALE * gain;
    for (dst, &src) in out.iter_mut().zip(block.iter()) {
        *dst = f32::from(src) * scale;
    }
}

/// Convert a float block to 16-bit samples with saturation.
#[inline]
pub fn f32_to_block(samples: &FloatBlock, out: &mut Block) {
    for (dst, &src) in out.iter_mut().zip(samples.iter()) {
        *dst = f32_to_sample(src);
    }
}
