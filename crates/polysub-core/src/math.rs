//! Small numeric helpers shared by the nodes and filter cores.
//!
//! All are allocation-free and `no_std`.

use libm::{exp2f, floorf};

/// Replace values below `1e-20` in magnitude with zero.
///
/// Decaying feedback states (filter integrators, envelope tails) otherwise
/// drift into the subnormal range, which is very slow on most FPUs.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// `2^x` through exponent-field construction and a cubic on the fraction.
///
/// Relative error stays below 0.02 % over `[-126, 126]`. Used for per-sample
/// octave modulation, where `exp2f` would dominate the filter's cost.
///
/// ```
/// use polysub_core::math::fast_exp2;
///
/// assert!((fast_exp2(0.0) - 1.0).abs() < 0.01);
/// assert!((fast_exp2(3.0) - 8.0).abs() < 0.02);
/// assert!((fast_exp2(-1.0) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn fast_exp2(x: f32) -> f32 {
    let x = x.clamp(-126.0, 126.0);
    let i = floorf(x) as i32;
    let f = x - i as f32;
    let p = 1.0 + f * (0.695_1 + f * (0.227_208 + f * 0.077_692));
    f32::from_bits(((i + 127) as u32) << 23) * p
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`, in `[0, 1]`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Equal-tempered frequency of a MIDI note (A4 = note 69 = 440 Hz).
///
/// ```
/// use polysub_core::math::note_to_hz;
///
/// assert!((note_to_hz(69.0) - 440.0).abs() < 1e-3);
/// assert!((note_to_hz(57.0) - 220.0).abs() < 1e-3);
/// ```
#[inline]
pub fn note_to_hz(note: f32) -> f32 {
    440.0 * exp2f((note - 69.0) / 12.0)
}

/// Whether a value is finite and no larger than `limit` in magnitude.
#[inline]
pub fn is_bounded(x: f32, limit: f32) -> bool {
    x.is_finite() && x.abs() <= limit
}
