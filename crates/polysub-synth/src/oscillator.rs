//! Band-limited oscillators and the voice source nodes built on them.
//!
//! [`Oscillator`] is a PolyBLEP oscillator: naive waveforms with a
//! polynomial correction around each discontinuity. [`OscillatorNode`] and
//! [`NoiseNode`] put it into the signal graph, reading pitch and shape from
//! parameter cells and modulation from their input slots.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::f32::consts::PI;
use libm::{floorf, sinf};
use polysub_core::math::fast_exp2;
use polysub_core::{AUDIO_BLOCK_SAMPLES, ChoiceCell, FloatBlock, NodeIo, ParamCell, SignalNode};

/// Semitones of pitch shift per unit of pitch modulation input.
pub const PITCH_MOD_SEMITONES: f32 = 12.0;

/// Pulse width change per unit of shape modulation input.
pub const SHAPE_MOD_DEPTH: f32 = 0.45;

const MIN_PULSE_WIDTH: f32 = 0.05;
const MAX_PULSE_WIDTH: f32 = 0.95;

#[inline]
fn wrap_unit(x: f32) -> f32 {
    x - floorf(x)
}

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OscillatorWaveform {
    /// Pure fundamental.
    Sine,
    /// Odd harmonics, rolled off at 12 dB/oct.
    Triangle,
    /// All harmonics.
    #[default]
    Saw,
    /// 50% pulse.
    Square,
    /// Variable-width pulse, see [`Oscillator::set_pulse_width`].
    Pulse,
    /// White noise.
    Noise,
}

impl OscillatorWaveform {
    /// Pitched waveforms selectable on a voice oscillator, in choice order.
    pub const TONAL: [Self; 5] = [
        Self::Sine,
        Self::Triangle,
        Self::Saw,
        Self::Square,
        Self::Pulse,
    ];

    /// Waveform for a stored choice index; out of range falls back to saw.
    pub fn from_index(index: u8) -> Self {
        Self::TONAL.get(index as usize).copied().unwrap_or_default()
    }

    /// Choice index.
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Audio-rate oscillator with PolyBLEP anti-aliasing.
///
/// # Example
///
/// ```rust
/// use polysub_synth::{Oscillator, OscillatorWaveform};
///
/// let mut osc = Oscillator::new(48000.0);
/// osc.set_frequency(440.0);
/// osc.set_waveform(OscillatorWaveform::Saw);
/// let sample = osc.advance();
/// assert!(sample.abs() <= 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,
    waveform: OscillatorWaveform,
    pulse_width: f32,
    noise_state: u32,
    /// Leaky integrator state of the triangle.
    integrator: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Oscillator {
    /// Saw at 440 Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 440.0 / sample_rate,
            sample_rate,
            frequency: 440.0,
            waveform: OscillatorWaveform::default(),
            pulse_width: 0.5,
            noise_state: 0x1234_5678,
            integrator: 0.0,
        }
    }

    /// Set frequency in Hz. Negative values are treated as 0; the upper
    /// end is held just below Nyquist.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.clamp(0.0, 0.49 * self.sample_rate);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the waveform.
    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Duty cycle of [`OscillatorWaveform::Pulse`], clamped to `0.05..=0.95`.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = if width.is_nan() {
            0.5
        } else {
            width.clamp(MIN_PULSE_WIDTH, MAX_PULSE_WIDTH)
        };
    }

    /// Current duty cycle.
    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Reseed the noise generator. A zero seed is replaced.
    pub fn set_seed(&mut self, seed: u32) {
        self.noise_state = if seed == 0 { 0x1234_5678 } else { seed };
    }

    /// Phase to 0, integrator cleared.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.integrator = 0.0;
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Generate the next sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let phase = self.phase;
        let dt = self.phase_inc;
        let out = match self.waveform {
            OscillatorWaveform::Sine => sinf(phase * 2.0 * PI),
            OscillatorWaveform::Saw => 2.0 * phase - 1.0 - poly_blep(phase, dt),
            OscillatorWaveform::Square => pulse(phase, 0.5, dt),
            OscillatorWaveform::Pulse => pulse(phase, self.pulse_width, dt),
            OscillatorWaveform::Triangle => {
                // Integrated band-limited square; the leak keeps DC in check.
                let square = pulse(phase, 0.5, dt);
                let leak = 1.0 - dt.min(0.1);
                self.integrator = leak * self.integrator + square * dt * 4.0;
                self.integrator
            }
            OscillatorWaveform::Noise => self.next_noise(),
        };
        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}

#[inline]
fn pulse(phase: f32, duty: f32, dt: f32) -> f32 {
    let naive = if phase < duty { 1.0 } else { -1.0 };
    naive + poly_blep(phase, dt) - poly_blep(wrap_unit(phase - duty + 1.0), dt)
}

/// 4th-order PolyBLEP residual, two samples either side of a unit step at
/// phase 0.
///
/// Piecewise: `p(n) = A4·n⁴ + A3·n³ + A2·n² + A0` for `n < 1` and
/// `C·(2 − n)⁴` for `1 ≤ n < 2`, mirrored with opposite sign before the
/// step. C² continuous at `n = 1`.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    const A4: f32 = -43.0 / 48.0;
    const A3: f32 = 7.0 / 6.0;
    const A2: f32 = 0.5;
    const A0: f32 = -1.0;
    const C: f32 = -11.0 / 48.0;

    let residual = |n: f32| {
        if n < 1.0 {
            let n2 = n * n;
            A4 * n2 * n2 + A3 * n2 * n + A2 * n2 + A0
        } else {
            let u = 2.0 - n;
            let u2 = u * u;
            C * u2 * u2
        }
    };

    if dt <= 0.0 {
        0.0
    } else if t < 2.0 * dt {
        residual(t / dt)
    } else if t > 1.0 - 2.0 * dt {
        -residual((1.0 - t) / dt)
    } else {
        0.0
    }
}

/// Tuning and shape of one voice oscillator, shared by all voices.
#[derive(Debug)]
pub struct OscParams {
    /// [`OscillatorWaveform::TONAL`] index.
    pub waveform: ChoiceCell,
    /// Base pulse width.
    pub pulse_width: ParamCell,
    /// Coarse tuning in semitones.
    pub semitones: ParamCell,
    /// Fine tuning in cents.
    pub detune: ParamCell,
}

impl OscParams {
    /// Oscillator with `waveform`, centered pulse, no transposition.
    pub const fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform: ChoiceCell::new(waveform as u8),
            pulse_width: ParamCell::new(0.5),
            semitones: ParamCell::new(0.0),
            detune: ParamCell::new(0.0),
        }
    }

    /// Frequency ratio from coarse and fine tuning.
    pub fn tuning_ratio(&self) -> f32 {
        fast_exp2((self.semitones.get() + self.detune.get() / 100.0) / 12.0)
    }
}

impl Default for OscParams {
    fn default() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }
}

/// Voice oscillator node.
///
/// The voice's note frequency comes from a pitch cell written on note-on;
/// tuning and waveform from [`OscParams`]. Input 0 is pitch modulation
/// (±1 = ±[`PITCH_MOD_SEMITONES`]), input 1 shape modulation added to the
/// pulse width. The sub-oscillator variant plays a square one octave down
/// and has only the pitch input.
pub struct OscillatorNode {
    osc: Oscillator,
    pitch: Arc<ParamCell>,
    params: Arc<OscParams>,
    ratio: f32,
    sub: bool,
    pitch_mod: FloatBlock,
    shape_mod: FloatBlock,
    out: FloatBlock,
}

impl OscillatorNode {
    /// Oscillator following `pitch` (Hz), shaped by `params`.
    pub fn new(pitch: Arc<ParamCell>, params: Arc<OscParams>, sample_rate: f32) -> Self {
        Self {
            osc: Oscillator::new(sample_rate),
            pitch,
            params,
            ratio: 1.0,
            sub: false,
            pitch_mod: [0.0; AUDIO_BLOCK_SAMPLES],
            shape_mod: [0.0; AUDIO_BLOCK_SAMPLES],
            out: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }

    /// Square one octave under the oscillator `params` describes.
    pub fn sub(pitch: Arc<ParamCell>, params: Arc<OscParams>, sample_rate: f32) -> Self {
        let mut node = Self::new(pitch, params, sample_rate);
        node.ratio = 0.5;
        node.sub = true;
        node.osc.set_waveform(OscillatorWaveform::Square);
        node
    }
}

impl SignalNode for OscillatorNode {
    fn name(&self) -> &'static str {
        if self.sub { "sub" } else { "oscillator" }
    }

    fn inputs(&self) -> usize {
        if self.sub { 1 } else { 2 }
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        let base = self.pitch.get() * self.params.tuning_ratio() * self.ratio;
        let pitch_modulated = io.receive_samples(0, &mut self.pitch_mod);
        let shape_modulated = !self.sub && io.receive_samples(1, &mut self.shape_mod);
        if !self.sub {
            self.osc
                .set_waveform(OscillatorWaveform::from_index(self.params.waveform.get()));
        }
        let width = self.params.pulse_width.get();

        if !pitch_modulated {
            self.osc.set_frequency(base);
        }
        if !shape_modulated {
            self.osc.set_pulse_width(width);
        }
        for i in 0..AUDIO_BLOCK_SAMPLES {
            if pitch_modulated {
                let octaves = self.pitch_mod[i] * PITCH_MOD_SEMITONES / 12.0;
                self.osc.set_frequency(base * fast_exp2(octaves));
            }
            if shape_modulated {
                self.osc
                    .set_pulse_width(width + SHAPE_MOD_DEPTH * self.shape_mod[i]);
            }
            self.out[i] = self.osc.advance();
        }
        io.transmit_samples(0, &self.out);
    }
}

/// White-noise source.
pub struct NoiseNode {
    osc: Oscillator,
    out: FloatBlock,
}

impl NoiseNode {
    /// Noise generator seeded with `seed`, so voices decorrelate.
    pub fn new(seed: u32) -> Self {
        let mut osc = Oscillator::default();
        osc.set_waveform(OscillatorWaveform::Noise);
        osc.set_seed(seed);
        Self {
            osc,
            out: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }
}

impl SignalNode for NoiseNode {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        if !io.is_connected(0) {
            return;
        }
        for s in &mut self.out {
            *s = self.osc.advance();
        }
        io.transmit_samples(0, &self.out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_zero_crossings(osc: &mut Oscillator, samples: usize) -> i32 {
        let mut crossings = 0;
        let mut prev = 0.0;
        for _ in 0..samples {
            let sample = osc.advance();
            if prev <= 0.0 && sample > 0.0 {
                crossings += 1;
            }
            prev = sample;
        }
        crossings
    }

    #[test]
    fn test_oscillator_frequency() {
        for freq in [440.0, 1000.0, 10_000.0] {
            let mut osc = Oscillator::new(48000.0);
            osc.set_frequency(freq);
            osc.set_waveform(OscillatorWaveform::Sine);
            let crossings = rising_zero_crossings(&mut osc, 48000);
            assert!(
                (crossings - freq as i32).abs() <= 5,
                "expected ~{freq} crossings, got {crossings}"
            );
        }
    }

    #[test]
    fn test_output_ranges() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Square,
            OscillatorWaveform::Pulse,
            OscillatorWaveform::Noise,
        ] {
            let mut osc = Oscillator::new(48000.0);
            osc.set_frequency(220.0);
            osc.set_waveform(waveform);
            for _ in 0..10_000 {
                let sample = osc.advance();
                assert!(sample.is_finite() && sample.abs() <= 2.0, "{waveform:?}: {sample}");
            }
        }
    }

    #[test]
    fn test_pulse_duty_cycle() {
        let mut osc = Oscillator::new(48000.0);
        osc.set_frequency(100.0);
        osc.set_waveform(OscillatorWaveform::Pulse);
        osc.set_pulse_width(0.25);
        let positive = (0..48000).filter(|_| osc.advance() > 0.0).count();
        let ratio = positive as f32 / 48000.0;
        assert!((ratio - 0.25).abs() < 0.05, "duty {ratio}");
    }

    #[test]
    fn test_pulse_width_clamped() {
        let mut osc = Oscillator::new(48000.0);
        osc.set_pulse_width(2.0);
        assert_eq!(osc.pulse_width(), MAX_PULSE_WIDTH);
        osc.set_pulse_width(f32::NAN);
        assert_eq!(osc.pulse_width(), 0.5);
    }

    #[test]
    fn test_waveform_choice_index() {
        for (i, w) in OscillatorWaveform::TONAL.iter().enumerate() {
            assert_eq!(OscillatorWaveform::from_index(i as u8), *w);
            assert_eq!(w.index() as usize, i);
        }
        assert_eq!(OscillatorWaveform::from_index(99), OscillatorWaveform::Saw);
    }

    #[test]
    fn test_tuning_ratio() {
        let params = OscParams::default();
        params.semitones.set(12.0);
        assert!((params.tuning_ratio() - 2.0).abs() < 0.01);
        params.semitones.set(-7.0);
        params.detune.set(-500.0);
        assert!((params.tuning_ratio() - 0.5).abs() < 0.01);
    }

    /// Goertzel magnitude in dB at one bin.
    fn goertzel_db(signal: &[f32], bin: usize) -> f32 {
        let n = signal.len();
        let w = 2.0 * core::f64::consts::PI * bin as f64 / n as f64;
        let coeff = 2.0 * libm::cos(w);
        let (mut s1, mut s2) = (0.0f64, 0.0f64);
        for &x in signal {
            let s0 = f64::from(x) + coeff * s1 - s2;
            s2 = s1;
            s1 = s0;
        }
        let real = s1 - s2 * libm::cos(w);
        let imag = s2 * libm::sin(w);
        let magnitude = libm::sqrt(real * real + imag * imag) / (n as f64 / 2.0);
        20.0 * libm::log10(magnitude.max(1e-12)) as f32
    }

    #[test]
    fn test_saw_alias_suppression_5khz() {
        let mut osc = Oscillator::new(48000.0);
        osc.set_frequency(5000.0);
        osc.set_waveform(OscillatorWaveform::Saw);
        let samples: Vec<f32> = (0..48000).map(|_| osc.advance()).collect();
        let fundamental = goertzel_db(&samples, 5000);
        // Harmonics 10, 11 and 12 fold back to 2, 7 and 12 kHz.
        for bin in [2000, 7000, 12_000] {
            let alias = goertzel_db(&samples, bin);
            assert!(
                fundamental - alias > 45.0,
                "alias at {bin} Hz only {:.1} dB down",
                fundamental - alias
            );
        }
    }
}
