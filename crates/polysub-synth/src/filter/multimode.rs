//! OB-X style multimode core.
//!
//! Two topologies share one set of four integrator states:
//!
//! - **2-pole**: a nonlinear state-variable filter. Resonance damping is
//!   bent by a polynomial of the first state, which limits self-oscillation
//!   without a separate clipper. `push` adds a small negative offset to the
//!   damping for a hotter, always-ringing character. The blend control
//!   morphs low-pass → high-pass (or, in band-pass mode, LP → BP → HP).
//! - **4-pole**: four TPT one-poles inside a zero-delay feedback loop. The
//!   loop is solved in closed form and the first state is soft-limited with
//!   `atan`. Output is a mix of the five taps (input plus four stages) chosen
//!   by an [`XpanderMode`] row, giving fifteen responses from one core.

use libm::{atanf, sqrtf};
use polysub_core::math::{fast_exp2, flush_denormal};
use polysub_core::{FloatBlock, SmoothedParam};

use super::{CUTOFF_SMOOTHING_MS, FilterCore, StateGuard, clamp_cutoff, prewarp};

/// Feedback gain of the 4-pole loop at full resonance.
const FOUR_POLE_RESONANCE: f32 = 3.5;
/// Passband make-up per unit of 4-pole feedback.
const FOUR_POLE_MAKEUP: f32 = 0.45;
/// Damping offset added by `push`.
const PUSH_OFFSET: f32 = 0.035;
/// Scaling of the first state inside the damping polynomial.
const DAMPING_DRIVE: f32 = 0.0876;

/// Filter topology of the multimode core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MultimodeTopology {
    /// 12 dB/oct state-variable filter.
    TwoPole,
    /// 24 dB/oct ladder with Xpander pole mixing.
    #[default]
    FourPole,
}

impl MultimodeTopology {
    /// Topology for a pole count; anything other than 2 is 4-pole.
    pub fn from_poles(poles: u8) -> Self {
        if poles == 2 { Self::TwoPole } else { Self::FourPole }
    }

    /// Pole count.
    pub fn poles(self) -> u8 {
        match self {
            Self::TwoPole => 2,
            Self::FourPole => 4,
        }
    }
}

/// Tap weights per Xpander mode, applied to `[input, y1, y2, y3, y4]`.
pub const XPANDER_MODES: [[f32; 5]; 15] = [
    [0.0, 0.0, 0.0, 0.0, 1.0],
    [0.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0],
    [1.0, -3.0, 3.0, -1.0, 0.0],
    [1.0, -2.0, 1.0, 0.0, 0.0],
    [1.0, -1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, -2.0, 1.0],
    [0.0, 1.0, -1.0, 0.0, 0.0],
    [1.0, -2.0, 2.0, 0.0, 0.0],
    [1.0, -3.0, 6.0, -4.0, 0.0],
    [0.0, 1.0, -2.0, 1.0, 0.0],
    [0.0, 1.0, -3.0, 3.0, -1.0],
    [0.0, 1.0, -2.0, 2.0, 0.0],
    [0.0, 1.0, -3.0, 6.0, -4.0],
];

/// Pole-mixing response of the 4-pole topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum XpanderMode {
    /// 4-pole low-pass.
    #[default]
    Lp4,
    /// 3-pole low-pass.
    Lp3,
    /// 2-pole low-pass.
    Lp2,
    /// 1-pole low-pass.
    Lp1,
    /// 3-pole high-pass.
    Hp3,
    /// 2-pole high-pass.
    Hp2,
    /// 1-pole high-pass.
    Hp1,
    /// 4-pole band-pass.
    Bp4,
    /// 2-pole band-pass.
    Bp2,
    /// 2-pole notch.
    Notch2,
    /// 3-pole phaser.
    Phase3,
    /// 2-pole high-pass into 1-pole low-pass.
    Hp2Lp1,
    /// 3-pole high-pass into 1-pole low-pass.
    Hp3Lp1,
    /// Notch into 1-pole low-pass.
    Notch2Lp1,
    /// Phaser into 1-pole low-pass.
    Phase3Lp1,
}

impl XpanderMode {
    /// All modes in table order.
    pub const ALL: [Self; 15] = [
        Self::Lp4,
        Self::Lp3,
        Self::Lp2,
        Self::Lp1,
        Self::Hp3,
        Self::Hp2,
        Self::Hp1,
        Self::Bp4,
        Self::Bp2,
        Self::Notch2,
        Self::Phase3,
        Self::Hp2Lp1,
        Self::Hp3Lp1,
        Self::Notch2Lp1,
        Self::Phase3Lp1,
    ];

    /// Mode for a table index; out of range falls back to LP4.
    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    /// Table index.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Tap weights.
    pub fn row(self) -> &'static [f32; 5] {
        &XPANDER_MODES[self as usize]
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lp4 => "LP4",
            Self::Lp3 => "LP3",
            Self::Lp2 => "LP2",
            Self::Lp1 => "LP1",
            Self::Hp3 => "HP3",
            Self::Hp2 => "HP2",
            Self::Hp1 => "HP1",
            Self::Bp4 => "BP4",
            Self::Bp2 => "BP2",
            Self::Notch2 => "N2",
            Self::Phase3 => "PH3",
            Self::Hp2Lp1 => "HP2+LP1",
            Self::Hp3Lp1 => "HP3+LP1",
            Self::Notch2Lp1 => "N2+LP1",
            Self::Phase3Lp1 => "PH3+LP1",
        }
    }
}

/// Damping bend polynomial of the 2-pole topology.
#[inline]
fn damping_poly(x: f32) -> f32 {
    (((0.010_359_2 * x + 0.009_208_33) * x + 0.185) * x + 0.05) * x + 1.0
}

/// OB-X style multimode filter.
///
/// # Example
///
/// ```rust
/// use polysub_synth::filter::{FilterCore, Multimode, MultimodeTopology, XpanderMode};
/// use polysub_core::AUDIO_BLOCK_SAMPLES;
///
/// let mut core = Multimode::new(48000.0);
/// core.set_topology(MultimodeTopology::FourPole);
/// core.set_mode(XpanderMode::Bp2);
/// core.set_cutoff(1200.0);
///
/// let input = [0.5; AUDIO_BLOCK_SAMPLES];
/// let zero = [0.0; AUDIO_BLOCK_SAMPLES];
/// let mut out = [0.0; AUDIO_BLOCK_SAMPLES];
/// core.process_block(&input, &zero, &zero, &mut out);
/// assert!(out.iter().all(|y| y.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct Multimode {
    sample_rate: f32,
    cutoff: SmoothedParam,
    resonance: f32,
    topology: MultimodeTopology,
    mode: XpanderMode,
    blend: f32,
    bandpass: bool,
    push: bool,
    /// `atan` scaling of the first 4-pole state at zero resonance.
    limiter_scale: f32,
    s: [f32; 4],
    taps: [f32; 5],
    guard: StateGuard,
}

impl Multimode {
    /// 4-pole LP4 core at 1 kHz, no resonance.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            cutoff: SmoothedParam::with_config(1000.0, sample_rate, CUTOFF_SMOOTHING_MS),
            resonance: 0.0,
            topology: MultimodeTopology::default(),
            mode: XpanderMode::default(),
            blend: 0.0,
            bandpass: false,
            push: false,
            limiter_scale: 970.0 / 44000.0 * sqrtf(44000.0 / sample_rate),
            s: [0.0; 4],
            taps: [0.0; 5],
            guard: StateGuard::new(),
        }
    }

    /// Switch topology. States are kept; both topologies settle quickly.
    pub fn set_topology(&mut self, topology: MultimodeTopology) {
        self.topology = topology;
    }

    /// Current topology.
    pub fn topology(&self) -> MultimodeTopology {
        self.topology
    }

    /// Pole-mixing row used by the 4-pole topology.
    pub fn set_mode(&mut self, mode: XpanderMode) {
        self.mode = mode;
    }

    /// Current Xpander mode.
    pub fn mode(&self) -> XpanderMode {
        self.mode
    }

    /// 2-pole LP→HP morph, `0.0..=1.0`.
    pub fn set_blend(&mut self, blend: f32) {
        self.blend = if blend.is_nan() { 0.0 } else { blend.clamp(0.0, 1.0) };
    }

    /// Route the 2-pole blend through band-pass at its midpoint.
    pub fn set_bandpass(&mut self, bandpass: bool) {
        self.bandpass = bandpass;
    }

    /// Hotter 2-pole damping.
    pub fn set_push(&mut self, push: bool) {
        self.push = push;
    }

    #[inline]
    fn two_pole(&mut self, x: f32, g: f32, resonance: f32) -> f32 {
        let damping = 1.0 - resonance;
        let offset = if self.push { 1.0 + PUSH_OFFSET } else { 1.0 };
        let bend = damping_poly(self.s[0] * DAMPING_DRIVE) - offset;
        let d = damping + bend;

        let hp = (x - 2.0 * self.s[0] * d - g * self.s[0] - self.s[1]) / (1.0 + g * (2.0 * d + g));
        let bp = hp * g + self.s[0];
        self.s[0] = flush_denormal(hp * g + bp);
        let lp = bp * g + self.s[1];
        self.s[1] = flush_denormal(bp * g + lp);
        self.taps = [x, hp, bp, lp, 0.0];

        let mm = self.blend;
        if self.bandpass {
            if mm < 0.5 {
                2.0 * ((0.5 - mm) * lp + mm * bp)
            } else {
                2.0 * ((1.0 - mm) * bp + (mm - 0.5) * hp)
            }
        } else {
            (1.0 - mm) * lp + mm * hp
        }
    }

    #[inline]
    fn four_pole(&mut self, x: f32, g: f32, resonance: f32) -> f32 {
        let feedback = FOUR_POLE_RESONANCE * resonance;
        let lpc = g / (1.0 + g);
        let s = &mut self.s;

        let loop_state = (lpc * (lpc * (lpc * s[0] + s[1]) + s[2]) + s[3]) / (1.0 + g);
        let loop_gain = lpc * lpc * lpc * lpc;
        let y0 = (x - feedback * loop_state) / (1.0 + feedback * loop_gain);

        let v = (y0 - s[0]) * lpc;
        let y1 = v + s[0];
        let c = self.limiter_scale * (1.0 + resonance);
        s[0] = flush_denormal(atanf((y1 + v) * c) / c);

        let mut taps = [y0, y1, 0.0, 0.0, 0.0];
        let mut input = y1;
        for stage in 1..4 {
            let v = (input - s[stage]) * lpc;
            let y = v + s[stage];
            s[stage] = flush_denormal(y + v);
            taps[stage + 1] = y;
            input = y;
        }
        self.taps = taps;

        let row = self.mode.row();
        let mixed: f32 = row.iter().zip(taps.iter()).map(|(w, t)| w * t).sum();
        mixed * (1.0 + feedback * FOUR_POLE_MAKEUP)
    }
}

impl FilterCore for Multimode {
    fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff.set_target(clamp_cutoff(cutoff_hz, self.sample_rate));
    }

    fn set_resonance(&mut self, resonance: f32) {
        self.resonance = if resonance.is_nan() { 0.0 } else { resonance.clamp(0.0, 1.0) };
    }

    fn reset(&mut self) {
        self.s = [0.0; 4];
        self.taps = [0.0; 5];
        self.cutoff.snap_to_target();
    }

    fn process_block(
        &mut self,
        input: &FloatBlock,
        cutoff_mod: &FloatBlock,
        resonance_mod: &FloatBlock,
        output: &mut FloatBlock,
    ) {
        for i in 0..output.len() {
            let fc = clamp_cutoff(
                self.cutoff.advance() * fast_exp2(cutoff_mod[i]),
                self.sample_rate,
            );
            let g = prewarp(fc, self.sample_rate);
            let resonance = (self.resonance + resonance_mod[i]).clamp(0.0, 1.0);
            let y = match self.topology {
                MultimodeTopology::TwoPole => self.two_pole(input[i], g, resonance),
                MultimodeTopology::FourPole => self.four_pole(input[i], g, resonance),
            };
            let healthy = self.guard.check(&self.s) && self.guard.check(&self.taps);
            if !healthy {
                self.s = [0.0; 4];
                self.taps = [0.0; 5];
            }
            output[i] = if self.guard.is_muted() {
                0.0
            } else {
                y.clamp(-1.0, 1.0)
            };
        }
        self.guard.end_block();
    }

    fn guard(&self) -> &StateGuard {
        &self.guard
    }

    fn inject_state(&mut self, value: f32) {
        self.s = [value; 4];
    }
}
