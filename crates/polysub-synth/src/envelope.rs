//! ADSR envelopes and the envelope node that applies them to a signal.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use libm::expf;
use polysub_core::{AUDIO_BLOCK_SAMPLES, FloatBlock, GateCell, NodeIo, ParamCell, SignalNode};

const MIN_STAGE_MS: f32 = 0.1;
/// The attack aims past 1.0 so the exponential reaches the peak in finite time.
const ATTACK_TARGET: f32 = 1.2;
const SETTLE_THRESHOLD: f32 = 0.0001;

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising towards the peak.
    Attack,
    /// Falling from the peak towards sustain.
    Decay,
    /// Holding while the gate is held.
    Sustain,
    /// Falling to zero after the gate closed.
    Release,
}

/// Exponential ADSR envelope generator.
///
/// # Example
///
/// ```rust
/// use polysub_synth::{AdsrEnvelope, EnvelopeState};
///
/// let mut env = AdsrEnvelope::new(48000.0);
/// env.set_times(5.0, 100.0, 0.7, 200.0);
/// env.gate_on();
/// for _ in 0..1000 {
///     env.advance();
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
/// env.gate_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,
    attack_ms: f32,
    decay_ms: f32,
    release_ms: f32,
    sustain: f32,
    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl AdsrEnvelope {
    /// Envelope with 10 ms attack, 100 ms decay, 0.7 sustain, 200 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate,
            attack_ms: 0.0,
            decay_ms: 0.0,
            release_ms: 0.0,
            sustain: 0.7,
            attack_coeff: 0.0,
            decay_coeff: 0.0,
            release_coeff: 0.0,
        };
        env.set_times(10.0, 100.0, 0.7, 200.0);
        env
    }

    /// Set all four stages at once. Coefficients are only recomputed for
    /// times that changed.
    pub fn set_times(&mut self, attack_ms: f32, decay_ms: f32, sustain: f32, release_ms: f32) {
        let attack_ms = attack_ms.max(MIN_STAGE_MS);
        if attack_ms != self.attack_ms {
            self.attack_ms = attack_ms;
            self.attack_coeff = self.coefficient(attack_ms);
        }
        let decay_ms = decay_ms.max(MIN_STAGE_MS);
        if decay_ms != self.decay_ms {
            self.decay_ms = decay_ms;
            self.decay_coeff = self.coefficient(decay_ms);
        }
        let release_ms = release_ms.max(MIN_STAGE_MS);
        if release_ms != self.release_ms {
            self.release_ms = release_ms;
            self.release_coeff = self.coefficient(release_ms);
        }
        self.sustain = sustain.clamp(0.0, 1.0);
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Decay time in milliseconds.
    pub fn decay_ms(&self) -> f32 {
        self.decay_ms
    }

    /// Sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Start (or restart) the attack from the current level.
    pub fn gate_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Enter release unless idle.
    pub fn gate_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
        }
    }

    /// Force idle at zero.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Whether the envelope is doing anything.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Attack => {
                self.level = ATTACK_TARGET + (self.level - ATTACK_TARGET) * self.attack_coeff;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.level = self.sustain + (self.level - self.sustain) * self.decay_coeff;
                if (self.level - self.sustain).abs() < SETTLE_THRESHOLD {
                    self.level = self.sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => self.level = self.sustain,
            EnvelopeState::Release => {
                self.level *= self.release_coeff;
                if self.level < SETTLE_THRESHOLD {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }

    fn coefficient(&self, ms: f32) -> f32 {
        let samples = ms * self.sample_rate / 1000.0;
        expf(-1.0 / samples.max(1.0))
    }
}

/// ADSR settings shared by the matching envelope of every voice.
#[derive(Debug)]
pub struct EnvelopeParams {
    /// Attack in ms.
    pub attack_ms: ParamCell,
    /// Decay in ms.
    pub decay_ms: ParamCell,
    /// Sustain level, `0.0..=1.0`.
    pub sustain: ParamCell,
    /// Release in ms.
    pub release_ms: ParamCell,
}

impl EnvelopeParams {
    /// Params with the given stages.
    pub const fn new(attack_ms: f32, decay_ms: f32, sustain: f32, release_ms: f32) -> Self {
        Self {
            attack_ms: ParamCell::new(attack_ms),
            decay_ms: ParamCell::new(decay_ms),
            sustain: ParamCell::new(sustain),
            release_ms: ParamCell::new(release_ms),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(10.0, 100.0, 0.7, 200.0)
    }
}

/// Envelope applied to input 0.
///
/// The node follows the voice's [`GateCell`]: a new generation starts the
/// attack, a released gate starts the release. Output is the input times
/// the envelope level (and the note velocity when velocity sensitive). While
/// the envelope sits at zero nothing is transmitted.
pub struct EnvelopeNode {
    env: AdsrEnvelope,
    params: Arc<EnvelopeParams>,
    gate: Arc<GateCell>,
    generation: u32,
    velocity_sensitive: bool,
    input: FloatBlock,
}

impl EnvelopeNode {
    /// Envelope driven by `gate`, shaped by `params`.
    pub fn new(params: Arc<EnvelopeParams>, gate: Arc<GateCell>, sample_rate: f32) -> Self {
        let generation = gate.generation();
        Self {
            env: AdsrEnvelope::new(sample_rate),
            params,
            gate,
            generation,
            velocity_sensitive: false,
            input: [0.0; AUDIO_BLOCK_SAMPLES],
        }
    }

    /// Scale the output by the note velocity.
    pub fn with_velocity(mut self) -> Self {
        self.velocity_sensitive = true;
        self
    }

    fn follow_gate(&mut self) {
        let generation = self.gate.generation();
        if generation != self.generation {
            self.generation = generation;
            self.env.gate_on();
        }
        if !self.gate.is_held()
            && matches!(
                self.env.state(),
                EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain
            )
        {
            self.env.gate_off();
        }
    }
}

impl SignalNode for EnvelopeNode {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn inputs(&self) -> usize {
        1
    }

    fn outputs(&self) -> usize {
        1
    }

    fn update(&mut self, io: &mut NodeIo<'_>) {
        let p = &*self.params;
        self.env.set_times(
            p.attack_ms.get(),
            p.decay_ms.get(),
            p.sustain.get(),
            p.release_ms.get(),
        );
        self.follow_gate();

        let has_input = io.receive_samples(0, &mut self.input);
        if !self.env.is_active() && self.env.level() == 0.0 {
            return;
        }
        let scale = if self.velocity_sensitive {
            self.gate.velocity()
        } else {
            1.0
        };
        let mut peak = 0.0f32;
        for x in &mut self.input {
            let level = self.env.advance() * scale;
            peak = peak.max(level);
            *x *= level;
        }
        if has_input && peak > 0.0 {
            io.transmit_samples(0, &self.input);
        }
    }
}
