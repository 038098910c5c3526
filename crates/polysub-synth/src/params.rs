//! The synth's parameter table.
//!
//! Every user-facing control is a [`SynthParam`]. Its position in
//! [`SynthParam::ALL`] is both its [`ParamId`] and its index for
//! [`ParameterInfo`](polysub_core::ParameterInfo); the order is stable.

use polysub_core::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit};

use crate::filter::XPANDER_MODES;

/// One addressable synth parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SynthParam {
    Osc1Wave,
    Osc1PulseWidth,
    Osc1Tune,
    Osc1Level,
    Osc2Wave,
    Osc2PulseWidth,
    Osc2Tune,
    Osc2Detune,
    Osc2Level,
    SubLevel,
    NoiseLevel,
    Ring1Level,
    Ring2Level,
    FilterModel,
    Cutoff,
    Resonance,
    FilterEnvAmount,
    KeyTrack,
    FilterPoles,
    FilterMode,
    FilterBlend,
    FilterBandpass,
    FilterPush,
    HfCompensation,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    Lfo1Rate,
    Lfo1Wave,
    Lfo1Depth,
    Lfo1Dest,
    Lfo2Rate,
    Lfo2Wave,
    Lfo2Depth,
    Lfo2Dest,
    PitchEnvAmount,
    PwmEnvAmount,
    MasterVolume,
}

/// Number of parameters.
pub const PARAM_COUNT: usize = SynthParam::ALL.len();

const fn level(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Percent, 0.0, 1.0, default)
}

const fn bipolar(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Percent, -1.0, 1.0, default)
}

const fn time(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Milliseconds, 0.5, 10_000.0, default)
        .with_scale(ParamScale::Logarithmic)
}

const fn tune(name: &'static str, short: &'static str) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Semitones, -24.0, 24.0, 0.0)
        .with_flags(ParamFlags::STEPPED)
}

const fn toggle(name: &'static str, short: &'static str, default: u8) -> ParamDescriptor {
    ParamDescriptor::choice(name, short, 2, default)
}

const fn lfo_rate(name: &'static str, short: &'static str, default: f32) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Hertz, 0.01, 50.0, default)
        .with_scale(ParamScale::Logarithmic)
}

impl SynthParam {
    /// Every parameter in id order.
    pub const ALL: [Self; 43] = [
        Self::Osc1Wave,
        Self::Osc1PulseWidth,
        Self::Osc1Tune,
        Self::Osc1Level,
        Self::Osc2Wave,
        Self::Osc2PulseWidth,
        Self::Osc2Tune,
        Self::Osc2Detune,
        Self::Osc2Level,
        Self::SubLevel,
        Self::NoiseLevel,
        Self::Ring1Level,
        Self::Ring2Level,
        Self::FilterModel,
        Self::Cutoff,
        Self::Resonance,
        Self::FilterEnvAmount,
        Self::KeyTrack,
        Self::FilterPoles,
        Self::FilterMode,
        Self::FilterBlend,
        Self::FilterBandpass,
        Self::FilterPush,
        Self::HfCompensation,
        Self::AmpAttack,
        Self::AmpDecay,
        Self::AmpSustain,
        Self::AmpRelease,
        Self::FilterAttack,
        Self::FilterDecay,
        Self::FilterSustain,
        Self::FilterRelease,
        Self::Lfo1Rate,
        Self::Lfo1Wave,
        Self::Lfo1Depth,
        Self::Lfo1Dest,
        Self::Lfo2Rate,
        Self::Lfo2Wave,
        Self::Lfo2Depth,
        Self::Lfo2Dest,
        Self::PitchEnvAmount,
        Self::PwmEnvAmount,
        Self::MasterVolume,
    ];

    /// Parameter with `id`, if any.
    pub fn from_id(id: ParamId) -> Option<Self> {
        Self::ALL.get(id.0 as usize).copied()
    }

    /// Stable id.
    pub fn id(self) -> ParamId {
        ParamId(self as u32)
    }

    /// Position in [`ALL`](Self::ALL).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Full descriptor with id, string id and group filled in.
    pub fn descriptor(self) -> ParamDescriptor {
        let (desc, string_id, group) = match self {
            Self::Osc1Wave => (ParamDescriptor::choice("Osc 1 Wave", "O1 Wave", 5, 2), "osc1_wave", "osc"),
            Self::Osc1PulseWidth => (
                ParamDescriptor::continuous("Osc 1 Pulse Width", "O1 PW", ParamUnit::Percent, 0.05, 0.95, 0.5),
                "osc1_pw",
                "osc",
            ),
            Self::Osc1Tune => (tune("Osc 1 Tune", "O1 Tune"), "osc1_tune", "osc"),
            Self::Osc1Level => (level("Osc 1 Level", "O1 Lvl", 0.5), "osc1_level", "mixer"),
            Self::Osc2Wave => (ParamDescriptor::choice("Osc 2 Wave", "O2 Wave", 5, 2), "osc2_wave", "osc"),
            Self::Osc2PulseWidth => (
                ParamDescriptor::continuous("Osc 2 Pulse Width", "O2 PW", ParamUnit::Percent, 0.05, 0.95, 0.5),
                "osc2_pw",
                "osc",
            ),
            Self::Osc2Tune => (tune("Osc 2 Tune", "O2 Tune"), "osc2_tune", "osc"),
            Self::Osc2Detune => (
                ParamDescriptor::continuous("Osc 2 Detune", "O2 Fine", ParamUnit::None, -50.0, 50.0, 7.0),
                "osc2_detune",
                "osc",
            ),
            Self::Osc2Level => (level("Osc 2 Level", "O2 Lvl", 0.5), "osc2_level", "mixer"),
            Self::SubLevel => (level("Sub Level", "Sub", 0.0), "sub_level", "mixer"),
            Self::NoiseLevel => (level("Noise Level", "Noise", 0.0), "noise_level", "mixer"),
            Self::Ring1Level => (level("Ring 1 Level", "Ring 1", 0.0), "ring1_level", "mixer"),
            Self::Ring2Level => (level("Ring 2 Level", "Ring 2", 0.0), "ring2_level", "mixer"),
            Self::FilterModel => (ParamDescriptor::choice("Filter Model", "Model", 3, 0), "flt_model", "filter"),
            Self::Cutoff => (
                ParamDescriptor::continuous("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 10_000.0, 1000.0)
                    .with_scale(ParamScale::Logarithmic),
                "flt_cutoff",
                "filter",
            ),
            Self::Resonance => (level("Resonance", "Reso", 0.2), "flt_resonance", "filter"),
            Self::FilterEnvAmount => (bipolar("Filter Env Amount", "Env Amt", 0.3), "flt_env_amount", "filter"),
            Self::KeyTrack => (level("Key Tracking", "KeyTrk", 0.5), "flt_keytrack", "filter"),
            Self::FilterPoles => (ParamDescriptor::choice("Filter Poles", "Poles", 2, 1), "flt_poles", "filter"),
            Self::FilterMode => (
                ParamDescriptor::choice("Filter Mode", "Mode", XPANDER_MODES.len() as u8, 0),
                "flt_mode",
                "filter",
            ),
            Self::FilterBlend => (level("Filter Blend", "Blend", 0.0), "flt_blend", "filter"),
            Self::FilterBandpass => (toggle("Filter Bandpass", "BP", 0), "flt_bandpass", "filter"),
            Self::FilterPush => (toggle("Filter Push", "Push", 0), "flt_push", "filter"),
            Self::HfCompensation => (toggle("HF Compensation", "HF Comp", 1), "flt_hf_comp", "filter"),
            Self::AmpAttack => (time("Amp Attack", "A Atk", 5.0), "amp_attack", "amp_env"),
            Self::AmpDecay => (time("Amp Decay", "A Dec", 200.0), "amp_decay", "amp_env"),
            Self::AmpSustain => (level("Amp Sustain", "A Sus", 0.8), "amp_sustain", "amp_env"),
            Self::AmpRelease => (time("Amp Release", "A Rel", 300.0), "amp_release", "amp_env"),
            Self::FilterAttack => (time("Filter Attack", "F Atk", 10.0), "fenv_attack", "filter_env"),
            Self::FilterDecay => (time("Filter Decay", "F Dec", 300.0), "fenv_decay", "filter_env"),
            Self::FilterSustain => (level("Filter Sustain", "F Sus", 0.3), "fenv_sustain", "filter_env"),
            Self::FilterRelease => (time("Filter Release", "F Rel", 300.0), "fenv_release", "filter_env"),
            Self::Lfo1Rate => (lfo_rate("LFO 1 Rate", "L1 Rate", 2.0), "lfo1_rate", "lfo"),
            Self::Lfo1Wave => (ParamDescriptor::choice("LFO 1 Wave", "L1 Wave", 5, 0), "lfo1_wave", "lfo"),
            Self::Lfo1Depth => (level("LFO 1 Depth", "L1 Depth", 0.0), "lfo1_depth", "lfo"),
            Self::Lfo1Dest => (ParamDescriptor::choice("LFO 1 Destination", "L1 Dest", 4, 1), "lfo1_dest", "lfo"),
            Self::Lfo2Rate => (lfo_rate("LFO 2 Rate", "L2 Rate", 5.0), "lfo2_rate", "lfo"),
            Self::Lfo2Wave => (ParamDescriptor::choice("LFO 2 Wave", "L2 Wave", 5, 0), "lfo2_wave", "lfo"),
            Self::Lfo2Depth => (level("LFO 2 Depth", "L2 Depth", 0.0), "lfo2_depth", "lfo"),
            Self::Lfo2Dest => (ParamDescriptor::choice("LFO 2 Destination", "L2 Dest", 4, 0), "lfo2_dest", "lfo"),
            Self::PitchEnvAmount => (bipolar("Pitch Env Amount", "P Env", 0.0), "pitch_env_amount", "mod"),
            Self::PwmEnvAmount => (bipolar("PWM Env Amount", "PWM Env", 0.0), "pwm_env_amount", "mod"),
            Self::MasterVolume => (level("Master Volume", "Volume", 0.7), "master_volume", "master"),
        };
        desc.with_id(self.id(), string_id).with_group(group)
    }
}

impl From<SynthParam> for ParamId {
    fn from(param: SynthParam) -> Self {
        param.id()
    }
}

/// A parameter write, as staged in a transaction or reported by a control
/// dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    /// Target parameter.
    pub param: SynthParam,
    /// Plain value.
    pub value: f32,
}
