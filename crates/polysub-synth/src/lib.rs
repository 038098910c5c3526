//! polysub synth: voices, filters and the complete eight-voice engine built
//! on the `polysub-core` signal graph.
//!
//! # Components
//!
//! ## Sources
//!
//! - [`Oscillator`] / [`OscillatorNode`] - band-limited (PolyBLEP) oscillator
//!   and its voice node, plus the sub-oscillator variant
//! - [`NoiseNode`] - per-voice white noise
//!
//! ## Filters
//!
//! Three resonant low-pass cores behind one [`FilterCore`] trait, all
//! protected by a [`StateGuard`] that resets and mutes a diverged core:
//!
//! - [`DiodeLadder`] - four coupled diode stages solved iteratively
//! - [`MoogLadder`] - transistor ladder with saturating stages
//! - [`Multimode`] - 2- or 4-pole ladder whose stage taps are mixed into the
//!   fifteen [`XpanderMode`] responses
//!
//! [`FilterNode`] hosts whichever model the patch selects.
//!
//! ## Envelopes and modulation
//!
//! - [`AdsrEnvelope`] / [`EnvelopeNode`] - gate-driven ADSR
//! - [`LfoNode`], [`ModulationBus`] and [`LfoDestination`] - two global LFOs
//!   routed atomically to one destination each
//!
//! ## Voices and the engine
//!
//! - [`VoiceAllocator`] - note-to-voice mapping with oldest-first stealing
//! - [`Synth`] / [`SynthControl`] - the audio and control halves of the
//!   engine, addressed through [`SynthParam`]
//!
//! ```rust
//! use polysub_synth::{Synth, SynthParam, SynthSettings};
//!
//! let (mut synth, mut control) = Synth::new(&SynthSettings::default()).unwrap();
//! control.set(SynthParam::Cutoff, 1200.0);
//! for note in [60, 64, 67] {
//!     control.note_on(note, 0.9);
//! }
//! for _ in 0..100 {
//!     let block = synth.tick();
//!     assert!(block.iter().all(|s| s.is_finite()));
//! }
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polysub-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allocator;
pub mod envelope;
pub mod filter;
pub mod modulation;
pub mod oscillator;
pub mod params;
pub mod synth;
pub mod voice;

pub use allocator::{Allocation, MAX_NOTE, VoiceAllocator, VoiceSlot, VoiceState};
pub use envelope::{AdsrEnvelope, EnvelopeNode, EnvelopeParams, EnvelopeState};
pub use filter::{
    DiodeLadder, FilterCore, FilterModel, FilterNode, FilterParams, MoogLadder, Multimode,
    MultimodeTopology, StateGuard, XpanderMode,
};
pub use modulation::{LfoDestination, LfoNode, LfoParams, ModulationBus};
pub use oscillator::{NoiseNode, OscParams, Oscillator, OscillatorNode, OscillatorWaveform};
pub use params::{PARAM_COUNT, ParamChange, SynthParam};
pub use synth::{
    PARAM_TRANSACTION_CAPACITY, ParamTransaction, Synth, SynthControl, SynthError, SynthSettings,
    VOICE_COUNT,
};
pub use voice::{Patch, VoiceHandle};

pub use polysub_core::{LfoWaveform, NoteDivision, TempoSource};
