//! polysub platform - controller input for the polysub engine.
//!
//! Hardware and MIDI controllers send 7-bit control-change values. This crate
//! turns them into parameter writes on a [`SynthControl`](polysub_synth::SynthControl):
//!
//! - [`Curve`] - scaling from a controller value to an engine value and back
//! - [`CcMap`] - fixed-capacity table of controller number to parameter and curve
//! - [`ControlDispatcher`] - applies a controller move and reads the
//!   current setting back as a controller value
//!
//! Transport parsing (running status, SysEx, USB framing) belongs to the
//! host; the dispatcher expects an already-decoded controller number and
//! value.
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! polysub-platform = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use polysub_platform::ControlDispatcher;
//! use polysub_synth::{Synth, SynthParam, SynthSettings};
//!
//! let (_synth, mut control) = Synth::new(&SynthSettings::default()).unwrap();
//! let dispatcher = ControlDispatcher::default();
//!
//! // Mod wheel fully up: LFO 1 depth at maximum.
//! dispatcher.handle(&mut control, 1, 127);
//! assert_eq!(control.get(SynthParam::Lfo1Depth), Some(1.0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod cc_map;
pub mod curve;
pub mod dispatcher;

pub use cc_map::{CC_MAP_CAPACITY, CcEntry, CcMap};
pub use curve::{CC_MAX, Curve};
pub use dispatcher::ControlDispatcher;
