//! Property tests: the filter cores stay finite and never need their
//! divergence guard for any in-range setting driven by a bounded signal.

use polysub_core::{AUDIO_BLOCK_SAMPLES, FloatBlock};
use polysub_synth::{DiodeLadder, FilterCore, MoogLadder, Multimode, MultimodeTopology, XpanderMode};
use proptest::prelude::*;

const SR: f32 = 44100.0;
const BLOCKS: usize = 30;

#[derive(Debug, Clone)]
struct Drive {
    cutoff: f32,
    resonance: f32,
    amplitude: f32,
    freq: f32,
    cutoff_mod: f32,
}

fn drive() -> impl Strategy<Value = Drive> {
    (
        20.0f32..19_000.0,
        0.0f32..=1.0,
        0.0f32..2.0,
        30.0f32..8000.0,
        -1.0f32..1.0,
    )
        .prop_map(|(cutoff, resonance, amplitude, freq, cutoff_mod)| Drive {
            cutoff,
            resonance,
            amplitude,
            freq,
            cutoff_mod,
        })
}

/// Run `core` on a sine and return whether every output sample was finite
/// and within full scale.
fn exercise(core: &mut dyn FilterCore, d: &Drive) -> bool {
    core.set_cutoff(d.cutoff);
    core.set_resonance(d.resonance);
    core.reset();
    let cutoff_mod: FloatBlock = [d.cutoff_mod; AUDIO_BLOCK_SAMPLES];
    let resonance_mod: FloatBlock = [0.0; AUDIO_BLOCK_SAMPLES];
    let mut out: FloatBlock = [0.0; AUDIO_BLOCK_SAMPLES];
    let mut ok = true;
    for b in 0..BLOCKS {
        let input: FloatBlock = core::array::from_fn(|i| {
            let n = (b * AUDIO_BLOCK_SAMPLES + i) as f32;
            d.amplitude * (core::f32::consts::TAU * d.freq * n / SR).sin()
        });
        core.process_block(&input, &cutoff_mod, &resonance_mod, &mut out);
        ok &= out.iter().all(|y| y.is_finite() && y.abs() <= 1.0);
    }
    ok
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn diode_never_trips(d in drive()) {
        let mut core = DiodeLadder::new(SR);
        prop_assert!(exercise(&mut core, &d));
        prop_assert_eq!(core.guard().trip_count(), 0);
    }

    #[test]
    fn moog_never_trips(d in drive()) {
        let mut core = MoogLadder::new(SR);
        prop_assert!(exercise(&mut core, &d));
        prop_assert_eq!(core.guard().trip_count(), 0);
    }

    #[test]
    fn multimode_never_trips(
        d in drive(),
        two_pole in any::<bool>(),
        push in any::<bool>(),
        mode in 0u8..15,
    ) {
        let mut core = Multimode::new(SR);
        core.set_topology(if two_pole { MultimodeTopology::TwoPole } else { MultimodeTopology::FourPole });
        core.set_push(push);
        core.set_mode(XpanderMode::from_index(mode));
        prop_assert!(exercise(&mut core, &d));
        prop_assert_eq!(core.guard().trip_count(), 0);
    }
}
