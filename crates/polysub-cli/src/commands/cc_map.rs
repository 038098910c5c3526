//! Control-change map listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use polysub_platform::{CcMap, Curve};

#[derive(Args)]
pub struct CcMapArgs {
    /// Show the parameter value for every controller step of this CC
    #[arg(value_name = "CC")]
    cc: Option<u8>,
}

pub fn run(args: CcMapArgs) -> anyhow::Result<()> {
    let map = CcMap::default();

    if let Some(cc) = args.cc {
        let entry = map
            .get(cc)
            .ok_or_else(|| anyhow::anyhow!("CC {cc} is not mapped"))?;
        let desc = entry.param.descriptor();
        println!("CC {} -> {} ({})", cc, desc.name, describe(entry.curve));
        for value in (0..=127u8).step_by(8).chain([127]) {
            println!(
                "  {:3}  {:.3}{}",
                value,
                entry.curve.to_value(value),
                desc.unit.suffix()
            );
        }
        return Ok(());
    }

    println!("MIDI CC Map");
    println!("===========");
    println!();
    println!("  {:3}  {:18}  {}", "CC", "Parameter", "Curve");
    println!("  {:3}  {:18}  {}", "--", "---------", "-----");
    for entry in map.iter() {
        println!(
            "  {:3}  {:18}  {}",
            entry.cc,
            entry.param.descriptor().string_id,
            describe(entry.curve)
        );
    }
    Ok(())
}

fn describe(curve: Curve) -> String {
    match curve {
        Curve::Exponential { min, max } => format!("exponential {min} .. {max}"),
        Curve::Linear { min, max } => format!("linear {min} .. {max}"),
        Curve::Stepped { steps } => format!("stepped, {steps} choices"),
        Curve::Toggle => "toggle".to_string(),
    }
}
