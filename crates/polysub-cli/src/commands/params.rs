//! Parameter table listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use polysub_synth::SynthParam;

#[derive(Args)]
pub struct ParamsArgs {
    /// Only show parameters in this group (osc, mixer, filter, amp_env, ...)
    #[arg(long)]
    group: Option<String>,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    println!("Synth Parameters");
    println!("================");
    println!();
    println!(
        "  {:3}  {:18}  {:20}  {:>10}  {}",
        "Id", "Key", "Name", "Default", "Range"
    );
    println!(
        "  {:3}  {:18}  {:20}  {:>10}  {}",
        "--", "---", "----", "-------", "-----"
    );

    let mut shown = 0;
    for param in SynthParam::ALL {
        let desc = param.descriptor();
        if args
            .group
            .as_deref()
            .is_some_and(|group| !group.eq_ignore_ascii_case(desc.group))
        {
            continue;
        }
        let suffix = desc.unit.suffix();
        let default = format!("{}{suffix}", desc.default);
        println!(
            "  {:3}  {:18}  {:20}  {:>10}  {} .. {}{}",
            desc.id.0,
            desc.string_id,
            desc.name,
            default,
            desc.min,
            desc.max,
            suffix
        );
        shown += 1;
    }

    if shown == 0
        && let Some(group) = &args.group
    {
        anyhow::bail!("No parameters in group '{group}'");
    }
    Ok(())
}
