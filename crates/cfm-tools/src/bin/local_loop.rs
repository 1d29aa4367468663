//! Run a CFM core locally for a fixed number of steps.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cfm-tools --bin cfm-local-loop -- --steps 5000 --preset pulsed_activity \
//!     --dt 0.1 --output-json out/loop.json --verbose
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::builder::PossibleValuesParser;
use clap::Parser;

use cfm_dynamics::v2::PRESET_NAMES;
use cfm_interface::{CORE_TYPES, DEFAULT_CORE_TYPE};
use cfm_tools::{init_logging, run_local_loop, write_json};

#[derive(Parser, Debug)]
#[command(name = "cfm-local-loop")]
#[command(about = "CFM Local Loop - Run CFM cores locally")]
struct Args {
    /// Number of steps to run.
    #[arg(long, default_value = "1000")]
    steps: usize,

    /// Core variant.
    #[arg(long, default_value = DEFAULT_CORE_TYPE, value_parser = PossibleValuesParser::new(CORE_TYPES))]
    core_type: String,

    /// Preset configuration (v2 only).
    #[arg(long, value_parser = PossibleValuesParser::new(PRESET_NAMES))]
    preset: Option<String>,

    /// Time delta per step.
    #[arg(long, default_value = "1.0")]
    dt: f64,

    /// Write the run record to this file.
    #[arg(long)]
    output_json: Option<PathBuf>,

    /// Log progress every 100 steps.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let rule = "=".repeat(60);
    println!("{rule}\nCFM Local Loop\n{rule}");
    println!("Core type: {}", args.core_type);
    println!("Preset: {}", args.preset.as_deref().unwrap_or("default"));
    println!("Steps: {}", args.steps);
    println!("dt: {}\n", args.dt);

    let run = run_local_loop(
        &args.core_type,
        args.preset.as_deref(),
        args.steps,
        args.dt,
        args.verbose,
    )?;

    println!("\n{rule}\nFinal State:\n{rule}");
    for (key, value) in run.final_state.entries() {
        println!("  {key}: {value:.6}");
    }

    if let Some(path) = &args.output_json {
        write_json(path, &run).with_context(|| format!("writing {}", path.display()))?;
        println!("\nSaved output to: {}", path.display());
    }
    Ok(())
}
