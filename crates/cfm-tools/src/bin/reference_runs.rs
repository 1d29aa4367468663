//! Generate canonical seeded scenario runs.
//!
//! Scenarios:
//!   - `baseline_quiet`: 2,000 steps, dt=0.1, no perturbations (default)
//!   - `baseline_long`: 20,000 steps, dt=0.1, no perturbations
//!   - `mild_perturbation`: 5,000 steps, small bounded pulses at intervals
//!   - `high_variability`: 10,000 steps, dt jitter + bounded pulses
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cfm-tools --bin cfm-reference-runs -- --scenario mild_perturbation \
//!     --seed 42 --output-json mp.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::builder::PossibleValuesParser;
use clap::Parser;

use cfm_dynamics::v2::PRESET_NAMES;
use cfm_interface::{CORE_TYPES, DEFAULT_CORE_TYPE};
use cfm_tools::{generate_reference_run, init_logging, write_json, ReferenceRunParams};

#[derive(Parser, Debug)]
#[command(name = "cfm-reference-runs")]
#[command(about = "CFM Reference Runs - Generate canonical scenario runs")]
struct Args {
    /// Scenario to run.
    #[arg(
        long,
        default_value = "baseline_quiet",
        value_parser = PossibleValuesParser::new(cfm_tools::scenarios::list_scenarios())
    )]
    scenario: String,

    /// Core variant.
    #[arg(long, default_value = DEFAULT_CORE_TYPE, value_parser = PossibleValuesParser::new(CORE_TYPES))]
    core_type: String,

    /// Preset configuration (v2 only).
    #[arg(long, value_parser = PossibleValuesParser::new(PRESET_NAMES))]
    preset: Option<String>,

    /// Number of steps (overrides the scenario default).
    #[arg(long)]
    steps: Option<usize>,

    /// Time delta per step (overrides the scenario default).
    #[arg(long)]
    dt: Option<f64>,

    /// Seed for jitter and pulses.
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Output file for the run record.
    #[arg(long)]
    output_json: PathBuf,

    /// Suppress the banner and summary.
    #[arg(long)]
    quiet: bool,

    /// Debug-level logging.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let rule = "=".repeat(60);
    if !args.quiet {
        println!("{rule}\nCFM Reference Runs\n{rule}");
        println!("Scenario: {}", args.scenario);
        println!("Core type: {}", args.core_type);
        println!("Preset: {}", args.preset.as_deref().unwrap_or("default"));
        println!("Seed: {}", args.seed);
        if let Some(steps) = args.steps {
            println!("Steps (override): {steps}");
        }
        if let Some(dt) = args.dt {
            println!("dt (override): {dt}");
        }
        println!();
    }

    let run = generate_reference_run(&ReferenceRunParams {
        core_type: args.core_type.clone(),
        preset: args.preset.clone(),
        scenario: args.scenario.clone(),
        steps: args.steps,
        dt: args.dt,
        seed: args.seed,
    })?;

    write_json(&args.output_json, &run)
        .with_context(|| format!("writing {}", args.output_json.display()))?;

    if !args.quiet {
        println!("\n{rule}\nRun Complete\n{rule}");
        println!("Steps: {}", run.metadata.num_steps);
        let pulses = run.metadata.perturbation_steps.as_ref().map_or(0, Vec::len);
        println!("Perturbations: {pulses}\n");
        println!("Final State:");
        for (key, value) in run.final_state.entries() {
            println!("  {key}: {value:.6}");
        }
        if let Some(v) = &run.validation {
            println!("\nValidation:");
            println!("  All bounded [0,1]: {}", v.all_bounded);
            println!("  NaN/Inf count: {}", v.nan_inf_count);
            println!("  Out of bounds count: {}", v.out_of_bounds_count);
        }
        println!("\nSaved to: {}", args.output_json.display());
    }
    Ok(())
}
