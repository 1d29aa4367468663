//! Extract fingerprints from reference runs, or compare two fingerprints.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cfm-tools --bin cfm-fingerprint -- --input run.json --output fp.json
//! cargo run -p cfm-tools --bin cfm-fingerprint -- --compare fp_old.json fp_new.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use cfm_tools::{compare_fingerprints, extract_fingerprint, init_logging, read_json, write_json};

/// Significant differences printed in compare mode.
const MAX_LISTED: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "cfm-fingerprint")]
#[command(about = "CFM Fingerprint Extractor - Compute fingerprints from reference runs")]
struct Args {
    /// Input reference run JSON file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output fingerprint JSON file (stdout if omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Compare two fingerprint files.
    #[arg(long, num_args = 2, value_names = ["FP1", "FP2"])]
    compare: Option<Vec<PathBuf>>,

    /// Suppress progress output.
    #[arg(long)]
    quiet: bool,

    /// Debug-level logging.
    #[arg(long)]
    verbose: bool,
}

fn compare(paths: &[PathBuf]) -> anyhow::Result<()> {
    let [first, second] = paths else {
        anyhow::bail!("--compare takes exactly two files");
    };
    let fp1 = read_json(first).with_context(|| format!("reading {}", first.display()))?;
    let fp2 = read_json(second).with_context(|| format!("reading {}", second.display()))?;
    let cmp = compare_fingerprints(&fp1, &fp2);

    let rule = "=".repeat(60);
    let or_na = |s: &Option<String>| s.clone().unwrap_or_else(|| "N/A".to_string());
    println!("\n{rule}\nFINGERPRINT COMPARISON\n{rule}");
    for (label, path, summary) in [
        ("Fingerprint 1", first, &cmp.fingerprint1),
        ("Fingerprint 2", second, &cmp.fingerprint2),
    ] {
        println!("\n{label}: {}", path.display());
        println!("  Core: {}", or_na(&summary.core_type));
        println!("  Scenario: {}", or_na(&summary.scenario));
    }
    println!("\nCore type match: {}", cmp.core_type_match);
    println!("Scenario match: {}", cmp.scenario_match);
    println!("\nTotal differences: {}", cmp.total_differences);
    println!("Significant differences (>5% relative): {}", cmp.significant_differences);
    if !cmp.significant_diff_details.is_empty() {
        println!("\nSignificant differences:");
        for diff in cmp.significant_diff_details.iter().take(MAX_LISTED) {
            println!("  {}", diff.describe());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(paths) = &args.compare {
        return compare(paths);
    }

    let Some(input) = &args.input else {
        Args::command().print_help()?;
        return Ok(());
    };

    if !args.quiet {
        log::info!("fingerprinting {}", input.display());
    }
    let run = read_json(input).with_context(|| format!("reading {}", input.display()))?;
    let mut fingerprint = extract_fingerprint(&run);
    fingerprint.source_file = Some(input.display().to_string());

    match &args.output {
        Some(path) => {
            write_json(path, &fingerprint).with_context(|| format!("writing {}", path.display()))?;
            if !args.quiet {
                log::info!("saved fingerprint to {}", path.display());
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&fingerprint)?),
    }
    Ok(())
}
