//! Analyze JSON run outputs.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cfm-tools --bin cfm-log-analyzer -- --input out.json
//! cargo run -p cfm-tools --bin cfm-log-analyzer -- --input out.json --format json
//! cargo run -p cfm-tools --bin cfm-log-analyzer -- --input run1.json run2.json --summary
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use cfm_tools::{analyze_run, format_summary, format_text_report, init_logging, read_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cfm-log-analyzer")]
#[command(about = "CFM Log Analyzer - Analyze JSON run outputs")]
struct Args {
    /// Input JSON file(s) to analyze.
    #[arg(long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// Report file (stdout if omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print a one-line-per-file summary instead of full reports.
    #[arg(long)]
    summary: bool,

    /// Suppress progress messages.
    #[arg(long)]
    quiet: bool,

    /// Debug-level logging.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut analyses = Vec::with_capacity(args.input.len());
    for path in &args.input {
        if !args.quiet && args.input.len() > 1 {
            log::info!("analyzing {}", path.display());
        }
        let run = read_json(path).with_context(|| format!("reading {}", path.display()))?;
        analyses.push((path.display().to_string(), analyze_run(&run)));
    }

    let report = if args.summary && analyses.len() > 1 {
        format_summary(&analyses)
    } else {
        match args.format {
            Format::Json if analyses.len() == 1 => serde_json::to_string_pretty(&analyses[0].1)?,
            Format::Json => {
                let all: Vec<_> = analyses.iter().map(|(_, a)| a).collect();
                serde_json::to_string_pretty(&all)?
            }
            Format::Text => analyses
                .iter()
                .map(|(file, a)| format_text_report(a, file))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &report).with_context(|| format!("writing {}", path.display()))?;
            if !args.quiet {
                log::info!("report saved to {}", path.display());
            }
        }
        None => println!("{report}"),
    }
    Ok(())
}
