// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Tooling
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Offline tooling around the CFM cores.
//!
//!   - [`run`]: fixed-`dt` trajectory loops and the shared run record
//!   - [`scenarios`]: seeded reference scenarios with jitter and pulses
//!   - [`analyze`]: statistics and anomaly counts over run files
//!   - [`fingerprint`]: compact run statistics and regression diffs
//!
//! Each module backs one binary under `src/bin/`.

use std::fs;
use std::path::Path;

use serde::Serialize;

use cfm_types::CfmResult;

pub mod analyze;
pub mod fingerprint;
pub mod run;
pub mod scenarios;

pub use analyze::{analyze_run, format_summary, format_text_report, MetricStats, RunAnalysis};
pub use fingerprint::{compare_fingerprints, extract_fingerprint, Difference, Fingerprint};
pub use run::{run_local_loop, FinalState, RunMetadata, RunRecord, RunValidation, Trajectories};
pub use scenarios::{
    generate_reference_run, list_scenarios, DeterministicRng, ReferenceRunParams, Scenario,
    SCENARIOS,
};

/// Local wall-clock time in ISO-8601 form, microsecond precision.
pub fn timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> CfmResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Parse a JSON document from `path`.
pub fn read_json(path: &Path) -> CfmResult<serde_json::Value> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Install the stderr subscriber used by the binaries. `log` records from
/// the library crates are forwarded to it.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
