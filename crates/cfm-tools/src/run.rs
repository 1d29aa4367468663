// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Trajectory Runs
// ─────────────────────────────────────────────────────────────────────
//! Fixed-`dt` local loops and the record format shared by all run tools.

use serde::{Deserialize, Serialize};

use cfm_interface::create_core;
use cfm_types::{CfmResult, StepOutput};

/// Steps between progress log lines.
const PROGRESS_INTERVAL: usize = 100;

/// The four diagnostic series, one value per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trajectories {
    pub coherence: Vec<f64>,
    pub stability: Vec<f64>,
    pub intensity: Vec<f64>,
    pub alignment: Vec<f64>,
}

impl Trajectories {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            coherence: Vec::with_capacity(n),
            stability: Vec::with_capacity(n),
            intensity: Vec::with_capacity(n),
            alignment: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, values: [f64; 4]) {
        self.coherence.push(values[0]);
        self.stability.push(values[1]);
        self.intensity.push(values[2]);
        self.alignment.push(values[3]);
    }

    pub fn len(&self) -> usize {
        self.coherence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coherence.is_empty()
    }

    /// Last recorded values, or zeros for an empty run.
    pub fn final_state(&self) -> FinalState {
        let last = |v: &[f64]| v.last().copied().unwrap_or(0.0);
        FinalState {
            coherence: last(&self.coherence),
            stability: last(&self.stability),
            intensity: last(&self.intensity),
            alignment: last(&self.alignment),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalState {
    pub coherence: f64,
    pub stability: f64,
    pub intensity: f64,
    pub alignment: f64,
}

impl FinalState {
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("coherence", self.coherence),
            ("stability", self.stability),
            ("intensity", self.intensity),
            ("alignment", self.alignment),
        ]
    }
}

/// Run provenance. Scenario-only fields are omitted for local loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub core_type: String,
    pub preset: Option<String>,
    pub scenario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_description: Option<String>,
    pub num_steps: usize,
    pub dt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_jitter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perturbation_interval: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perturbation_amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perturbation_steps: Option<Vec<usize>>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Anomaly tally collected while recording a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunValidation {
    pub nan_inf_count: usize,
    pub out_of_bounds_count: usize,
    pub all_bounded: bool,
    pub deterministic: bool,
}

/// A complete run as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub metadata: RunMetadata,
    pub trajectories: Trajectories,
    pub final_state: FinalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<RunValidation>,
}

fn log_progress(step: usize, total: usize, out: &StepOutput) {
    log::info!(
        "step {}/{}: C={:.4} S={:.4} I={:.4} A={:.4}",
        step,
        total,
        out.coherence,
        out.stability,
        out.intensity,
        out.alignment
    );
}

/// Run `core_type` for `num_steps` steps at a fixed `dt`.
///
/// With `verbose`, a progress line is logged every 100 steps.
pub fn run_local_loop(
    core_type: &str,
    preset: Option<&str>,
    num_steps: usize,
    dt: f64,
    verbose: bool,
) -> CfmResult<RunRecord> {
    let mut core = create_core(core_type, preset)?;
    let mut trajectories = Trajectories::with_capacity(num_steps);

    for step in 0..num_steps {
        let out = core.step(dt);
        trajectories.push(out.diagnostics());
        if verbose && (step + 1) % PROGRESS_INTERVAL == 0 {
            log_progress(step + 1, num_steps, &out);
        }
    }

    Ok(RunRecord {
        metadata: RunMetadata {
            core_type: core_type.to_string(),
            preset: preset.map(str::to_string),
            scenario: "local_loop".to_string(),
            scenario_description: None,
            num_steps,
            dt,
            dt_jitter: None,
            seed: None,
            perturbation_interval: None,
            perturbation_amplitude: None,
            perturbation_steps: None,
            timestamp: crate::timestamp(),
            version: None,
        },
        final_state: trajectories.final_state(),
        trajectories,
        validation: None,
    })
}
