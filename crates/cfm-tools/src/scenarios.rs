// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Reference Scenarios
// ─────────────────────────────────────────────────────────────────────
//! Canonical seeded runs used as regression baselines.
//!
//! A scenario fixes step count, base `dt`, optional `dt` jitter and an
//! optional pulse schedule. Pulses are delivered as `external_events`;
//! the cores ignore them, so they only perturb the RNG sequence shared
//! with the jitter.

use serde_json::json;

use cfm_interface::create_core;
use cfm_types::{clamp_unit, CfmError, CfmResult};

use crate::run::{RunMetadata, RunRecord, RunValidation, Trajectories};

/// Lower bound on a jittered `dt`.
const MIN_JITTERED_DT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub steps: usize,
    pub dt: f64,
    pub perturbation_interval: Option<usize>,
    pub perturbation_amplitude: f64,
    pub dt_jitter: f64,
}

pub const SCENARIOS: [Scenario; 4] = [
    Scenario {
        name: "baseline_quiet",
        description: "Mild baseline run with no perturbations",
        steps: 2000,
        dt: 0.1,
        perturbation_interval: None,
        perturbation_amplitude: 0.0,
        dt_jitter: 0.0,
    },
    Scenario {
        name: "baseline_long",
        description: "Extended baseline run for full dynamics observation",
        steps: 20_000,
        dt: 0.1,
        perturbation_interval: None,
        perturbation_amplitude: 0.0,
        dt_jitter: 0.0,
    },
    Scenario {
        name: "mild_perturbation",
        description: "Small bounded external_events pulses at fixed intervals",
        steps: 5000,
        dt: 0.1,
        perturbation_interval: Some(500),
        perturbation_amplitude: 0.05,
        dt_jitter: 0.0,
    },
    Scenario {
        name: "high_variability",
        description: "dt jitter + bounded perturbation pulses",
        steps: 10_000,
        dt: 0.1,
        perturbation_interval: Some(200),
        perturbation_amplitude: 0.1,
        dt_jitter: 0.02,
    },
];

pub fn list_scenarios() -> Vec<&'static str> {
    SCENARIOS.iter().map(|s| s.name).collect()
}

pub fn find_scenario(name: &str) -> CfmResult<&'static Scenario> {
    SCENARIOS
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| CfmError::UnknownScenario {
            name: name.to_string(),
            valid: list_scenarios().join(", "),
        })
}

// ── RNG ──────────────────────────────────────────────────────────────

/// Park–Miller "minimal standard" generator (multiplier 48271, modulus 2³¹−1).
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    const MULTIPLIER: u64 = 48_271;
    const MODULUS: u64 = 2_147_483_647;

    /// Seed 0 is mapped to 1.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed % Self::MODULUS };
        Self { state }
    }

    /// Next value in [0, 1).
    pub fn next_float(&mut self) -> f64 {
        self.state = (self.state * Self::MULTIPLIER) % Self::MODULUS;
        self.state as f64 / Self::MODULUS as f64
    }

    /// Next value in [low, high).
    pub fn next_in_range(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_float() * (high - low)
    }
}

// ── Reference runs ───────────────────────────────────────────────────

/// Inputs to [`generate_reference_run`]. `steps` and `dt` override the
/// scenario defaults when set.
#[derive(Debug, Clone)]
pub struct ReferenceRunParams {
    pub core_type: String,
    pub preset: Option<String>,
    pub scenario: String,
    pub steps: Option<usize>,
    pub dt: Option<f64>,
    pub seed: u64,
}

impl Default for ReferenceRunParams {
    fn default() -> Self {
        Self {
            core_type: cfm_interface::DEFAULT_CORE_TYPE.to_string(),
            preset: None,
            scenario: "baseline_quiet".to_string(),
            steps: None,
            dt: None,
            seed: 0,
        }
    }
}

/// Zero non-finite values and clamp the rest into [0, 1].
/// Returns `(non_finite, out_of_bounds)` counts.
fn scrub_diagnostics(values: &mut [f64]) -> (usize, usize) {
    let mut nan_inf = 0;
    let mut out_of_bounds = 0;
    for v in values.iter_mut() {
        if !v.is_finite() {
            nan_inf += 1;
            *v = 0.0;
        } else if !(0.0..=1.0).contains(v) {
            out_of_bounds += 1;
            *v = clamp_unit(*v);
        }
    }
    (nan_inf, out_of_bounds)
}

/// Generate a seeded run for a named scenario.
///
/// Non-finite diagnostics are recorded as 0 and counted; out-of-range
/// values are clamped and counted. Identical params give identical
/// trajectories.
pub fn generate_reference_run(params: &ReferenceRunParams) -> CfmResult<RunRecord> {
    let scenario = find_scenario(&params.scenario)?;
    let steps = params.steps.unwrap_or(scenario.steps);
    let dt = params.dt.unwrap_or(scenario.dt);

    let mut core = create_core(&params.core_type, params.preset.as_deref())?;
    let mut rng = DeterministicRng::new(params.seed);
    let mut trajectories = Trajectories::with_capacity(steps);
    let mut perturbation_steps = Vec::new();
    let mut nan_inf_count = 0;
    let mut out_of_bounds_count = 0;

    log::debug!(
        "reference run '{}' on {}: {steps} steps, dt={dt}, seed={}",
        scenario.name,
        params.core_type,
        params.seed
    );

    for step in 0..steps {
        let effective_dt = if scenario.dt_jitter > 0.0 {
            let jitter = rng.next_in_range(-scenario.dt_jitter, scenario.dt_jitter);
            (dt + jitter).max(MIN_JITTERED_DT)
        } else {
            dt
        };

        let events = match scenario.perturbation_interval {
            Some(interval) if interval > 0 && (step + 1) % interval == 0 => {
                let pulse = rng.next_in_range(0.0, scenario.perturbation_amplitude);
                perturbation_steps.push(step);
                Some(json!({"numeric_pulse": pulse, "step_triggered": step}))
            }
            _ => None,
        };

        let out = core.step_with(None, events.as_ref(), effective_dt);
        let mut values = out.diagnostics();
        let (nan_inf, out_of_bounds) = scrub_diagnostics(&mut values);
        nan_inf_count += nan_inf;
        out_of_bounds_count += out_of_bounds;
        trajectories.push(values);
    }

    if nan_inf_count + out_of_bounds_count > 0 {
        log::warn!(
            "reference run '{}': {nan_inf_count} non-finite, {out_of_bounds_count} out-of-range values",
            scenario.name
        );
    }

    Ok(RunRecord {
        metadata: RunMetadata {
            core_type: params.core_type.clone(),
            preset: params.preset.clone(),
            scenario: scenario.name.to_string(),
            scenario_description: Some(scenario.description.to_string()),
            num_steps: steps,
            dt,
            dt_jitter: Some(scenario.dt_jitter),
            seed: Some(params.seed),
            perturbation_interval: scenario.perturbation_interval,
            perturbation_amplitude: Some(scenario.perturbation_amplitude),
            perturbation_steps: Some(perturbation_steps),
            timestamp: crate::timestamp(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
        final_state: trajectories.final_state(),
        trajectories,
        validation: Some(RunValidation {
            nan_inf_count,
            out_of_bounds_count,
            all_bounded: nan_inf_count == 0 && out_of_bounds_count == 0,
            deterministic: true,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(scenario: &str, steps: usize, seed: u64) -> ReferenceRunParams {
        ReferenceRunParams {
            scenario: scenario.to_string(),
            steps: Some(steps),
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn test_rng_minstd_sequence() {
        let mut rng = DeterministicRng::new(1);
        rng.next_float();
        assert_eq!(rng.state, 48_271);
        rng.next_float();
        assert_eq!(rng.state, 182_605_794);
    }

    #[test]
    fn test_rng_seed_zero_maps_to_one() {
        let mut a = DeterministicRng::new(0);
        let mut b = DeterministicRng::new(1);
        for _ in 0..10 {
            assert_eq!(a.next_float(), b.next_float());
        }
    }

    #[test]
    fn test_rng_range() {
        let mut rng = DeterministicRng::new(42);
        for _ in 0..1000 {
            let v = rng.next_in_range(-0.02, 0.02);
            assert!((-0.02..0.02).contains(&v));
        }
    }

    #[test]
    fn test_scrub_diagnostics_counts() {
        let mut values = [0.4, f64::NAN, 1.7, -0.2, f64::INFINITY];
        let (nan_inf, out_of_bounds) = scrub_diagnostics(&mut values);
        assert_eq!((nan_inf, out_of_bounds), (2, 2));
        assert_eq!(values, [0.4, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scenario_table() {
        assert_eq!(
            list_scenarios(),
            vec!["baseline_quiet", "baseline_long", "mild_perturbation", "high_variability"]
        );
        let hv = find_scenario("high_variability").unwrap();
        assert_eq!(hv.steps, 10_000);
        assert_eq!(hv.perturbation_interval, Some(200));
        assert!(SCENARIOS.iter().all(|s| s.dt == 0.1));
    }

    #[test]
    fn test_unknown_scenario() {
        let err = generate_reference_run(&params("stormy", 10, 0)).unwrap_err();
        match err {
            CfmError::UnknownScenario { name, valid } => {
                assert_eq!(name, "stormy");
                assert!(valid.contains("baseline_quiet"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_baseline_quiet_defaults() {
        let run = generate_reference_run(&ReferenceRunParams::default()).unwrap();
        assert_eq!(run.trajectories.len(), 2000);
        assert_eq!(run.metadata.dt, 0.1);
        assert_eq!(run.metadata.perturbation_steps, Some(vec![]));
        let v = run.validation.unwrap();
        assert!(v.all_bounded && v.deterministic);
        assert_eq!(v.nan_inf_count + v.out_of_bounds_count, 0);
    }

    #[test]
    fn test_perturbation_schedule() {
        let run = generate_reference_run(&params("mild_perturbation", 1500, 3)).unwrap();
        assert_eq!(run.metadata.perturbation_steps, Some(vec![499, 999, 1499]));
        assert_eq!(run.metadata.perturbation_interval, Some(500));
    }

    #[test]
    fn test_same_seed_same_trajectories() {
        let a = generate_reference_run(&params("high_variability", 600, 42)).unwrap();
        let b = generate_reference_run(&params("high_variability", 600, 42)).unwrap();
        assert_eq!(a.trajectories, b.trajectories);
    }

    #[test]
    fn test_seed_changes_jittered_run() {
        let a = generate_reference_run(&params("high_variability", 600, 1)).unwrap();
        let b = generate_reference_run(&params("high_variability", 600, 2)).unwrap();
        assert_ne!(a.trajectories, b.trajectories);
    }

    #[test]
    fn test_overrides_and_variants() {
        for core_type in ["cfm_v0", "cfm_v1", "cfm_v2"] {
            let run = generate_reference_run(&ReferenceRunParams {
                core_type: core_type.to_string(),
                scenario: "high_variability".to_string(),
                steps: Some(400),
                dt: Some(0.5),
                seed: 9,
                ..Default::default()
            })
            .unwrap();
            assert_eq!(run.metadata.num_steps, 400);
            assert_eq!(run.metadata.dt, 0.5);
            assert!(run.validation.unwrap().all_bounded, "{core_type}");
        }
    }
}
