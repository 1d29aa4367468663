// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core v1
// ─────────────────────────────────────────────────────────────────────
//! Slow/fast split core.
//!
//! Fast variables (phase, alignment phase, instability) oscillate on
//! sub-unit timescales; slow variables (energy, coherence baseline,
//! coherence) drift. Coherence builds slowly and decays faster under
//! instability. Alignment locks in once coherence·stability clears
//! `alignment_lock_strength`.

use serde::{Deserialize, Serialize};

use cfm_types::consts::{PHI, PHI_INV, PHI_INV_SQ, PHI_SQ, PSI, PSI_INV, TAU};
use cfm_types::{CfmError, CfmResult, StepOutput};

use crate::math::{clamp01, half_wave, smooth_step, wrap_phase};
use crate::protocol::{clamp_dt, clamp_field, map_get, positive_field, CfmCore, StateMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfmV1Config {
    // Slow
    pub tau_coherence: f64,
    pub tau_energy: f64,
    // Fast
    pub tau_instability: f64,
    pub omega_phase: f64,

    pub coherence_target: f64,
    pub energy_target: f64,
    pub stability_baseline: f64,

    /// Clamped to [0, 2].
    pub coherence_decay_rate: f64,
    pub alignment_lock_strength: f64,
    /// Clamped to [0, 0.5].
    pub intensity_coherence_coupling: f64,
    /// Clamped to [0, 0.5].
    pub instability_base: f64,

    pub max_dt: f64,
}

impl Default for CfmV1Config {
    fn default() -> Self {
        Self {
            tau_coherence: PHI_SQ,
            tau_energy: PHI,
            tau_instability: PHI_INV,
            omega_phase: PHI_INV,
            coherence_target: PHI_INV + 0.1,
            energy_target: PHI_INV,
            stability_baseline: 1.0 - PHI_INV_SQ,
            coherence_decay_rate: PSI_INV,
            alignment_lock_strength: PHI_INV,
            intensity_coherence_coupling: 1.0 / (2.0 * PHI),
            instability_base: 1.0 / (2.0 * PHI),
            max_dt: 1.0,
        }
    }
}

impl CfmV1Config {
    pub fn normalized(self) -> Self {
        let d = Self::default();
        let unit = |name: &str, v: f64, default: f64| clamp_field(name, v, 0.0, 1.0, default);
        Self {
            tau_coherence: positive_field("tau_coherence", self.tau_coherence, d.tau_coherence),
            tau_energy: positive_field("tau_energy", self.tau_energy, d.tau_energy),
            tau_instability: positive_field("tau_instability", self.tau_instability, d.tau_instability),
            omega_phase: positive_field("omega_phase", self.omega_phase, d.omega_phase),
            coherence_target: unit("coherence_target", self.coherence_target, d.coherence_target),
            energy_target: unit("energy_target", self.energy_target, d.energy_target),
            stability_baseline: unit("stability_baseline", self.stability_baseline, d.stability_baseline),
            coherence_decay_rate: clamp_field(
                "coherence_decay_rate",
                self.coherence_decay_rate,
                0.0,
                2.0,
                d.coherence_decay_rate,
            ),
            alignment_lock_strength: unit(
                "alignment_lock_strength",
                self.alignment_lock_strength,
                d.alignment_lock_strength,
            ),
            intensity_coherence_coupling: clamp_field(
                "intensity_coherence_coupling",
                self.intensity_coherence_coupling,
                0.0,
                0.5,
                d.intensity_coherence_coupling,
            ),
            instability_base: clamp_field(
                "instability_base",
                self.instability_base,
                0.0,
                0.5,
                d.instability_base,
            ),
            max_dt: positive_field("max_dt", self.max_dt, d.max_dt),
        }
    }

    pub fn from_json(json: &str) -> CfmResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| CfmError::Config(format!("JSON parse error: {e}")))?;
        Ok(cfg.normalized())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfmV1State {
    pub coherence: f64,
    pub coherence_baseline: f64,
    pub energy: f64,
    pub instability: f64,
    pub phase: f64,
    pub alignment_phase: f64,
    pub time: f64,
    pub step_count: u64,
}

impl Default for CfmV1State {
    fn default() -> Self {
        Self {
            coherence: PHI_INV,
            coherence_baseline: PHI_INV,
            energy: PHI_INV,
            instability: PHI_INV_SQ,
            phase: 0.0,
            alignment_phase: 0.0,
            time: 0.0,
            step_count: 0,
        }
    }
}

impl CfmV1State {
    pub fn normalized(self) -> Self {
        Self {
            coherence: clamp01(self.coherence),
            coherence_baseline: clamp01(self.coherence_baseline),
            energy: clamp01(self.energy),
            instability: clamp01(self.instability),
            phase: wrap_phase(self.phase),
            alignment_phase: wrap_phase(self.alignment_phase),
            time: if self.time.is_finite() { self.time.max(0.0) } else { 0.0 },
            step_count: self.step_count,
        }
    }

    pub fn validate(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let phase = |v: f64| (0.0..1.0).contains(&v);
        unit(self.coherence)
            && unit(self.coherence_baseline)
            && unit(self.energy)
            && unit(self.instability)
            && phase(self.phase)
            && phase(self.alignment_phase)
            && self.time >= 0.0
    }

    pub fn to_map(&self) -> StateMap {
        let mut m = StateMap::new();
        m.insert("coherence".into(), self.coherence);
        m.insert("coherence_baseline".into(), self.coherence_baseline);
        m.insert("energy".into(), self.energy);
        m.insert("instability".into(), self.instability);
        m.insert("phase".into(), self.phase);
        m.insert("alignment_phase".into(), self.alignment_phase);
        m.insert("time".into(), self.time);
        m.insert("step_count".into(), self.step_count as f64);
        m
    }

    pub fn from_map(map: &StateMap) -> Self {
        let d = Self::default();
        let steps = map_get(map, "step_count", 0.0);
        Self {
            coherence: map_get(map, "coherence", d.coherence),
            coherence_baseline: map_get(map, "coherence_baseline", d.coherence_baseline),
            energy: map_get(map, "energy", d.energy),
            instability: map_get(map, "instability", d.instability),
            phase: map_get(map, "phase", d.phase),
            alignment_phase: map_get(map, "alignment_phase", d.alignment_phase),
            time: map_get(map, "time", d.time),
            step_count: if steps.is_finite() && steps > 0.0 { steps as u64 } else { 0 },
        }
        .normalized()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CfmCoreV1 {
    config: CfmV1Config,
    state: CfmV1State,
}

impl CfmCoreV1 {
    pub fn new(config: CfmV1Config) -> Self {
        Self {
            config: config.normalized(),
            state: CfmV1State::default(),
        }
    }

    pub fn with_state(config: CfmV1Config, initial: CfmV1State) -> Self {
        Self {
            config: config.normalized(),
            state: initial.normalized(),
        }
    }

    pub fn config(&self) -> &CfmV1Config {
        &self.config
    }

    pub fn get_state(&self) -> CfmV1State {
        self.state.clone()
    }

    pub fn reset_to(&mut self, initial: Option<CfmV1State>) {
        self.state = initial.map(CfmV1State::normalized).unwrap_or_default();
    }

    fn update(&mut self, dt: f64) {
        let cfg = &self.config;
        let s = &mut self.state;

        s.time += dt;
        s.step_count += 1;

        // Fast
        s.phase = wrap_phase(s.phase + dt * cfg.omega_phase);
        s.alignment_phase = wrap_phase(s.alignment_phase + dt * cfg.omega_phase * PSI);

        let drive = cfg.instability_base * half_wave(s.phase);
        s.instability = clamp01(s.instability + dt * (drive - s.instability) / cfg.tau_instability);

        // Slow
        s.energy = clamp01(s.energy + dt * (cfg.energy_target - s.energy) / cfg.tau_energy);

        let baseline_delta = dt * (cfg.coherence_target - s.coherence_baseline) / (cfg.tau_coherence * PHI);
        s.coherence_baseline = clamp01(s.coherence_baseline + baseline_delta);

        let target = clamp01(s.coherence_baseline * (1.0 - s.instability) * s.energy.max(0.0).powf(PHI_INV));
        let delta = if target > s.coherence {
            dt * (target - s.coherence) / cfg.tau_coherence
        } else {
            let decay = cfg.coherence_decay_rate * (1.0 + s.instability);
            dt * (target - s.coherence) * decay / cfg.tau_coherence
        };
        s.coherence = clamp01(s.coherence + delta);
    }

    fn stability_output(&self) -> f64 {
        let base = 1.0 - self.state.instability;
        if base > self.config.stability_baseline {
            clamp01(0.9 * base + 0.1 * self.config.stability_baseline)
        } else {
            clamp01(base)
        }
    }

    fn intensity_output(&self) -> f64 {
        let s = &self.state;
        let boost = s.coherence * self.config.intensity_coherence_coupling;
        let activation = 0.05 * (1.0 + (TAU * s.phase * PHI).sin()) * s.coherence;
        clamp01(s.energy + boost + activation)
    }

    fn alignment_output(&self, coherence: f64, stability: f64) -> f64 {
        let base = (coherence + stability) / 2.0;
        let potential = coherence * stability;
        let lock = self.config.alignment_lock_strength;

        let alignment = if potential > lock {
            let w = smooth_step(potential, lock, 1.0);
            let target = lock + (1.0 - lock) * w;
            base * (1.0 - w) + target * w
        } else {
            base + 0.1 * (TAU * self.state.alignment_phase).sin() * (1.0 - potential)
        };
        clamp01(alignment)
    }
}

impl CfmCore for CfmCoreV1 {
    fn version(&self) -> u8 {
        1
    }

    fn step_with(
        &mut self,
        _human_messages: Option<&[String]>,
        _external_events: Option<&serde_json::Value>,
        dt: f64,
    ) -> StepOutput {
        self.update(clamp_dt(dt, self.config.max_dt));

        let coherence = self.state.coherence;
        let stability = self.stability_output();
        StepOutput {
            coherence,
            stability,
            intensity: self.intensity_output(),
            alignment: self.alignment_output(coherence, stability),
            time: self.state.time,
            step: self.state.step_count,
            phase: self.state.phase,
            version: Some(1),
            resonance_index: None,
            basin_distance: None,
        }
    }

    fn reset(&mut self) {
        self.reset_to(None);
    }

    fn state_map(&self) -> StateMap {
        self.state.to_map()
    }

    fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "state": self.state,
            "config": self.config,
            "version": 1,
        })
    }

    fn verify_state_bounds(&self) -> bool {
        self.state.validate()
    }
}
