// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core v0
// ─────────────────────────────────────────────────────────────────────
//! Minimal four-variable recurrence:
//!
//!   phase       ← phase + dt·ω                               (wrapped)
//!   energy      ← energy + dt·(E* − energy)/(τ_E·φ)
//!   instability ← instability + dt·(I₀·sin 2πphase − instability)/(τ_I/ψ)
//!   coherence   ← coherence + dt·((1 − instability)·energy^(1/φ) − coherence)/φ

use serde::{Deserialize, Serialize};

use cfm_types::consts::{PHI, PHI_INV, PHI_INV_SQ, PHI_SQ, PSI, TAU};
use cfm_types::{CfmError, CfmResult, StepOutput};

use crate::math::{clamp01, wrap_phase};
use crate::protocol::{clamp_dt, clamp_field, map_get, positive_field, CfmCore, StateMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfmV0Config {
    pub tau_energy: f64,
    pub tau_instability: f64,
    pub omega_base: f64,
    pub energy_target: f64,
    /// Clamped to [0, 0.5].
    pub instability_base: f64,
    pub max_dt: f64,
}

impl Default for CfmV0Config {
    fn default() -> Self {
        Self {
            tau_energy: PHI,
            tau_instability: PHI_SQ,
            omega_base: PHI_INV,
            energy_target: PHI_INV,
            instability_base: 1.0 / (2.0 * PHI),
            max_dt: 1.0,
        }
    }
}

impl CfmV0Config {
    pub fn normalized(self) -> Self {
        let d = Self::default();
        Self {
            tau_energy: positive_field("tau_energy", self.tau_energy, d.tau_energy),
            tau_instability: positive_field("tau_instability", self.tau_instability, d.tau_instability),
            omega_base: positive_field("omega_base", self.omega_base, d.omega_base),
            energy_target: clamp_field("energy_target", self.energy_target, 0.0, 1.0, d.energy_target),
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
pub struct CfmV0State {
    pub coherence: f64,
    pub instability: f64,
    pub energy: f64,
    pub phase: f64,
    pub time: f64,
    pub step_count: u64,
}

impl Default for CfmV0State {
    fn default() -> Self {
        Self {
            coherence: PHI_INV,
            instability: PHI_INV_SQ,
            energy: PHI_INV,
            phase: 0.0,
            time: 0.0,
            step_count: 0,
        }
    }
}

impl CfmV0State {
    pub fn normalized(self) -> Self {
        Self {
            coherence: clamp01(self.coherence),
            instability: clamp01(self.instability),
            energy: clamp01(self.energy),
            phase: wrap_phase(self.phase),
            time: if self.time.is_finite() { self.time.max(0.0) } else { 0.0 },
            step_count: self.step_count,
        }
    }

    pub fn validate(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        unit(self.coherence)
            && unit(self.instability)
            && unit(self.energy)
            && (0.0..1.0).contains(&self.phase)
            && self.time >= 0.0
    }

    pub fn to_map(&self) -> StateMap {
        let mut m = StateMap::new();
        m.insert("coherence".into(), self.coherence);
        m.insert("instability".into(), self.instability);
        m.insert("energy".into(), self.energy);
        m.insert("phase".into(), self.phase);
        m.insert("time".into(), self.time);
        m.insert("step_count".into(), self.step_count as f64);
        m
    }

    pub fn from_map(map: &StateMap) -> Self {
        let d = Self::default();
        let steps = map_get(map, "step_count", 0.0);
        Self {
            coherence: map_get(map, "coherence", d.coherence),
            instability: map_get(map, "instability", d.instability),
            energy: map_get(map, "energy", d.energy),
            phase: map_get(map, "phase", d.phase),
            time: map_get(map, "time", d.time),
            step_count: if steps.is_finite() && steps > 0.0 { steps as u64 } else { 0 },
        }
        .normalized()
    }
}

/// Minimal CFM core. Reports no `cfm_version`.
#[derive(Debug, Clone, Default)]
pub struct CfmCoreV0 {
    config: CfmV0Config,
    state: CfmV0State,
}

impl CfmCoreV0 {
    pub fn new(config: CfmV0Config) -> Self {
        Self {
            config: config.normalized(),
            state: CfmV0State::default(),
        }
    }

    pub fn with_state(config: CfmV0Config, initial: CfmV0State) -> Self {
        Self {
            config: config.normalized(),
            state: initial.normalized(),
        }
    }

    pub fn config(&self) -> &CfmV0Config {
        &self.config
    }

    pub fn get_state(&self) -> CfmV0State {
        self.state.clone()
    }

    pub fn reset_to(&mut self, initial: Option<CfmV0State>) {
        self.state = initial.map(CfmV0State::normalized).unwrap_or_default();
    }

    fn update(&mut self, dt: f64) {
        let cfg = &self.config;
        let s = &mut self.state;

        s.time += dt;
        s.step_count += 1;

        s.phase = wrap_phase(s.phase + dt * cfg.omega_base);

        let energy_delta = dt * (cfg.energy_target - s.energy) / (cfg.tau_energy * PHI);
        s.energy = clamp01(s.energy + energy_delta);

        let drive = cfg.instability_base * (TAU * s.phase).sin();
        let instability_delta = dt * (drive - s.instability) / (cfg.tau_instability / PSI);
        s.instability = clamp01(s.instability + instability_delta);

        let target = (1.0 - s.instability) * s.energy.max(0.0).powf(PHI_INV);
        s.coherence = clamp01(s.coherence + dt * (target - s.coherence) / PHI);
    }
}

impl CfmCore for CfmCoreV0 {
    fn version(&self) -> u8 {
        0
    }

    fn step_with(
        &mut self,
        _human_messages: Option<&[String]>,
        _external_events: Option<&serde_json::Value>,
        dt: f64,
    ) -> StepOutput {
        self.update(clamp_dt(dt, self.config.max_dt));

        let coherence = self.state.coherence;
        let stability = 1.0 - self.state.instability;
        StepOutput {
            coherence,
            stability,
            intensity: self.state.energy,
            alignment: clamp01((coherence + stability) / 2.0),
            time: self.state.time,
            step: self.state.step_count,
            phase: self.state.phase,
            version: None,
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
        })
    }

    fn verify_state_bounds(&self) -> bool {
        self.state.validate()
    }
}
