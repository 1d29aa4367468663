// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM v2 Configuration
// ─────────────────────────────────────────────────────────────────────
//! Tuning constants for the multi-channel core.
//!
//! Five-tier timescale hierarchy (defaults):
//!   - very slow: φ³ ≈ 4.24
//!   - slow:      φ² ≈ 2.62
//!   - medium:    φ  ≈ 1.62
//!   - fast:      1/φ ≈ 0.62
//!   - very fast: 1/φ² ≈ 0.38

use serde::{Deserialize, Serialize};

use cfm_types::consts::{PHI, PHI_CUBE, PHI_INV, PHI_INV_CUBE, PHI_INV_SQ, PHI_SQ};
use cfm_types::{CfmError, CfmResult};

use crate::protocol::{clamp_field, non_negative_field, positive_field, StateMap};

/// Configuration for [`CfmCoreV2`](super::CfmCoreV2).
///
/// Construct through [`CfmV2Config::default`], a preset, or
/// [`CfmV2Config::from_json`]; all of them normalize the result. The core
/// re-normalizes whatever it is handed, so field-level edits can never
/// push the engine outside the documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfmV2Config {
    // Timescales
    pub tau_very_slow: f64,
    pub tau_slow: f64,
    pub tau_medium: f64,
    pub tau_fast: f64,
    pub tau_very_fast: f64,

    // Phase frequencies
    pub omega_global: f64,
    pub omega_local: f64,

    // Attractor basin in (coherence, energy, stability) space
    pub basin_center_c: f64,
    pub basin_center_e: f64,
    pub basin_center_s: f64,
    /// Clamped to [0.01, 0.5].
    pub basin_radius: f64,
    pub basin_strength_inner: f64,
    pub basin_strength_outer: f64,

    // Set-points
    pub coherence_target: f64,
    pub energy_target: f64,
    pub stability_target: f64,
    pub alignment_target: f64,

    // Cross-channel coupling
    pub coherence_energy_coupling: f64,
    pub stability_coherence_coupling: f64,
    pub alignment_stability_coupling: f64,
    pub resonance_coupling: f64,

    // Instability pulse
    /// Clamped to [0, 0.5].
    pub instability_base: f64,
    pub pulse_threshold_low: f64,
    pub pulse_threshold_medium: f64,
    pub pulse_threshold_high: f64,

    // Damping
    pub energy_dissipation: f64,
    pub envelope_decay: f64,
    pub flux_damping: f64,

    /// Lock-in threshold on coherence·stability.
    pub alignment_lock_strength: f64,

    /// Upper bound on a single step's `dt`.
    pub max_dt: f64,
}

impl Default for CfmV2Config {
    fn default() -> Self {
        Self {
            tau_very_slow: PHI_CUBE,
            tau_slow: PHI_SQ,
            tau_medium: PHI,
            tau_fast: PHI_INV,
            tau_very_fast: PHI_INV_SQ,

            omega_global: PHI_INV,
            omega_local: PHI_INV,

            basin_center_c: PHI_INV,
            basin_center_e: PHI_INV,
            basin_center_s: 1.0 - PHI_INV_SQ,
            basin_radius: PHI_INV_SQ,
            basin_strength_inner: PHI_INV_SQ,
            basin_strength_outer: PHI_INV_CUBE,

            coherence_target: PHI_INV + 0.1,
            energy_target: PHI_INV,
            stability_target: 1.0 - PHI_INV_SQ,
            alignment_target: PHI_INV,

            coherence_energy_coupling: 1.0 / (2.0 * PHI),
            stability_coherence_coupling: PHI_INV,
            alignment_stability_coupling: PHI_INV,
            resonance_coupling: PHI_INV_SQ,

            instability_base: 1.0 / (2.0 * PHI),
            pulse_threshold_low: PHI_INV_SQ,
            pulse_threshold_medium: PHI_INV,
            pulse_threshold_high: 1.0 - PHI_INV_SQ,

            energy_dissipation: PHI_INV_SQ,
            envelope_decay: PHI_INV_CUBE,
            flux_damping: PHI_INV,

            alignment_lock_strength: PHI_INV,

            max_dt: 1.0,
        }
    }
}

impl CfmV2Config {
    /// Apply the range rules: non-positive rates and negative basin
    /// strengths fall back to defaults, everything else is clamped. Pulse thresholds are forced into
    /// non-decreasing order. Idempotent.
    pub fn normalized(self) -> Self {
        let d = Self::default();
        let unit = |name: &str, v: f64, default: f64| clamp_field(name, v, 0.0, 1.0, default);

        let pulse_threshold_low = unit("pulse_threshold_low", self.pulse_threshold_low, d.pulse_threshold_low);
        let pulse_threshold_medium = clamp_field(
            "pulse_threshold_medium",
            self.pulse_threshold_medium,
            pulse_threshold_low,
            1.0,
            d.pulse_threshold_medium.max(pulse_threshold_low),
        );
        let pulse_threshold_high = clamp_field(
            "pulse_threshold_high",
            self.pulse_threshold_high,
            pulse_threshold_medium,
            1.0,
            d.pulse_threshold_high.max(pulse_threshold_medium),
        );

        Self {
            tau_very_slow: positive_field("tau_very_slow", self.tau_very_slow, d.tau_very_slow),
            tau_slow: positive_field("tau_slow", self.tau_slow, d.tau_slow),
            tau_medium: positive_field("tau_medium", self.tau_medium, d.tau_medium),
            tau_fast: positive_field("tau_fast", self.tau_fast, d.tau_fast),
            tau_very_fast: positive_field("tau_very_fast", self.tau_very_fast, d.tau_very_fast),

            omega_global: positive_field("omega_global", self.omega_global, d.omega_global),
            omega_local: positive_field("omega_local", self.omega_local, d.omega_local),

            basin_center_c: unit("basin_center_c", self.basin_center_c, d.basin_center_c),
            basin_center_e: unit("basin_center_e", self.basin_center_e, d.basin_center_e),
            basin_center_s: unit("basin_center_s", self.basin_center_s, d.basin_center_s),
            basin_radius: clamp_field("basin_radius", self.basin_radius, 0.01, 0.5, d.basin_radius),
            basin_strength_inner: non_negative_field(
                "basin_strength_inner",
                self.basin_strength_inner,
                d.basin_strength_inner,
            ),
            basin_strength_outer: non_negative_field(
                "basin_strength_outer",
                self.basin_strength_outer,
                d.basin_strength_outer,
            ),

            coherence_target: unit("coherence_target", self.coherence_target, d.coherence_target),
            energy_target: unit("energy_target", self.energy_target, d.energy_target),
            stability_target: unit("stability_target", self.stability_target, d.stability_target),
            alignment_target: unit("alignment_target", self.alignment_target, d.alignment_target),

            coherence_energy_coupling: unit(
                "coherence_energy_coupling",
                self.coherence_energy_coupling,
                d.coherence_energy_coupling,
            ),
            stability_coherence_coupling: unit(
                "stability_coherence_coupling",
                self.stability_coherence_coupling,
                d.stability_coherence_coupling,
            ),
            alignment_stability_coupling: unit(
                "alignment_stability_coupling",
                self.alignment_stability_coupling,
                d.alignment_stability_coupling,
            ),
            resonance_coupling: unit("resonance_coupling", self.resonance_coupling, d.resonance_coupling),

            instability_base: clamp_field(
                "instability_base",
                self.instability_base,
                0.0,
                0.5,
                d.instability_base,
            ),
            pulse_threshold_low,
            pulse_threshold_medium,
            pulse_threshold_high,

            energy_dissipation: unit("energy_dissipation", self.energy_dissipation, d.energy_dissipation),
            envelope_decay: unit("envelope_decay", self.envelope_decay, d.envelope_decay),
            flux_damping: unit("flux_damping", self.flux_damping, d.flux_damping),

            alignment_lock_strength: unit(
                "alignment_lock_strength",
                self.alignment_lock_strength,
                d.alignment_lock_strength,
            ),

            max_dt: positive_field("max_dt", self.max_dt, d.max_dt),
        }
    }

    /// Build from a flat JSON object of overrides. Unspecified fields take
    /// their defaults; out-of-range values are clamped, never rejected.
    pub fn from_json(json: &str) -> CfmResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| CfmError::Config(format!("JSON parse error: {e}")))?;
        Ok(cfg.normalized())
    }

    /// Build from an already-parsed override mapping.
    pub fn from_overrides(overrides: &serde_json::Map<String, serde_json::Value>) -> CfmResult<Self> {
        let cfg: Self = serde_json::from_value(serde_json::Value::Object(overrides.clone()))
            .map_err(|e| CfmError::Config(format!("invalid override: {e}")))?;
        Ok(cfg.normalized())
    }

    /// True when the five time constants are strictly decreasing.
    pub fn timescales_ordered(&self) -> bool {
        self.tau_very_slow > self.tau_slow
            && self.tau_slow > self.tau_medium
            && self.tau_medium > self.tau_fast
            && self.tau_fast > self.tau_very_fast
    }

    /// Basin center as a (coherence, energy, stability) triple.
    pub fn basin_center(&self) -> (f64, f64, f64) {
        (self.basin_center_c, self.basin_center_e, self.basin_center_s)
    }

    pub fn to_map(&self) -> StateMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(obj)) => obj
                .into_iter()
                .filter_map(|(k, v)| v.as_f64().map(|f| (k, f)))
                .collect(),
            _ => StateMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timescales() {
        let c = CfmV2Config::default();
        assert!((c.tau_very_slow - PHI.powi(3)).abs() < 1e-10);
        assert!((c.tau_slow - PHI.powi(2)).abs() < 1e-10);
        assert!((c.tau_medium - PHI).abs() < 1e-10);
        assert!((c.tau_fast - 1.0 / PHI).abs() < 1e-10);
        assert!((c.tau_very_fast - 1.0 / PHI.powi(2)).abs() < 1e-10);
    }

    #[test]
    fn test_default_timescales_ordered() {
        assert!(CfmV2Config::default().timescales_ordered());
    }

    #[test]
    fn test_normalized_idempotent() {
        let once = CfmV2Config::default().normalized();
        assert_eq!(once.clone().normalized(), once);
        // 1 − 1/φ² and 1/φ coincide, so medium and high start together
        assert!((once.pulse_threshold_high - once.pulse_threshold_medium).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_taus_replaced() {
        let c = CfmV2Config {
            tau_slow: 0.0,
            tau_fast: -3.0,
            omega_local: -1.0,
            max_dt: 0.0,
            ..Default::default()
        }
        .normalized();
        let d = CfmV2Config::default();
        assert_eq!(c.tau_slow, d.tau_slow);
        assert_eq!(c.tau_fast, d.tau_fast);
        assert_eq!(c.omega_local, d.omega_local);
        assert_eq!(c.max_dt, 1.0);
    }

    #[test]
    fn test_out_of_range_clamped() {
        let c = CfmV2Config {
            coherence_target: 1.7,
            energy_target: -0.2,
            basin_radius: 2.0,
            instability_base: 0.9,
            resonance_coupling: 4.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.coherence_target, 1.0);
        assert_eq!(c.energy_target, 0.0);
        assert_eq!(c.basin_radius, 0.5);
        assert_eq!(c.instability_base, 0.5);
        assert_eq!(c.resonance_coupling, 1.0);
    }

    #[test]
    fn test_basin_radius_floor() {
        let c = CfmV2Config {
            basin_radius: 0.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.basin_radius, 0.01);
    }

    #[test]
    fn test_basin_strengths_not_capped() {
        let c = CfmV2Config {
            basin_strength_inner: 2.0,
            basin_strength_outer: 1.5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.basin_strength_inner, 2.0);
        assert_eq!(c.basin_strength_outer, 1.5);

        let d = CfmV2Config::default();
        let c = CfmV2Config {
            basin_strength_inner: -0.3,
            basin_strength_outer: f64::NAN,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.basin_strength_inner, d.basin_strength_inner);
        assert_eq!(c.basin_strength_outer, d.basin_strength_outer);
    }

    #[test]
    fn test_pulse_thresholds_forced_ordered() {
        let c = CfmV2Config {
            pulse_threshold_low: 0.8,
            pulse_threshold_medium: 0.3,
            pulse_threshold_high: 0.1,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.pulse_threshold_low, 0.8);
        assert_eq!(c.pulse_threshold_medium, 0.8);
        assert_eq!(c.pulse_threshold_high, 0.8);
    }

    #[test]
    fn test_nan_field_falls_back_to_default() {
        let c = CfmV2Config {
            alignment_target: f64::NAN,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.alignment_target, CfmV2Config::default().alignment_target);
    }

    #[test]
    fn test_from_json_partial_overrides() {
        let c = CfmV2Config::from_json(r#"{"tau_slow": 3.0, "coherence_target": 2.0}"#).unwrap();
        assert_eq!(c.tau_slow, 3.0);
        assert_eq!(c.coherence_target, 1.0);
        assert_eq!(c.tau_fast, CfmV2Config::default().tau_fast);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CfmV2Config::from_json("[1, 2").is_err());
    }

    #[test]
    fn test_from_overrides() {
        let mut m = serde_json::Map::new();
        m.insert("max_dt".into(), serde_json::json!(0.5));
        let c = CfmV2Config::from_overrides(&m).unwrap();
        assert_eq!(c.max_dt, 0.5);
    }

    #[test]
    fn test_to_map_has_all_fields() {
        let m = CfmV2Config::default().to_map();
        assert_eq!(m.len(), 30);
        assert!(m.contains_key("tau_very_slow"));
        assert!(m.contains_key("basin_center_c"));
        assert!(m.contains_key("coherence_energy_coupling"));
    }
}
