// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM v2 State
// ─────────────────────────────────────────────────────────────────────
//! Eleven continuous variables grouped into five channels plus resonance.

use serde::{Deserialize, Serialize};

use cfm_types::consts::{PHI_INV, PHI_INV_SQ};
use cfm_types::CfmResult;

use crate::math::{clamp01, wrap_phase};
use crate::protocol::{map_get, StateMap};

/// Internal state of [`CfmCoreV2`](super::CfmCoreV2).
///
/// Plain data. Every constructor path ends in [`CfmV2State::normalized`],
/// so a state obtained from this crate always satisfies [`validate`].
///
/// [`validate`]: CfmV2State::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfmV2State {
    pub coherence_slow: f64,
    pub coherence_fast: f64,

    pub energy_potential: f64,
    pub energy_flux: f64,

    pub stability_envelope: f64,
    pub instability_pulse: f64,

    /// [0, 1), wrapped.
    pub phase_global: f64,
    /// [0, 1), wrapped.
    pub phase_local: f64,

    pub alignment_field: f64,
    pub alignment_direction: f64,

    pub resonance_index: f64,

    pub time: f64,
    pub step_count: u64,
}

impl Default for CfmV2State {
    fn default() -> Self {
        Self {
            coherence_slow: PHI_INV,
            coherence_fast: PHI_INV,
            energy_potential: PHI_INV,
            energy_flux: PHI_INV_SQ,
            stability_envelope: 1.0 - PHI_INV_SQ,
            instability_pulse: PHI_INV_SQ,
            phase_global: 0.0,
            phase_local: 0.0,
            alignment_field: PHI_INV,
            alignment_direction: PHI_INV,
            resonance_index: PHI_INV,
            time: 0.0,
            step_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoherenceChannel {
    pub slow: f64,
    pub fast: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyChannel {
    pub potential: f64,
    pub flux: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StabilityChannel {
    pub envelope: f64,
    pub pulse: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseChannel {
    pub global: f64,
    pub local: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentChannel {
    pub field: f64,
    pub direction: f64,
}

/// All channels at once, keyed the way `get_status` reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStates {
    pub coherence: CoherenceChannel,
    pub energy: EnergyChannel,
    pub stability: StabilityChannel,
    pub phase: PhaseChannel,
    pub alignment: AlignmentChannel,
}

impl CfmV2State {
    /// Clamp bounded variables, wrap phases, floor time at zero.
    pub fn normalized(self) -> Self {
        let time = if self.time.is_finite() { self.time.max(0.0) } else { 0.0 };
        Self {
            coherence_slow: clamp01(self.coherence_slow),
            coherence_fast: clamp01(self.coherence_fast),
            energy_potential: clamp01(self.energy_potential),
            energy_flux: clamp01(self.energy_flux),
            stability_envelope: clamp01(self.stability_envelope),
            instability_pulse: clamp01(self.instability_pulse),
            phase_global: wrap_phase(self.phase_global),
            phase_local: wrap_phase(self.phase_local),
            alignment_field: clamp01(self.alignment_field),
            alignment_direction: clamp01(self.alignment_direction),
            resonance_index: clamp01(self.resonance_index),
            time,
            step_count: self.step_count,
        }
    }

    /// True when every variable is inside its documented range.
    pub fn validate(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let phase = |v: f64| (0.0..1.0).contains(&v);

        let bounded = [
            self.coherence_slow,
            self.coherence_fast,
            self.energy_potential,
            self.energy_flux,
            self.stability_envelope,
            self.instability_pulse,
            self.alignment_field,
            self.alignment_direction,
            self.resonance_index,
        ]
        .into_iter()
        .all(unit);

        bounded && phase(self.phase_global) && phase(self.phase_local) && self.time >= 0.0
    }

    pub fn coherence_channel(&self) -> CoherenceChannel {
        CoherenceChannel {
            slow: self.coherence_slow,
            fast: self.coherence_fast,
        }
    }

    pub fn energy_channel(&self) -> EnergyChannel {
        EnergyChannel {
            potential: self.energy_potential,
            flux: self.energy_flux,
        }
    }

    pub fn stability_channel(&self) -> StabilityChannel {
        StabilityChannel {
            envelope: self.stability_envelope,
            pulse: self.instability_pulse,
        }
    }

    pub fn phase_channel(&self) -> PhaseChannel {
        PhaseChannel {
            global: self.phase_global,
            local: self.phase_local,
        }
    }

    pub fn alignment_channel(&self) -> AlignmentChannel {
        AlignmentChannel {
            field: self.alignment_field,
            direction: self.alignment_direction,
        }
    }

    pub fn channels(&self) -> ChannelStates {
        ChannelStates {
            coherence: self.coherence_channel(),
            energy: self.energy_channel(),
            stability: self.stability_channel(),
            phase: self.phase_channel(),
            alignment: self.alignment_channel(),
        }
    }

    /// Euclidean distance to `(c, e, s)` in (coherence_slow,
    /// energy_potential, stability_envelope) space.
    pub fn distance_to_basin(&self, c: f64, e: f64, s: f64) -> f64 {
        let dc = self.coherence_slow - c;
        let de = self.energy_potential - e;
        let ds = self.stability_envelope - s;
        (dc * dc + de * de + ds * ds).sqrt()
    }

    /// Distance to the default basin center (1/φ, 1/φ, 1 − 1/φ²).
    pub fn distance_to_default_basin(&self) -> f64 {
        self.distance_to_basin(PHI_INV, PHI_INV, 1.0 - PHI_INV_SQ)
    }

    pub fn to_map(&self) -> StateMap {
        let mut m = StateMap::new();
        m.insert("coherence_slow".into(), self.coherence_slow);
        m.insert("coherence_fast".into(), self.coherence_fast);
        m.insert("energy_potential".into(), self.energy_potential);
        m.insert("energy_flux".into(), self.energy_flux);
        m.insert("stability_envelope".into(), self.stability_envelope);
        m.insert("instability_pulse".into(), self.instability_pulse);
        m.insert("phase_global".into(), self.phase_global);
        m.insert("phase_local".into(), self.phase_local);
        m.insert("alignment_field".into(), self.alignment_field);
        m.insert("alignment_direction".into(), self.alignment_direction);
        m.insert("resonance_index".into(), self.resonance_index);
        m.insert("time".into(), self.time);
        m.insert("step_count".into(), self.step_count as f64);
        m
    }

    /// Missing keys take their defaults; the result is normalized.
    pub fn from_map(map: &StateMap) -> Self {
        let d = Self::default();
        let step_count = map_get(map, "step_count", 0.0);
        Self {
            coherence_slow: map_get(map, "coherence_slow", d.coherence_slow),
            coherence_fast: map_get(map, "coherence_fast", d.coherence_fast),
            energy_potential: map_get(map, "energy_potential", d.energy_potential),
            energy_flux: map_get(map, "energy_flux", d.energy_flux),
            stability_envelope: map_get(map, "stability_envelope", d.stability_envelope),
            instability_pulse: map_get(map, "instability_pulse", d.instability_pulse),
            phase_global: map_get(map, "phase_global", d.phase_global),
            phase_local: map_get(map, "phase_local", d.phase_local),
            alignment_field: map_get(map, "alignment_field", d.alignment_field),
            alignment_direction: map_get(map, "alignment_direction", d.alignment_direction),
            resonance_index: map_get(map, "resonance_index", d.resonance_index),
            time: map_get(map, "time", d.time),
            step_count: if step_count.is_finite() && step_count > 0.0 {
                step_count as u64
            } else {
                0
            },
        }
        .normalized()
    }

    pub fn to_json(&self) -> CfmResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CfmResult<Self> {
        let state: Self = serde_json::from_str(json)?;
        Ok(state.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        let s = CfmV2State::default();
        assert!(s.validate());
        assert_eq!(s.step_count, 0);
        assert!((s.coherence_slow - PHI_INV).abs() < 1e-12);
        assert!((s.stability_envelope - (1.0 - PHI_INV_SQ)).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_clamps_and_wraps() {
        let s = CfmV2State {
            coherence_slow: 1.5,
            energy_flux: -0.3,
            phase_global: 1.25,
            phase_local: -0.25,
            resonance_index: f64::NAN,
            time: -4.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(s.coherence_slow, 1.0);
        assert_eq!(s.energy_flux, 0.0);
        assert!((s.phase_global - 0.25).abs() < 1e-12);
        assert!((s.phase_local - 0.75).abs() < 1e-12);
        assert_eq!(s.resonance_index, 0.0);
        assert_eq!(s.time, 0.0);
        assert!(s.validate());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let s = CfmV2State {
            alignment_field: 1.01,
            ..Default::default()
        };
        assert!(!s.validate());
        let s = CfmV2State {
            phase_local: 1.0,
            ..Default::default()
        };
        assert!(!s.validate(), "phase must stay below 1.0");
    }

    #[test]
    fn test_channels() {
        let s = CfmV2State::default();
        let ch = s.channels();
        assert_eq!(ch.coherence.slow, s.coherence_slow);
        assert_eq!(ch.energy.flux, s.energy_flux);
        assert_eq!(ch.stability.pulse, s.instability_pulse);
        assert_eq!(ch.phase.global, 0.0);
        assert_eq!(ch.alignment.direction, s.alignment_direction);
    }

    #[test]
    fn test_channel_json_keys() {
        let v = serde_json::to_value(CfmV2State::default().channels()).unwrap();
        assert!(v["phase"].get("global").is_some());
        assert!(v["stability"].get("envelope").is_some());
        assert!(v["alignment"].get("field").is_some());
    }

    #[test]
    fn test_distance_to_default_basin_zero_at_defaults() {
        assert!(CfmV2State::default().distance_to_default_basin() < 1e-12);
    }

    #[test]
    fn test_distance_to_basin() {
        let s = CfmV2State {
            coherence_slow: 0.0,
            energy_potential: 0.0,
            stability_envelope: 0.0,
            ..Default::default()
        };
        assert!((s.distance_to_basin(1.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((s.distance_to_basin(1.0, 1.0, 1.0) - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_map_roundtrip_preserves_step_count() {
        let s = CfmV2State {
            step_count: 42,
            time: 4.2,
            coherence_fast: 0.3,
            ..Default::default()
        };
        let back = CfmV2State::from_map(&s.to_map());
        assert_eq!(back, s);
    }

    #[test]
    fn test_from_map_missing_keys_default() {
        let mut m = StateMap::new();
        m.insert("energy_potential".into(), 0.9);
        let s = CfmV2State::from_map(&m);
        assert_eq!(s.energy_potential, 0.9);
        assert_eq!(s.coherence_slow, PHI_INV);
        assert_eq!(s.step_count, 0);
    }

    #[test]
    fn test_from_json_partial() {
        let s = CfmV2State::from_json(r#"{"coherence_slow": 2.0, "step_count": 7}"#).unwrap();
        assert_eq!(s.coherence_slow, 1.0);
        assert_eq!(s.step_count, 7);
        assert_eq!(s.energy_flux, PHI_INV_SQ);
    }

    #[test]
    fn test_from_json_error() {
        assert!(CfmV2State::from_json("{").is_err());
    }
}
