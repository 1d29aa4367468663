// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM v2 Output Projection
// ─────────────────────────────────────────────────────────────────────
//! Read-only projection of the eleven-variable state onto the four
//! bounded diagnostics.

use cfm_types::consts::{PHI, TAU};
use cfm_types::StepOutput;

use super::config::CfmV2Config;
use super::state::CfmV2State;
use crate::math::{clamp01, smooth_step};

/// Blend of slow and fast coherence, weighted toward the slow component
/// as the envelope firms up.
pub fn coherence_output(state: &CfmV2State) -> f64 {
    let alpha = smooth_step(state.stability_envelope, 0.3, 0.8);
    clamp01(alpha * state.coherence_slow + (1.0 - alpha) * state.coherence_fast)
}

pub fn stability_output(state: &CfmV2State) -> f64 {
    let pulse_effect = state.instability_pulse * (1.0 - state.stability_envelope);
    clamp01(state.stability_envelope - pulse_effect + 0.1 * state.resonance_index)
}

pub fn intensity_output(state: &CfmV2State) -> f64 {
    let c = coherence_output(state);
    let variation = 0.05 * (1.0 + (TAU * state.phase_global * PHI).sin()) * c;
    clamp01(state.energy_potential + 0.3 * state.energy_flux + 0.2 * c + variation)
}

/// Alignment with lock-in: once coherence·stability clears
/// `alignment_lock_strength`, the field is pulled toward the lock level.
pub fn alignment_output(state: &CfmV2State, config: &CfmV2Config) -> f64 {
    let lock = config.alignment_lock_strength;
    let potential = coherence_output(state) * stability_output(state);

    let alignment = if potential > lock {
        let w = smooth_step(potential, lock, 1.0);
        let target = lock + (1.0 - lock) * w;
        state.alignment_field * (1.0 - w) + target * w
    } else {
        state.alignment_field
            + 0.1 * (state.alignment_direction - 0.5)
            + 0.15 * state.resonance_index
    };
    clamp01(alignment)
}

/// Full step output for a post-update state.
pub fn project(state: &CfmV2State, config: &CfmV2Config) -> StepOutput {
    let (c, e, s) = config.basin_center();
    StepOutput {
        coherence: coherence_output(state),
        stability: stability_output(state),
        intensity: intensity_output(state),
        alignment: alignment_output(state, config),
        time: state.time,
        step: state.step_count,
        phase: state.phase_global,
        version: Some(2),
        resonance_index: Some(state.resonance_index),
        basin_distance: Some(state.distance_to_basin(c, e, s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coherence_uses_fast_when_envelope_low() {
        let s = CfmV2State {
            stability_envelope: 0.1,
            coherence_slow: 0.9,
            coherence_fast: 0.2,
            ..Default::default()
        };
        assert!((coherence_output(&s) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_coherence_uses_slow_when_envelope_high() {
        let s = CfmV2State {
            stability_envelope: 0.95,
            coherence_slow: 0.9,
            coherence_fast: 0.2,
            ..Default::default()
        };
        assert!((coherence_output(&s) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_stability_formula() {
        let s = CfmV2State {
            stability_envelope: 0.5,
            instability_pulse: 0.4,
            resonance_index: 0.5,
            ..Default::default()
        };
        // 0.5 - 0.4·0.5 + 0.05
        assert!((stability_output(&s) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_saturates() {
        let s = CfmV2State {
            energy_potential: 1.0,
            energy_flux: 1.0,
            ..Default::default()
        };
        assert_eq!(intensity_output(&s), 1.0);
    }

    #[test]
    fn test_alignment_unlocked_branch() {
        let cfg = CfmV2Config {
            alignment_lock_strength: 1.0,
            ..Default::default()
        };
        let s = CfmV2State {
            alignment_field: 0.4,
            alignment_direction: 0.7,
            resonance_index: 0.2,
            ..Default::default()
        };
        let expected = 0.4 + 0.1 * 0.2 + 0.15 * 0.2;
        assert!((alignment_output(&s, &cfg) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_locked_moves_toward_lock() {
        let cfg = CfmV2Config {
            alignment_lock_strength: 0.1,
            ..Default::default()
        };
        let s = CfmV2State {
            coherence_slow: 1.0,
            coherence_fast: 1.0,
            stability_envelope: 1.0,
            instability_pulse: 0.0,
            resonance_index: 1.0,
            alignment_field: 0.0,
            ..Default::default()
        };
        // C·S = 1 → w = 1 → alignment = target = 1
        assert!((alignment_output(&s, &cfg) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_project_metadata() {
        let cfg = CfmV2Config::default();
        let s = CfmV2State {
            time: 1.5,
            step_count: 15,
            phase_global: 0.3,
            ..Default::default()
        };
        let out = project(&s, &cfg);
        assert_eq!(out.version, Some(2));
        assert_eq!(out.step, 15);
        assert_eq!(out.time, 1.5);
        assert_eq!(out.phase, 0.3);
        assert!(out.basin_distance.unwrap() < 1e-12);
        assert!(out.is_bounded());
    }
}
