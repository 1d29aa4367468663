// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM v2 Update Engine
// ─────────────────────────────────────────────────────────────────────
//! One tick of the multi-channel dynamics.
//!
//! Stages run fastest-first, each reading values already updated this
//! tick. Every additive update is clamped (or wrapped, for phases)
//! before the next stage sees it.

use cfm_types::consts::{PHI, PHI_INV, PHI_INV_CUBE, PHI_INV_SQ, TAU};

use super::config::CfmV2Config;
use super::projection::{coherence_output, stability_output};
use super::state::CfmV2State;
use crate::math::{clamp01, half_wave, smooth_step, wrap_phase};
use crate::protocol::clamp_dt;

/// Sum of the resonance component weights.
const RESONANCE_NORM: f64 = PHI_INV + 2.0 * PHI_INV_SQ + PHI_INV_CUBE;

/// Advance `state` in place by `dt` (clamped to `[0, max_dt]`).
///
/// Returns the effective `dt`.
pub fn step_state(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) -> f64 {
    let dt = clamp_dt(dt, config.max_dt);
    state.time += dt;
    state.step_count += 1;

    let prev_coherence_slow = state.coherence_slow;

    update_phase_local(state, config, dt);
    update_phase_global(state, config, dt);
    update_instability_pulse(state, config, dt);
    update_coherence_fast(state, config, dt);
    update_energy_flux(state, config, dt);
    update_resonance_index(state, config, dt);
    update_alignment_field(state, config, dt);
    update_coherence_slow(state, config, dt);
    update_energy_potential(state, config, dt, prev_coherence_slow);
    update_stability_envelope(state, config, dt, prev_coherence_slow);
    update_alignment_direction(state, config, dt);
    apply_pulse_response(state, config);

    dt
}

/// Two-tier restoring force toward `target`.
///
/// Inside `radius/φ` the pull is a spring proportional to distance;
/// between `radius/φ` and `radius·φ` it is a constant; beyond, zero.
pub fn basin_attraction(x: f64, target: f64, config: &CfmV2Config) -> f64 {
    let distance = (x - target).abs();
    let direction = if target > x { 1.0 } else { -1.0 };

    if distance < config.basin_radius / PHI {
        direction * config.basin_strength_inner * distance
    } else if distance < config.basin_radius * PHI {
        direction * config.basin_strength_outer
    } else {
        0.0
    }
}

/// Golden-weighted mix of the two phase oscillators.
fn phase_modulation(state: &CfmV2State) -> f64 {
    clamp01(half_wave(state.phase_global) * PHI_INV + half_wave(state.phase_local) * (1.0 - PHI_INV))
}

fn update_phase_local(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let modulation = 1.0 + 0.2 * (TAU * state.phase_global).sin();
    let delta = dt * config.omega_local * modulation / config.tau_very_fast;
    state.phase_local = wrap_phase(state.phase_local + delta);
}

fn update_phase_global(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let delta = dt * config.omega_global / config.tau_fast;
    state.phase_global = wrap_phase(state.phase_global + delta);
}

fn update_instability_pulse(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let drive =
        config.instability_base * (1.0 - state.stability_envelope) * half_wave(state.phase_global);
    let threshold = state.stability_envelope * config.pulse_threshold_low;
    let target = if drive > threshold { drive } else { 0.3 * drive };

    let delta = dt * (target - state.instability_pulse) / config.tau_fast;
    state.instability_pulse = clamp01(state.instability_pulse + delta);
}

fn update_coherence_fast(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let tracking = phase_modulation(state) * (state.coherence_slow - state.coherence_fast);
    let resonance = state.resonance_index * state.alignment_field * 0.1;
    let delta = dt * (tracking + resonance) / config.tau_fast;
    state.coherence_fast = clamp01(state.coherence_fast + delta);
}

fn update_energy_flux(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let gradient = (state.energy_potential - config.energy_target).abs();
    let target = gradient * half_wave(state.phase_global);
    let damping = config.flux_damping * state.energy_flux;
    let delta = dt * (target - damping - state.energy_flux) / config.tau_fast;
    state.energy_flux = clamp01(state.energy_flux + delta);
}

fn update_resonance_index(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let coherence_corr = if state.coherence_slow > 0.01 {
        1.0 - (1.0 - state.coherence_fast / state.coherence_slow).abs()
    } else {
        0.5
    };
    let energy_corr = if state.energy_potential > 0.01 {
        1.0 - (0.5 - state.energy_flux / state.energy_potential).abs()
    } else {
        0.5
    };
    let stability_corr = 1.0 - state.instability_pulse * state.stability_envelope;
    let diff = (state.phase_global - state.phase_local).abs();
    let phase_agreement = 1.0 - 2.0 * diff.min(1.0 - diff);

    let weighted = coherence_corr * PHI_INV
        + energy_corr * PHI_INV_SQ
        + stability_corr * PHI_INV_SQ
        + phase_agreement * PHI_INV_CUBE;
    let target = clamp01(weighted / RESONANCE_NORM);

    let delta = dt * (target - state.resonance_index) / config.tau_medium;
    state.resonance_index = clamp01(state.resonance_index + delta);
}

fn update_alignment_field(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let lock_potential = coherence_output(state) * stability_output(state);
    let attraction = lock_potential * (config.alignment_target - state.alignment_field);
    let coupling =
        config.resonance_coupling * (state.alignment_direction - 0.5) * state.resonance_index;
    let delta = dt * (attraction + coupling) / config.tau_medium;
    state.alignment_field = clamp01(state.alignment_field + delta);
}

fn update_coherence_slow(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let energy_factor = smooth_step(state.energy_potential, 0.2, 0.8);
    let instability = config.coherence_energy_coupling * state.instability_pulse;
    let basin = basin_attraction(state.coherence_slow, config.basin_center_c, config);

    let delta = dt
        * ((config.coherence_target - state.coherence_slow) * energy_factor - instability + basin)
        / config.tau_slow;
    state.coherence_slow = clamp01(state.coherence_slow + delta);
}

fn update_energy_potential(state: &mut CfmV2State, config: &CfmV2Config, dt: f64, prev_coherence: f64) {
    let dissipation = state.energy_flux * config.energy_dissipation;
    let coherence_input = config.coherence_energy_coupling * prev_coherence;
    let basin = basin_attraction(state.energy_potential, config.basin_center_e, config);

    let delta = dt
        * ((config.energy_target - state.energy_potential) - dissipation + coherence_input + basin)
        / config.tau_slow;
    state.energy_potential = clamp01(state.energy_potential + delta);
}

fn update_stability_envelope(
    state: &mut CfmV2State,
    config: &CfmV2Config,
    dt: f64,
    prev_coherence: f64,
) {
    let target = config.stability_target * smooth_step(prev_coherence, 0.3, 0.8);
    let decay = config.envelope_decay * (1.0 - state.alignment_field);
    let basin = basin_attraction(state.stability_envelope, config.basin_center_s, config);

    // Only the relaxation term is scaled by tau_slow.
    let delta = dt * ((target - state.stability_envelope) / config.tau_slow - decay + basin);
    state.stability_envelope = clamp01(state.stability_envelope + delta);
}

fn update_alignment_direction(state: &mut CfmV2State, config: &CfmV2Config, dt: f64) {
    let factor = smooth_step(state.stability_envelope, 0.3, 0.8);
    let drift = (config.basin_center_c - state.alignment_direction) * factor;
    state.alignment_direction = clamp01(state.alignment_direction + dt * drift / config.tau_very_slow);
}

/// Tiered structural response to the instability pulse. Only the highest
/// tier crossed applies.
fn apply_pulse_response(state: &mut CfmV2State, config: &CfmV2Config) {
    let pulse = state.instability_pulse;

    if pulse > config.pulse_threshold_high {
        let x = pulse - config.pulse_threshold_high;
        state.coherence_fast = clamp01(state.coherence_fast - 0.1 * x);
        state.energy_flux = clamp01(state.energy_flux + 0.15 * x);
        state.alignment_field = clamp01(state.alignment_field - 0.08 * x);
        state.coherence_slow = clamp01(state.coherence_slow - 0.02 * x);
    } else if pulse > config.pulse_threshold_medium {
        let x = pulse - config.pulse_threshold_medium;
        state.coherence_fast = clamp01(state.coherence_fast - 0.05 * x);
        state.energy_flux = clamp01(state.energy_flux + 0.08 * x);
        state.alignment_field = clamp01(state.alignment_field - 0.03 * x);
    } else if pulse > config.pulse_threshold_low {
        let x = pulse - config.pulse_threshold_low;
        state.coherence_fast = clamp01(state.coherence_fast - 0.02 * x);
    }
}
