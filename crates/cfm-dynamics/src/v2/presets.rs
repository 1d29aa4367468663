// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM v2 Presets
// ─────────────────────────────────────────────────────────────────────
//! Named tunings for the multi-channel core.

use std::fmt;
use std::str::FromStr;

use cfm_types::consts::{PHI, PHI_INV, PHI_INV_CUBE, PHI_INV_SQ};
use cfm_types::{CfmError, CfmResult};

use super::config::CfmV2Config;

/// Preset names in registry order.
pub const PRESET_NAMES: [&str; 4] = ["baseline", "high_stability", "high_resonance", "pulsed_activity"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// The default configuration.
    Baseline,
    /// Firmer envelope, rarer and weaker pulses, slower direction drift.
    HighStability,
    /// Stronger cross-channel coupling and a tighter, stiffer basin.
    HighResonance,
    /// Frequent, prominent instability pulses on faster timescales.
    PulsedActivity,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Baseline,
        Preset::HighStability,
        Preset::HighResonance,
        Preset::PulsedActivity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Baseline => "baseline",
            Preset::HighStability => "high_stability",
            Preset::HighResonance => "high_resonance",
            Preset::PulsedActivity => "pulsed_activity",
        }
    }

    /// Normalized configuration for this preset.
    pub fn config(self) -> CfmV2Config {
        let base = CfmV2Config::default();
        let cfg = match self {
            Preset::Baseline => base,
            Preset::HighStability => CfmV2Config {
                stability_target: PHI_INV + 0.2,
                stability_coherence_coupling: (1.5 * PHI_INV).min(1.0),
                instability_base: 1.0 / (3.0 * PHI),
                pulse_threshold_low: PHI_INV,
                pulse_threshold_medium: PHI_INV + 0.2,
                pulse_threshold_high: 1.0 - PHI_INV_SQ / 2.0,
                envelope_decay: PHI_INV_SQ,
                tau_very_slow: PHI.powi(4),
                alignment_lock_strength: PHI_INV + 0.1,
                ..base
            },
            Preset::HighResonance => CfmV2Config {
                resonance_coupling: PHI_INV,
                coherence_energy_coupling: PHI_INV,
                stability_coherence_coupling: 1.0 - PHI_INV_SQ,
                alignment_stability_coupling: 1.0 - PHI_INV_SQ,
                alignment_lock_strength: PHI_INV,
                basin_radius: PHI_INV_CUBE,
                basin_strength_inner: PHI_INV,
                basin_strength_outer: PHI_INV_SQ,
                ..base
            },
            Preset::PulsedActivity => CfmV2Config {
                instability_base: PHI_INV,
                pulse_threshold_low: PHI_INV_CUBE,
                pulse_threshold_medium: PHI_INV_SQ,
                pulse_threshold_high: PHI_INV,
                energy_dissipation: PHI_INV,
                envelope_decay: PHI_INV_SQ,
                tau_very_fast: PHI_INV_CUBE,
                tau_fast: PHI_INV_SQ,
                basin_radius: PHI_INV,
                basin_strength_inner: PHI_INV_CUBE,
                ..base
            },
        };
        cfg.normalized()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = CfmError;

    /// Case-insensitive; `-` and spaces are read as `_`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = name.to_lowercase().replace(['-', ' '], "_");
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| CfmError::UnknownPreset {
                name: name.to_string(),
                valid: PRESET_NAMES.join(", "),
            })
    }
}

/// Look up a preset configuration by name.
pub fn get_preset(name: &str) -> CfmResult<CfmV2Config> {
    Ok(name.parse::<Preset>()?.config())
}

pub fn list_presets() -> Vec<&'static str> {
    PRESET_NAMES.to_vec()
}
