// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Step Output
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// The four bounded diagnostics every core variant reports.
pub const COMMON_METRICS: [&str; 4] = ["coherence", "stability", "intensity", "alignment"];

/// Clamp a value to [0, 1], mapping NaN to 0 and Inf to the nearest bound.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_unit: NaN detected, clamping to 0.0");
        return 0.0;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { 1.0 } else { 0.0 };
        log::warn!("clamp_unit: Inf detected, clamping to {boundary:.1}");
        return boundary;
    }
    value.clamp(0.0, 1.0)
}

/// Result of a single core step.
///
/// Serializes to the flat mapping callers consume: the four diagnostics
/// plus `cfm_*` bookkeeping keys. Variant-specific keys are omitted when
/// the producing core does not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub coherence: f64,
    pub stability: f64,
    pub intensity: f64,
    pub alignment: f64,
    /// Accumulated simulated time.
    #[serde(rename = "cfm_time")]
    pub time: f64,
    /// Number of steps executed so far.
    #[serde(rename = "cfm_step")]
    pub step: u64,
    /// Primary (global) phase in [0, 1).
    #[serde(rename = "cfm_phase")]
    pub phase: f64,
    #[serde(rename = "cfm_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(
        rename = "cfm_resonance_index",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resonance_index: Option<f64>,
    /// Euclidean distance of the (coherence, energy, stability) projection
    /// from the basin center.
    #[serde(
        rename = "cfm_basin_distance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub basin_distance: Option<f64>,
}

impl StepOutput {
    /// Look up a field by its serialized key.
    pub fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "coherence" => Some(self.coherence),
            "stability" => Some(self.stability),
            "intensity" => Some(self.intensity),
            "alignment" => Some(self.alignment),
            "cfm_time" => Some(self.time),
            "cfm_step" => Some(self.step as f64),
            "cfm_phase" => Some(self.phase),
            "cfm_version" => self.version.map(f64::from),
            "cfm_resonance_index" => self.resonance_index,
            "cfm_basin_distance" => self.basin_distance,
            _ => None,
        }
    }

    /// The four diagnostics in `COMMON_METRICS` order.
    pub fn diagnostics(&self) -> [f64; 4] {
        [self.coherence, self.stability, self.intensity, self.alignment]
    }

    /// True when all four diagnostics are finite and inside [0, 1].
    pub fn is_bounded(&self) -> bool {
        self.diagnostics()
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StepOutput {
        StepOutput {
            coherence: 0.6,
            stability: 0.7,
            intensity: 0.8,
            alignment: 0.5,
            time: 0.1,
            step: 1,
            phase: 0.25,
            version: Some(2),
            resonance_index: Some(0.6),
            basin_distance: Some(0.02),
        }
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_clamp_neg_inf() {
        assert_eq!(clamp_unit(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_clamp_normal() {
        assert_eq!(clamp_unit(0.75), 0.75);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.3), 0.0);
    }

    #[test]
    fn test_serialized_keys() {
        let v = sample().to_value();
        let obj = v.as_object().unwrap();
        for key in [
            "coherence",
            "stability",
            "intensity",
            "alignment",
            "cfm_time",
            "cfm_step",
            "cfm_phase",
            "cfm_version",
            "cfm_resonance_index",
            "cfm_basin_distance",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["cfm_version"], 2);
    }

    #[test]
    fn test_optional_keys_omitted() {
        let out = StepOutput {
            version: None,
            resonance_index: None,
            basin_distance: None,
            ..sample()
        };
        let v = out.to_value();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("cfm_version"));
        assert!(!obj.contains_key("cfm_basin_distance"));
        assert_eq!(obj.len(), 7);
    }

    #[test]
    fn test_metric_lookup() {
        let out = sample();
        assert_eq!(out.metric("intensity"), Some(0.8));
        assert_eq!(out.metric("cfm_step"), Some(1.0));
        assert_eq!(out.metric("cfm_version"), Some(2.0));
        assert_eq!(out.metric("unknown"), None);
    }

    #[test]
    fn test_is_bounded() {
        assert!(sample().is_bounded());
        let bad = StepOutput {
            alignment: f64::NAN,
            ..sample()
        };
        assert!(!bad.is_bounded());
    }
}
