// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Interface Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use cfm_types::{CfmError, CfmResult, COMMON_METRICS};

/// Integration flags for the adapter layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Master switch for integrators. The adapter itself does not consult it.
    pub enabled: bool,
    pub use_mock_core: bool,
    /// Upper bound applied to `dt` before the core sees it.
    pub max_dt: f64,
    /// Failures yield zeroed diagnostics instead of propagating.
    pub fail_closed: bool,
    /// Output keys copied into `numeric_state`, in order.
    pub numeric_keys: Vec<String>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_mock_core: true,
            max_dt: 1.0,
            fail_closed: true,
            numeric_keys: COMMON_METRICS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl InterfaceConfig {
    pub fn normalized(mut self) -> Self {
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            log::debug!("interface max_dt {} is not positive, using 1.0", self.max_dt);
            self.max_dt = 1.0;
        }
        self
    }

    pub fn from_json(json: &str) -> CfmResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| CfmError::Config(format!("JSON parse error: {e}")))?;
        Ok(cfg.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = InterfaceConfig::default();
        assert!(!c.enabled);
        assert!(c.use_mock_core);
        assert!(c.fail_closed);
        assert_eq!(c.max_dt, 1.0);
        assert_eq!(c.numeric_keys, vec!["coherence", "stability", "intensity", "alignment"]);
    }

    #[test]
    fn test_non_positive_max_dt() {
        let c = InterfaceConfig {
            max_dt: -0.5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(c.max_dt, 1.0);
    }

    #[test]
    fn test_from_json() {
        let c = InterfaceConfig::from_json(r#"{"max_dt": 0.0, "numeric_keys": ["coherence"]}"#).unwrap();
        assert_eq!(c.max_dt, 1.0);
        assert_eq!(c.numeric_keys, vec!["coherence"]);
        assert!(InterfaceConfig::from_json(r#"{"max_dt": "big"}"#).is_err());
    }
}
