// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all CFM kernel failures.
///
/// The dynamical cores themselves never fail; these variants cover name
/// lookups, configuration loading, and the file-based tooling.
#[derive(Error, Debug)]
pub enum CfmError {
    /// Preset name did not match any registered preset.
    #[error("unknown preset '{name}'. Valid presets: {valid}")]
    UnknownPreset { name: String, valid: String },

    /// Core type identifier did not match any variant.
    #[error("unknown core type '{name}'. Valid types: {valid}")]
    UnknownCoreType { name: String, valid: String },

    /// Reference scenario name did not match any scenario.
    #[error("unknown scenario '{name}'. Valid: {valid}")]
    UnknownScenario { name: String, valid: String },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading or writing a run artifact failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CfmError {
    fn from(e: serde_json::Error) -> Self {
        CfmError::Serialization(e.to_string())
    }
}

pub type CfmResult<T> = Result<T, CfmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_preset_lists_valid_names() {
        let err = CfmError::UnknownPreset {
            name: "turbo".into(),
            valid: "baseline, high_stability".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'turbo'"), "{msg}");
        assert!(msg.contains("baseline, high_stability"), "{msg}");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: CfmError = parse.unwrap_err().into();
        assert!(matches!(err, CfmError::Serialization(_)));
    }
}
