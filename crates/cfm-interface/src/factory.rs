// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core Factory
// ─────────────────────────────────────────────────────────────────────
//! Construction of cores by variant identifier.

use serde::{Deserialize, Serialize};

use cfm_dynamics::v2::get_preset;
use cfm_dynamics::{
    CfmCore, CfmCoreV0, CfmCoreV1, CfmCoreV2, CfmV0Config, CfmV1Config, CfmV2Config,
};
use cfm_types::{CfmError, CfmResult};

/// Recognised identifiers. `cfm` is an alias for `cfm_v0`.
pub const CORE_TYPES: [&str; 4] = ["cfm", "cfm_v0", "cfm_v1", "cfm_v2"];

pub const DEFAULT_CORE_TYPE: &str = "cfm_v2";

/// A boxed core that can be moved to another thread.
pub type DynCore = Box<dyn CfmCore + Send>;

/// Variant-tagged configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "core_type", content = "config")]
pub enum CoreConfig {
    #[serde(rename = "cfm_v0")]
    V0(CfmV0Config),
    #[serde(rename = "cfm_v1")]
    V1(CfmV1Config),
    #[serde(rename = "cfm_v2")]
    V2(CfmV2Config),
}

pub fn list_core_types() -> &'static [&'static str] {
    &CORE_TYPES
}

/// Build a core from its identifier (case-insensitive).
///
/// `preset` is consulted only for `cfm_v2`.
pub fn create_core(core_type: &str, preset: Option<&str>) -> CfmResult<DynCore> {
    let key = core_type.to_lowercase();
    let core: DynCore = match key.as_str() {
        "cfm" | "cfm_v0" => Box::new(CfmCoreV0::default()),
        "cfm_v1" => Box::new(CfmCoreV1::default()),
        "cfm_v2" => {
            let config = match preset {
                Some(name) => get_preset(name)?,
                None => CfmV2Config::default(),
            };
            Box::new(CfmCoreV2::new(config))
        }
        _ => {
            return Err(CfmError::UnknownCoreType {
                name: core_type.to_string(),
                valid: CORE_TYPES.join(", "),
            })
        }
    };
    log::debug!("created core '{key}' (preset: {})", preset.unwrap_or("none"));
    Ok(core)
}

/// Build a core from an explicit configuration.
pub fn create_core_with_config(config: CoreConfig) -> DynCore {
    match config {
        CoreConfig::V0(c) => Box::new(CfmCoreV0::new(c)),
        CoreConfig::V1(c) => Box::new(CfmCoreV1::new(c)),
        CoreConfig::V2(c) => Box::new(CfmCoreV2::new(c)),
    }
}
