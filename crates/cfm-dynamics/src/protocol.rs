// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core Protocol
// ─────────────────────────────────────────────────────────────────────
//! The capability interface shared by all core variants.

use std::collections::BTreeMap;

use cfm_types::StepOutput;

/// Flat key → value view of a core's internal state.
pub type StateMap = BTreeMap<String, f64>;

/// A steppable CFM core.
///
/// Implementations must:
///   - never panic for any `dt` (NaN is treated as 0, ±Inf is clamped
///     to the `[0, max_dt]` bounds)
///   - leave `human_messages` and `external_events` untouched
///   - be deterministic in (internal state, dt)
pub trait CfmCore {
    /// Variant number reported as `cfm_version` (0 for the minimal core).
    fn version(&self) -> u8;

    /// Advance by `dt` (clamped to `[0, max_dt]`) and report diagnostics.
    fn step_with(
        &mut self,
        human_messages: Option<&[String]>,
        external_events: Option<&serde_json::Value>,
        dt: f64,
    ) -> StepOutput;

    /// Advance by `dt` with no external inputs.
    fn step(&mut self, dt: f64) -> StepOutput {
        self.step_with(None, None, dt)
    }

    /// Return to the default initial state.
    fn reset(&mut self);

    /// Snapshot of the internal state as flat key/value pairs.
    fn state_map(&self) -> StateMap;

    /// Diagnostic status as a JSON document.
    fn status(&self) -> serde_json::Value;

    /// Re-run the state range checks.
    fn verify_state_bounds(&self) -> bool;
}

/// Clamp `dt` into `[0, max_dt]`. NaN becomes 0; ±Inf lands on a bound.
#[inline]
pub(crate) fn clamp_dt(dt: f64, max_dt: f64) -> f64 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max_dt)
}

/// Read `key` from a state map, falling back to `default`.
#[inline]
pub(crate) fn map_get(map: &StateMap, key: &str, default: f64) -> f64 {
    map.get(key).copied().unwrap_or(default)
}

/// Replace non-finite or out-of-range values with `default`, clamping the rest.
pub(crate) fn clamp_field(name: &str, value: f64, lo: f64, hi: f64, default: f64) -> f64 {
    if !value.is_finite() {
        log::debug!("{name}: non-finite value replaced with default {default:.4}");
        return default;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        log::debug!("{name}: {value:.4} clamped to {clamped:.4}");
    }
    clamped
}

/// Replace non-positive or non-finite values with `default`.
pub(crate) fn positive_field(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::debug!("{name}: {value} is not positive, using default {default:.4}");
        default
    }
}

/// Replace negative or non-finite values with `default`. No upper bound.
pub(crate) fn non_negative_field(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::debug!("{name}: {value} is negative or non-finite, using default {default:.4}");
        default
    }
}
