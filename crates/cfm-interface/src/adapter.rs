// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core Adapter
// ─────────────────────────────────────────────────────────────────────
//! Fault-isolating wrapper between a core and external tooling.
//!
//! The adapter never propagates a core failure (unless `fail_closed` is
//! off): panics are caught, non-finite diagnostics are replaced with 0.0,
//! and every call reports counters alongside the normalized values.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use serde::Serialize;

use cfm_dynamics::CfmCore;
use cfm_types::{clamp_unit, StepOutput};

use crate::config::InterfaceConfig;
use crate::factory::DynCore;

/// Per-call bookkeeping returned with every adapter step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterMetadata {
    pub call_count: u64,
    pub error_count: u64,
    /// Set only when this call failed.
    pub last_error: Option<String>,
    pub dt_clamped: bool,
    pub dt_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterStepResult {
    /// Core output as produced; an empty object when the core failed.
    pub raw: serde_json::Value,
    /// `numeric_keys` values, each finite and in [0, 1].
    pub numeric_state: BTreeMap<String, f64>,
    pub metadata: AdapterMetadata,
}

impl AdapterStepResult {
    pub fn value(&self, key: &str) -> f64 {
        self.numeric_state.get(key).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterStatus {
    pub call_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub config_enabled: bool,
    pub config_max_dt: f64,
}

struct AdapterInner {
    core: DynCore,
    call_count: u64,
    error_count: u64,
    last_error: Option<String>,
}

/// Thread-safe adapter around a boxed core.
///
/// Callers are serialised by a `parking_lot::Mutex`; `step` takes `&self`
/// so one adapter can be shared behind an `Arc`.
pub struct CoreAdapter {
    config: InterfaceConfig,
    inner: Mutex<AdapterInner>,
}

impl CoreAdapter {
    pub fn new(core: DynCore) -> Self {
        Self::with_config(core, InterfaceConfig::default())
    }

    pub fn with_config(core: DynCore, config: InterfaceConfig) -> Self {
        Self {
            config: config.normalized(),
            inner: Mutex::new(AdapterInner {
                core,
                call_count: 0,
                error_count: 0,
                last_error: None,
            }),
        }
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    /// Step the wrapped core and normalize its diagnostics.
    pub fn step(
        &self,
        human_messages: Option<&[String]>,
        external_events: Option<&serde_json::Value>,
        dt: f64,
    ) -> AdapterStepResult {
        let dt_used = if dt.is_nan() { 0.0 } else { dt.clamp(0.0, self.config.max_dt) };
        let dt_clamped = dt_used != dt;

        let mut inner = self.inner.lock();
        inner.call_count += 1;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            inner.core.step_with(human_messages, external_events, dt_used)
        }));

        let mut errors: Vec<String> = Vec::new();
        let (raw, numeric_state) = match outcome {
            Ok(output) => {
                let numeric = self.extract_numeric_state(&output, &mut errors);
                (output.to_value(), numeric)
            }
            Err(payload) => {
                let msg = panic_message(&*payload);
                log::warn!("core step panicked: {msg}");
                if !self.config.fail_closed {
                    drop(inner);
                    panic::resume_unwind(payload);
                }
                errors.push(format!("core panicked: {msg}"));
                let zeroed = self
                    .config
                    .numeric_keys
                    .iter()
                    .map(|k| (k.clone(), 0.0))
                    .collect();
                (serde_json::Value::Object(serde_json::Map::new()), zeroed)
            }
        };

        let last_error = if errors.is_empty() {
            None
        } else {
            inner.error_count += errors.len() as u64;
            let joined = errors.join("; ");
            inner.last_error = Some(joined.clone());
            Some(joined)
        };

        AdapterStepResult {
            raw,
            numeric_state,
            metadata: AdapterMetadata {
                call_count: inner.call_count,
                error_count: inner.error_count,
                last_error,
                dt_clamped,
                dt_used,
            },
        }
    }

    fn extract_numeric_state(&self, output: &StepOutput, errors: &mut Vec<String>) -> BTreeMap<String, f64> {
        self.config
            .numeric_keys
            .iter()
            .map(|key| {
                let value = match output.metric(key) {
                    None => 0.0,
                    Some(v) if !v.is_finite() => {
                        log::warn!("core reported non-finite {key}={v}, using 0.0");
                        errors.push(format!("non-finite value for '{key}'"));
                        0.0
                    }
                    Some(v) => clamp_unit(v),
                };
                (key.clone(), value)
            })
            .collect()
    }

    pub fn status(&self) -> AdapterStatus {
        let inner = self.inner.lock();
        AdapterStatus {
            call_count: inner.call_count,
            error_count: inner.error_count,
            last_error: inner.last_error.clone(),
            config_enabled: self.config.enabled,
            config_max_dt: self.config.max_dt,
        }
    }

    /// Diagnostic status of the wrapped core.
    pub fn core_status(&self) -> serde_json::Value {
        self.inner.lock().core.status()
    }

    /// Clear the counters. The wrapped core is left untouched.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.call_count = 0;
        inner.error_count = 0;
        inner.last_error = None;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_core;
    use cfm_dynamics::StateMap;
    use std::sync::Arc;

    /// Emits NaN coherence and infinite intensity.
    struct BrokenCore;

    impl CfmCore for BrokenCore {
        fn version(&self) -> u8 {
            99
        }
        fn step_with(&mut self, _: Option<&[String]>, _: Option<&serde_json::Value>, dt: f64) -> StepOutput {
            StepOutput {
                coherence: f64::NAN,
                stability: 1.7,
                intensity: f64::INFINITY,
                alignment: -0.2,
                time: dt,
                step: 1,
                phase: 0.0,
                version: None,
                resonance_index: None,
                basin_distance: None,
            }
        }
        fn reset(&mut self) {}
        fn state_map(&self) -> StateMap {
            StateMap::new()
        }
        fn status(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
        fn verify_state_bounds(&self) -> bool {
            false
        }
    }

    struct PanickingCore;

    impl CfmCore for PanickingCore {
        fn version(&self) -> u8 {
            98
        }
        fn step_with(&mut self, _: Option<&[String]>, _: Option<&serde_json::Value>, _: f64) -> StepOutput {
            panic!("integrator exploded")
        }
        fn reset(&mut self) {}
        fn state_map(&self) -> StateMap {
            StateMap::new()
        }
        fn status(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
        fn verify_state_bounds(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_wraps_v2_core() {
        let adapter = CoreAdapter::new(create_core("cfm_v2", None).unwrap());
        let r = adapter.step(None, None, 0.1);
        assert_eq!(r.numeric_state.len(), 4);
        for v in r.numeric_state.values() {
            assert!((0.0..=1.0).contains(v));
        }
        assert_eq!(r.raw["cfm_version"], 2);
        assert_eq!(r.metadata.call_count, 1);
        assert_eq!(r.metadata.error_count, 0);
        assert!(r.metadata.last_error.is_none());
        assert!(!r.metadata.dt_clamped);
    }

    #[test]
    fn test_dt_clamping_reported() {
        let adapter = CoreAdapter::with_config(
            create_core("cfm_v1", None).unwrap(),
            InterfaceConfig {
                max_dt: 0.5,
                ..Default::default()
            },
        );
        let r = adapter.step(None, None, 3.0);
        assert!(r.metadata.dt_clamped);
        assert_eq!(r.metadata.dt_used, 0.5);
        let r = adapter.step(None, None, -1.0);
        assert!(r.metadata.dt_clamped);
        assert_eq!(r.metadata.dt_used, 0.0);
        let r = adapter.step(None, None, 0.25);
        assert!(!r.metadata.dt_clamped);
    }

    #[test]
    fn test_non_finite_values_zeroed_and_counted() {
        let adapter = CoreAdapter::new(Box::new(BrokenCore));
        let r = adapter.step(None, None, 0.1);
        assert_eq!(r.value("coherence"), 0.0);
        assert_eq!(r.value("intensity"), 0.0);
        assert_eq!(r.value("stability"), 1.0);
        assert_eq!(r.value("alignment"), 0.0);
        assert_eq!(r.metadata.error_count, 2);
        assert!(r.metadata.last_error.unwrap().contains("coherence"));
    }

    #[test]
    fn test_missing_key_defaults_to_zero() {
        let adapter = CoreAdapter::with_config(
            create_core("cfm_v0", None).unwrap(),
            InterfaceConfig {
                numeric_keys: vec!["coherence".into(), "cfm_resonance_index".into()],
                ..Default::default()
            },
        );
        let r = adapter.step(None, None, 0.1);
        assert_eq!(r.value("cfm_resonance_index"), 0.0);
        assert_eq!(r.metadata.error_count, 0);
    }

    #[test]
    fn test_panic_caught() {
        let adapter = CoreAdapter::new(Box::new(PanickingCore));
        let r = adapter.step(None, None, 0.1);
        assert_eq!(r.raw, serde_json::json!({}));
        assert!(r.numeric_state.values().all(|v| *v == 0.0));
        assert_eq!(r.metadata.error_count, 1);
        assert!(r.metadata.last_error.as_deref().unwrap().contains("integrator exploded"));

        let status = adapter.status();
        assert_eq!(status.call_count, 1);
        assert_eq!(status.error_count, 1);
    }

    #[test]
    fn test_last_error_only_on_failing_call() {
        let adapter = CoreAdapter::new(Box::new(BrokenCore));
        let first = adapter.step(None, None, 0.1);
        assert!(first.metadata.last_error.is_some());
        assert!(adapter.status().last_error.is_some());
    }

    #[test]
    fn test_fail_open_propagates_panic() {
        let adapter = CoreAdapter::with_config(
            Box::new(PanickingCore),
            InterfaceConfig {
                fail_closed: false,
                ..Default::default()
            },
        );
        let result = panic::catch_unwind(AssertUnwindSafe(|| adapter.step(None, None, 0.1)));
        assert!(result.is_err());
        assert_eq!(adapter.status().call_count, 1);
    }

    #[test]
    fn test_reset_clears_counters_only() {
        let adapter = CoreAdapter::new(create_core("cfm_v2", None).unwrap());
        for _ in 0..5 {
            adapter.step(None, None, 0.1);
        }
        adapter.reset();
        let status = adapter.status();
        assert_eq!(status.call_count, 0);
        assert_eq!(status.error_count, 0);
        assert_eq!(adapter.core_status()["state"]["step_count"], 5);
    }

    #[test]
    fn test_shared_across_threads() {
        let adapter = Arc::new(CoreAdapter::new(create_core("cfm_v2", None).unwrap()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let a = Arc::clone(&adapter);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        a.step(None, None, 0.1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(adapter.status().call_count, 100);
    }

    #[test]
    fn test_result_serializes() {
        let adapter = CoreAdapter::new(create_core("cfm_v2", None).unwrap());
        let r = adapter.step(Some(&["hi".to_string()]), None, 0.1);
        let v = serde_json::to_value(&r).unwrap();
        assert!(v["metadata"]["dt_used"].is_number());
        assert!(v["numeric_state"]["alignment"].is_number());
    }
}
