// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// No #[deny(unsafe_code)] here: the PyO3 proc macros expand to unsafe
// blocks. Hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust CFM cores.
//!
//! Exposes `CfmCore` (v0), `CfmCoreV1`, `CfmCoreV2`, the fault-isolating
//! `CfmAdapter`, and the `create_cfm_core` factory to Python via PyO3.
//!
//! # FFI Safety
//!
//! - Step results are plain dicts of floats; no Rust references escape.
//! - `external_events` is accepted for signature compatibility and never
//!   inspected.
//! - Unknown core types, presets and malformed config JSON raise
//!   `ValueError`.
//!
//! Install: `pip install -e crates/cfm-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from cfm_kernel import create_cfm_core
//!
//! core = create_cfm_core("cfm_v2", preset="high_stability")
//! out = core.step(dt=0.1)
//! print(out["coherence"], out["cfm_basin_distance"])
//! ```

use std::collections::BTreeMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use pyo3::IntoPyObjectExt;
use serde_json::Value;

use cfm_dynamics::v2::{get_preset, list_presets as preset_names};
use cfm_dynamics::{
    CfmCore, CfmCoreV0, CfmCoreV1, CfmCoreV2, CfmV0Config, CfmV0State, CfmV1Config, CfmV1State,
    CfmV2Config, CfmV2State,
};
use cfm_interface::{create_core, list_core_types as core_type_names, CoreAdapter, InterfaceConfig};
use cfm_types::{CfmError, StepOutput};

fn value_error(e: CfmError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ─── Conversions ────────────────────────────────────────────────────

fn output_dict<'py>(py: Python<'py>, out: &StepOutput) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("coherence", out.coherence)?;
    dict.set_item("stability", out.stability)?;
    dict.set_item("intensity", out.intensity)?;
    dict.set_item("alignment", out.alignment)?;
    dict.set_item("cfm_time", out.time)?;
    dict.set_item("cfm_step", out.step)?;
    dict.set_item("cfm_phase", out.phase)?;
    if let Some(v) = out.version {
        dict.set_item("cfm_version", v)?;
    }
    if let Some(r) = out.resonance_index {
        dict.set_item("cfm_resonance_index", r)?;
    }
    if let Some(d) = out.basin_distance {
        dict.set_item("cfm_basin_distance", d)?;
    }
    Ok(dict)
}

fn map_dict<'py>(py: Python<'py>, map: &BTreeMap<String, f64>) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (k, v) in map {
        dict.set_item(k, *v)?;
    }
    Ok(dict)
}

/// Convert a JSON document into the equivalent Python object tree.
fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    match value {
        Value::Null => Ok(py.None()),
        Value::Bool(b) => b.into_py_any(py),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into_py_any(py),
            None => n.as_f64().unwrap_or(f64::NAN).into_py_any(py),
        },
        Value::String(s) => s.into_py_any(py),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_py_any(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (k, v) in map {
                dict.set_item(k, json_to_py(py, v)?)?;
            }
            dict.into_py_any(py)
        }
    }
}

fn step_core<'py>(
    py: Python<'py>,
    core: &mut dyn CfmCore,
    human_messages: Option<Vec<String>>,
    dt: f64,
) -> PyResult<Bound<'py, PyDict>> {
    let out = core.step_with(human_messages.as_deref(), None, dt);
    output_dict(py, &out)
}

// ─── CfmCore (v0) ───────────────────────────────────────────────────

/// Minimal coherence / instability / energy / phase core.
#[pyclass(name = "CfmCore")]
struct PyCfmCoreV0 {
    inner: CfmCoreV0,
}

#[pymethods]
impl PyCfmCoreV0 {
    #[new]
    #[pyo3(signature = (config_json = None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => CfmV0Config::from_json(json).map_err(value_error)?,
            None => CfmV0Config::default(),
        };
        Ok(Self {
            inner: CfmCoreV0::new(config),
        })
    }

    #[pyo3(signature = (human_messages = None, external_events = None, dt = 1.0))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        human_messages: Option<Vec<String>>,
        external_events: Option<Bound<'py, PyAny>>,
        dt: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let _ = external_events;
        step_core(py, &mut self.inner, human_messages, dt)
    }

    /// Reset to defaults, or to the given state mapping.
    #[pyo3(signature = (initial_state = None))]
    fn reset(&mut self, initial_state: Option<BTreeMap<String, f64>>) {
        self.inner.reset_to(initial_state.as_ref().map(CfmV0State::from_map));
    }

    fn get_state<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        map_dict(py, &self.inner.state_map())
    }

    fn get_status(&self, py: Python<'_>) -> PyResult<PyObject> {
        json_to_py(py, &self.inner.status())
    }

    fn verify_state_bounds(&self) -> bool {
        self.inner.verify_state_bounds()
    }

    fn __repr__(&self) -> String {
        let s = self.inner.get_state();
        format!("CfmCore(coherence={:.4}, step={})", s.coherence, s.step_count)
    }
}

// ─── CfmCoreV1 ──────────────────────────────────────────────────────

/// Slow/fast split core with alignment lock-in.
#[pyclass(name = "CfmCoreV1")]
struct PyCfmCoreV1 {
    inner: CfmCoreV1,
}

#[pymethods]
impl PyCfmCoreV1 {
    #[new]
    #[pyo3(signature = (config_json = None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => CfmV1Config::from_json(json).map_err(value_error)?,
            None => CfmV1Config::default(),
        };
        Ok(Self {
            inner: CfmCoreV1::new(config),
        })
    }

    #[pyo3(signature = (human_messages = None, external_events = None, dt = 1.0))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        human_messages: Option<Vec<String>>,
        external_events: Option<Bound<'py, PyAny>>,
        dt: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let _ = external_events;
        step_core(py, &mut self.inner, human_messages, dt)
    }

    #[pyo3(signature = (initial_state = None))]
    fn reset(&mut self, initial_state: Option<BTreeMap<String, f64>>) {
        self.inner.reset_to(initial_state.as_ref().map(CfmV1State::from_map));
    }

    fn get_state<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        map_dict(py, &self.inner.state_map())
    }

    fn get_status(&self, py: Python<'_>) -> PyResult<PyObject> {
        json_to_py(py, &self.inner.status())
    }

    fn verify_state_bounds(&self) -> bool {
        self.inner.verify_state_bounds()
    }
}

// ─── CfmCoreV2 ──────────────────────────────────────────────────────

/// Multi-channel core with timescale hierarchy and attractor basin.
#[pyclass(name = "CfmCoreV2")]
struct PyCfmCoreV2 {
    inner: CfmCoreV2,
}

#[pymethods]
impl PyCfmCoreV2 {
    /// `preset` takes precedence over `config_json` when both are given.
    #[new]
    #[pyo3(signature = (config_json = None, preset = None))]
    fn new(config_json: Option<&str>, preset: Option<&str>) -> PyResult<Self> {
        let config = match (preset, config_json) {
            (Some(name), _) => get_preset(name).map_err(value_error)?,
            (None, Some(json)) => CfmV2Config::from_json(json).map_err(value_error)?,
            (None, None) => CfmV2Config::default(),
        };
        Ok(Self {
            inner: CfmCoreV2::new(config),
        })
    }

    #[pyo3(signature = (human_messages = None, external_events = None, dt = 1.0))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        human_messages: Option<Vec<String>>,
        external_events: Option<Bound<'py, PyAny>>,
        dt: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let _ = external_events;
        step_core(py, &mut self.inner, human_messages, dt)
    }

    #[pyo3(signature = (initial_state = None))]
    fn reset(&mut self, initial_state: Option<BTreeMap<String, f64>>) {
        self.inner.reset_to(initial_state.as_ref().map(CfmV2State::from_map));
    }

    fn get_state<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        map_dict(py, &self.inner.state_map())
    }

    fn get_status(&self, py: Python<'_>) -> PyResult<PyObject> {
        json_to_py(py, &self.inner.status())
    }

    /// Channel-grouped view of the state.
    fn get_channel_states(&self, py: Python<'_>) -> PyResult<PyObject> {
        let channels = serde_json::to_value(self.inner.channel_states())
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        json_to_py(py, &channels)
    }

    fn basin_distance(&self) -> f64 {
        self.inner.basin_distance()
    }

    fn verify_state_bounds(&self) -> bool {
        self.inner.verify_state_bounds()
    }

    fn __repr__(&self) -> String {
        let s = self.inner.get_state();
        format!(
            "CfmCoreV2(coherence_slow={:.4}, resonance={:.4}, step={})",
            s.coherence_slow, s.resonance_index, s.step_count
        )
    }
}

// ─── CfmAdapter ─────────────────────────────────────────────────────

/// Fault-isolating wrapper that reports clamped numeric diagnostics.
#[pyclass(name = "CfmAdapter")]
struct PyCfmAdapter {
    inner: CoreAdapter,
}

#[pymethods]
impl PyCfmAdapter {
    #[new]
    #[pyo3(signature = (core_type = "cfm_v2", preset = None, config_json = None))]
    fn new(core_type: &str, preset: Option<&str>, config_json: Option<&str>) -> PyResult<Self> {
        let core = create_core(core_type, preset).map_err(value_error)?;
        let config = match config_json {
            Some(json) => InterfaceConfig::from_json(json).map_err(value_error)?,
            None => InterfaceConfig::default(),
        };
        Ok(Self {
            inner: CoreAdapter::with_config(core, config),
        })
    }

    /// Returns `{"raw": ..., "numeric_state": ..., "metadata": ...}`.
    #[pyo3(signature = (human_messages = None, external_events = None, dt = 1.0))]
    fn step(
        &self,
        py: Python<'_>,
        human_messages: Option<Vec<String>>,
        external_events: Option<Bound<'_, PyAny>>,
        dt: f64,
    ) -> PyResult<PyObject> {
        let _ = external_events;
        let result = self.inner.step(human_messages.as_deref(), None, dt);
        let value = serde_json::to_value(&result).map_err(|e| PyValueError::new_err(e.to_string()))?;
        json_to_py(py, &value)
    }

    fn get_status(&self, py: Python<'_>) -> PyResult<PyObject> {
        let value = serde_json::to_value(self.inner.status())
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        json_to_py(py, &value)
    }

    fn get_core_status(&self, py: Python<'_>) -> PyResult<PyObject> {
        json_to_py(py, &self.inner.core_status())
    }

    /// Clear call and error counters. Core state is kept.
    fn reset(&self) {
        self.inner.reset();
    }
}

// ─── Factory ────────────────────────────────────────────────────────

/// Build a core by type name (`cfm`, `cfm_v0`, `cfm_v1`, `cfm_v2`).
#[pyfunction]
#[pyo3(signature = (core_type = "cfm_v2", preset = None))]
fn create_cfm_core(py: Python<'_>, core_type: &str, preset: Option<&str>) -> PyResult<PyObject> {
    match core_type.to_lowercase().as_str() {
        "cfm" | "cfm_v0" => Py::new(py, PyCfmCoreV0 {
            inner: CfmCoreV0::default(),
        })?
        .into_py_any(py),
        "cfm_v1" => Py::new(py, PyCfmCoreV1 {
            inner: CfmCoreV1::default(),
        })?
        .into_py_any(py),
        "cfm_v2" => Py::new(py, PyCfmCoreV2::new(None, preset)?)?.into_py_any(py),
        _ => {
            // Route through the Rust factory for the canonical error text.
            let err = create_core(core_type, preset).err().map(value_error);
            Err(err.unwrap_or_else(|| PyValueError::new_err(format!("unknown core type '{core_type}'"))))
        }
    }
}

#[pyfunction]
fn list_core_types() -> Vec<&'static str> {
    core_type_names().to_vec()
}

#[pyfunction]
fn list_presets() -> Vec<&'static str> {
    preset_names()
}

#[pymodule]
fn cfm_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Cores
    m.add_class::<PyCfmCoreV0>()?;
    m.add_class::<PyCfmCoreV1>()?;
    m.add_class::<PyCfmCoreV2>()?;
    // Interface
    m.add_class::<PyCfmAdapter>()?;
    m.add_function(wrap_pyfunction!(create_cfm_core, m)?)?;
    m.add_function(wrap_pyfunction!(list_core_types, m)?)?;
    m.add_function(wrap_pyfunction!(list_presets, m)?)?;
    Ok(())
}
