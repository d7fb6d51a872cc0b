//! Python bindings for the opsgate approval gate.
//!
//! This module exposes a blocking `Session` over the built-in net-ops
//! toolbelt so a Python UI host can drive the propose, approve and
//! acknowledge cycle. Every call releases the GIL while the gate works.

use opsgate::config::GateConfig;
use opsgate::errors::{GateError, OpsGateError};
use opsgate::observability::{init_tracing, LogFormat};
use opsgate::session::Session;
use opsgate::toolbelt::netops::netops_registry;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Python wrapper for a gated operator session.
#[pyclass(name = "Session")]
pub struct PySession {
    runtime: tokio::runtime::Runtime,
    session: Session,
}

#[pymethods]
impl PySession {
    /// Creates a session over the net-ops toolbelt.
    ///
    /// Settings default to the `OPSGATE_*` environment; explicit arguments
    /// take precedence.
    #[new]
    #[pyo3(signature = (session_id=None, simulate_latency=None, timeout_seconds=None))]
    fn new(
        session_id: Option<String>,
        simulate_latency: Option<bool>,
        timeout_seconds: Option<f64>,
    ) -> PyResult<Self> {
        let mut config = GateConfig::from_env().map_err(opsgate_err)?;
        if let Some(enabled) = simulate_latency {
            config = config.with_simulated_latency(enabled);
        }
        if let Some(seconds) = timeout_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(PyValueError::new_err("timeout_seconds must be positive"));
            }
            config = config.with_execution_timeout(Duration::from_secs_f64(seconds));
        }

        let registry = netops_registry(config.simulated_latency)
            .map_err(|e| opsgate_err(e.into()))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        let id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            runtime,
            session: Session::from_config(id, Arc::new(registry), &config),
        })
    }

    /// Returns the session ID.
    #[getter]
    fn id(&self) -> &str {
        self.session.id()
    }

    /// Returns the current state name.
    #[getter]
    fn state(&self) -> &'static str {
        self.session.gate().state_name()
    }

    /// Returns a renderable view of the gate.
    fn view(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py(py, &self.session.view())
    }

    /// Validates a proposal and places it in the gate.
    #[pyo3(signature = (tool, args=None, origin=None))]
    fn submit(
        &self,
        py: Python<'_>,
        tool: &str,
        args: Option<&Bound<'_, PyDict>>,
        origin: Option<&str>,
    ) -> PyResult<PyObject> {
        let args = match args {
            Some(dict) => dict_to_map(dict)?,
            None => serde_json::Map::new(),
        };
        let proposal = self
            .session
            .submit(tool, &args, origin)
            .map_err(opsgate_err)?;
        to_py(py, &proposal)
    }

    /// Approves and executes the pending proposal.
    ///
    /// Pass `proposal_id` to refuse if a different proposal is pending.
    #[pyo3(signature = (proposal_id=None))]
    fn approve(&self, py: Python<'_>, proposal_id: Option<&str>) -> PyResult<PyObject> {
        let id = proposal_id.map(parse_id).transpose()?;
        let outcome = py
            .allow_threads(|| {
                self.runtime.block_on(async {
                    match id {
                        Some(id) => self.session.approve_proposal(id).await,
                        None => self.session.approve().await,
                    }
                })
            })
            .map_err(gate_err)?;
        to_py(py, &outcome)
    }

    /// Rejects the pending proposal.
    #[pyo3(signature = (proposal_id=None))]
    fn reject(&self, proposal_id: Option<&str>) -> PyResult<()> {
        let result = match proposal_id.map(parse_id).transpose()? {
            Some(id) => self.session.reject_proposal(id),
            None => self.session.reject(),
        };
        result.map_err(gate_err)
    }

    /// Withdraws the pending proposal.
    fn cancel(&self, py: Python<'_>) -> PyResult<PyObject> {
        let proposal = self.session.cancel().map_err(gate_err)?;
        to_py(py, &proposal)
    }

    /// Consumes the resolution and returns the report.
    fn acknowledge(&self, py: Python<'_>) -> PyResult<PyObject> {
        let report = self.session.acknowledge().map_err(gate_err)?;
        to_py(py, &report)
    }

    /// Clears the gate; returns the report if a resolution was consumed.
    fn reset(&self, py: Python<'_>) -> PyResult<PyObject> {
        match self.session.reset().map_err(gate_err)? {
            Some(report) => to_py(py, &report),
            None => Ok(py.None()),
        }
    }

    /// Returns the registered operation names.
    fn operations(&self) -> Vec<String> {
        self.session
            .validator()
            .registry()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Returns function declarations for a tool-calling model.
    fn declarations(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py(py, &self.session.validator().registry().declarations())
    }

    fn __repr__(&self) -> String {
        format!(
            "Session(id='{}', state='{}')",
            self.session.id(),
            self.session.gate().state_name()
        )
    }
}

/// Installs the global tracing subscriber.
#[pyfunction]
#[pyo3(signature = (format="pretty"))]
fn init_logging(format: &str) -> PyResult<()> {
    let format: LogFormat = format.parse().map_err(opsgate_err)?;
    init_tracing(format).map_err(opsgate_err)
}

// Helper functions

fn opsgate_err(err: OpsGateError) -> PyErr {
    match err {
        OpsGateError::Gate(e) => gate_err(e),
        other => PyValueError::new_err(format!("{}: {other}", other.kind())),
    }
}

fn gate_err(err: GateError) -> PyErr {
    PyRuntimeError::new_err(format!("{}: {err}", err.kind()))
}

fn parse_id(raw: &str) -> PyResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| PyValueError::new_err(format!("invalid proposal id: {e}")))
}

fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json = serde_json::to_value(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    json_to_py(py, &json)
}

fn dict_to_map(dict: &Bound<'_, PyDict>) -> PyResult<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    for (key, value) in dict.iter() {
        let key_str: String = key.extract()?;
        map.insert(key_str, py_to_json(&value)?);
    }
    Ok(map)
}

fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<serde_json::Value> {
    if obj.is_none() {
        return Ok(serde_json::Value::Null);
    }

    if let Ok(b) = obj.extract::<bool>() {
        return Ok(serde_json::Value::Bool(b));
    }

    if let Ok(i) = obj.extract::<i64>() {
        return Ok(serde_json::Value::Number(i.into()));
    }

    if let Ok(f) = obj.extract::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Ok(serde_json::Value::Number(n));
        }
    }

    if let Ok(s) = obj.extract::<String>() {
        return Ok(serde_json::Value::String(s));
    }

    if let Ok(list) = obj.downcast::<PyList>() {
        let mut arr = Vec::new();
        for item in list.iter() {
            arr.push(py_to_json(&item)?);
        }
        return Ok(serde_json::Value::Array(arr));
    }

    if let Ok(dict) = obj.downcast::<PyDict>() {
        return Ok(serde_json::Value::Object(dict_to_map(dict)?));
    }

    // Unsupported types are rejected by the validator as the wrong kind.
    Ok(serde_json::Value::String(obj.str()?.to_string()))
}

fn json_to_py(py: Python<'_>, value: &serde_json::Value) -> PyResult<PyObject> {
    Ok(match value {
        serde_json::Value::Null => py.None(),
        serde_json::Value::Bool(b) => b.into_py(py),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_py(py)
            } else if let Some(f) = n.as_f64() {
                f.into_py(py)
            } else {
                py.None()
            }
        }
        serde_json::Value::String(s) => s.into_py(py),
        serde_json::Value::Array(arr) => {
            let items = arr
                .iter()
                .map(|v| json_to_py(py, v))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new_bound(py, items).into_py(py)
        }
        serde_json::Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (k, v) in map {
                dict.set_item(k, json_to_py(py, v)?)?;
            }
            dict.into_py(py)
        }
    })
}

/// The opsgate Python module.
#[pymodule]
fn opsgate_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySession>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Add version info
    m.add("__version__", "0.1.0")?;
    m.add("__rust_version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
