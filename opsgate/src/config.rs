//! Gate configuration.

use crate::errors::OpsGateError;
use crate::observability::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "OPSGATE_";

/// Runtime configuration for sessions, the gate and the built-in toolbelt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Upper bound on a single handler execution, in seconds.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_seconds: f64,
    /// Whether built-in operations sleep to mimic real latency.
    #[serde(default = "default_simulated_latency")]
    pub simulated_latency: bool,
    /// Idle sessions older than this are eligible for reaping.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_execution_timeout() -> f64 {
    30.0
}

fn default_simulated_latency() -> bool {
    true
}

fn default_session_ttl() -> u64 {
    3600
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            execution_timeout_seconds: default_execution_timeout(),
            simulated_latency: default_simulated_latency(),
            session_ttl_seconds: default_session_ttl(),
            log_format: LogFormat::default(),
        }
    }
}

impl GateConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, OpsGateError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| OpsGateError::Config(e.to_string()))?;
        config.validate()
    }

    /// Builds a configuration from `OPSGATE_*` environment variables.
    pub fn from_env() -> Result<Self, OpsGateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OpsGateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(v) = get("EXECUTION_TIMEOUT_SECONDS") {
            config.execution_timeout_seconds = parse_value("EXECUTION_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = get("SIMULATED_LATENCY") {
            config.simulated_latency = parse_value("SIMULATED_LATENCY", &v)?;
        }
        if let Some(v) = get("SESSION_TTL_SECONDS") {
            config.session_ttl_seconds = parse_value("SESSION_TTL_SECONDS", &v)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            config.log_format = v.parse()?;
        }

        config.validate()
    }

    /// Sets the execution timeout.
    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout_seconds = timeout.as_secs_f64();
        self
    }

    /// Enables or disables simulated latency.
    #[must_use]
    pub fn with_simulated_latency(mut self, enabled: bool) -> Self {
        self.simulated_latency = enabled;
        self
    }

    /// Sets the session TTL.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl_seconds = ttl.as_secs();
        self
    }

    /// Returns the execution timeout as a Duration.
    #[must_use]
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.execution_timeout_seconds)
    }

    /// Returns the session TTL as a Duration.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    fn validate(self) -> Result<Self, OpsGateError> {
        let timeout = self.execution_timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(OpsGateError::Config(format!(
                "execution_timeout_seconds must be a positive number, got {timeout}"
            )));
        }
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, OpsGateError> {
    raw.trim()
        .parse()
        .map_err(|_| OpsGateError::Config(format!("invalid value for {ENV_PREFIX}{name}: '{raw}'")))
}
