//! Built-in network operations toolbelt.
//!
//! These operations simulate an infrastructure backend: they sleep for a
//! realistic duration and return randomized but well-formed payloads.
//! Latency can be disabled for tests and demos.

use super::{ArgKind, ArgSpec, Arguments, OperationContract, OperationHandler, ToolbeltRegistry};
use crate::errors::RegistryError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Service statuses reported by `get_service_health`.
pub const SERVICE_STATUSES: [&str; 3] = ["Running", "Failed", "Degraded"];

const HEALTH_LATENCY: Duration = Duration::from_millis(500);
const GRACEFUL_RESTART_LATENCY: Duration = Duration::from_secs(1);
const FORCED_RESTART_LATENCY: Duration = Duration::from_secs(2);
const SCALE_LATENCY: Duration = Duration::from_secs(1);

async fn simulate(latency: Duration, enabled: bool) {
    if enabled {
        tokio::time::sleep(latency).await;
    }
}

/// Reports health and resource usage of a service.
#[derive(Debug, Clone, Copy)]
pub struct GetServiceHealth {
    simulate_latency: bool,
}

#[async_trait]
impl OperationHandler for GetServiceHealth {
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value> {
        let service = args.require_str("service_name")?.to_string();
        simulate(HEALTH_LATENCY, self.simulate_latency).await;

        let mut rng = rand::thread_rng();
        let status = SERVICE_STATUSES.choose(&mut rng).copied().unwrap_or("Running");
        let cpu: f64 = rng.gen_range(5.0..=95.0);
        let memory: u32 = rng.gen_range(128..=4096);

        Ok(serde_json::json!({
            "service": service,
            "status": status,
            "cpu_usage_percent": (cpu * 100.0).round() / 100.0,
            "memory_usage_mb": memory,
        }))
    }
}

/// Restarts a service, gracefully or by force.
#[derive(Debug, Clone, Copy)]
pub struct RestartService {
    simulate_latency: bool,
}

#[async_trait]
impl OperationHandler for RestartService {
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value> {
        let service = args.require_str("service_name")?.to_string();
        let force = args.require_bool("force")?;

        let latency = if force {
            FORCED_RESTART_LATENCY
        } else {
            GRACEFUL_RESTART_LATENCY
        };
        simulate(latency, self.simulate_latency).await;

        Ok(serde_json::json!({
            "service": service,
            "action": "restart",
            "mode": if force { "force" } else { "graceful" },
            "status": "Success",
            "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }))
    }
}

/// Scales a cluster to a target replica count.
#[derive(Debug, Clone, Copy)]
pub struct ScaleCluster {
    simulate_latency: bool,
}

#[async_trait]
impl OperationHandler for ScaleCluster {
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value> {
        let cluster_id = args.require_str("cluster_id")?.to_string();
        let replicas = args.require_i64("replicas")?;
        if replicas < 0 {
            anyhow::bail!("replicas must be a non-negative integer, got {replicas}");
        }

        simulate(SCALE_LATENCY, self.simulate_latency).await;

        let drift: i64 = rand::thread_rng().gen_range(-2..=2);
        let previous = replicas.saturating_add(drift).max(1);

        Ok(serde_json::json!({
            "cluster_id": cluster_id,
            "previous_replicas": previous,
            "current_replicas": replicas,
            "status": "Scaled",
        }))
    }
}

/// Returns the contracts of the built-in net-ops toolbelt.
#[must_use]
pub fn netops_manifest(simulate_latency: bool) -> Vec<OperationContract> {
    vec![
        OperationContract::new(
            "get_service_health",
            Arc::new(GetServiceHealth { simulate_latency }),
        )
        .with_description("Retrieves the current health status and resource usage of a service.")
        .with_arg(
            ArgSpec::required("service_name", ArgKind::String)
                .with_description("The unique identifier or name of the service to check."),
        ),
        OperationContract::new("restart_service", Arc::new(RestartService { simulate_latency }))
            .with_description("Initiates a restart sequence for a service.")
            .with_arg(
                ArgSpec::required("service_name", ArgKind::String)
                    .with_description("The unique identifier or name of the service to restart."),
            )
            .with_arg(
                ArgSpec::optional("force", ArgKind::Boolean, false)
                    .with_description("Hard restart (kill and start) instead of a graceful one."),
            ),
        OperationContract::new("scale_cluster", Arc::new(ScaleCluster { simulate_latency }))
            .with_description("Scales a cluster to the desired number of replicas.")
            .with_arg(
                ArgSpec::required("cluster_id", ArgKind::String)
                    .with_description("The unique identifier of the cluster to scale."),
            )
            .with_arg(
                ArgSpec::required("replicas", ArgKind::Integer)
                    .with_description("The target number of replicas. Must be non-negative."),
            ),
    ]
}

/// Builds the closed registry of built-in net-ops operations.
pub fn netops_registry(simulate_latency: bool) -> Result<ToolbeltRegistry, RegistryError> {
    ToolbeltRegistry::from_manifest(netops_manifest(simulate_latency))
}
