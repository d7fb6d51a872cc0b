//! Toolbelt registry: the closed set of operations the gate may execute.

use super::OperationContract;
use crate::errors::RegistryError;
use std::collections::HashMap;
use tracing::debug;

/// Registry mapping operation names to their contracts.
///
/// Registration takes `&mut self`, so once the registry is shared behind an
/// `Arc` the set of operations can no longer change.
#[derive(Default)]
pub struct ToolbeltRegistry {
    /// Registered contracts by name.
    contracts: HashMap<String, OperationContract>,
    /// Names in registration order.
    order: Vec<String>,
}

impl ToolbeltRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a fixed manifest.
    pub fn from_manifest(
        manifest: impl IntoIterator<Item = OperationContract>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for contract in manifest {
            registry.register(contract)?;
        }
        Ok(registry)
    }

    /// Registers a contract.
    ///
    /// Fails if the name is taken or if an optional argument's default
    /// would not pass validation as its declared kind.
    pub fn register(&mut self, contract: OperationContract) -> Result<(), RegistryError> {
        let name = contract.name().to_string();
        if self.contracts.contains_key(&name) {
            return Err(RegistryError::duplicate(name));
        }
        for arg in contract.args() {
            if let Some(ref default) = arg.default {
                if arg.kind.coerce(&default.to_json()).is_none() {
                    return Err(RegistryError::invalid_default(&name, &arg.name, arg.kind));
                }
            }
        }

        debug!(operation = %name, args = contract.args().len(), "Registered operation");
        self.order.push(name.clone());
        self.contracts.insert(name, contract);
        Ok(())
    }

    /// Looks up a contract by operation name.
    pub fn lookup(&self, name: &str) -> Result<&OperationContract, RegistryError> {
        self.contracts
            .get(name)
            .ok_or_else(|| RegistryError::unknown(name))
    }

    /// Checks if an operation is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Lists operation names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Iterates over contracts in registration order.
    pub fn contracts(&self) -> impl Iterator<Item = &OperationContract> {
        self.order.iter().filter_map(|n| self.contracts.get(n))
    }

    /// Returns the function declarations for every operation.
    #[must_use]
    pub fn declarations(&self) -> Vec<serde_json::Value> {
        self.contracts().map(OperationContract::declaration).collect()
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ToolbeltRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolbeltRegistry")
            .field("operations", &self.order)
            .finish()
    }
}
