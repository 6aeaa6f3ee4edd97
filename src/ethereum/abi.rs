use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ContractError;

/// One parameter of an ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

fn default_entry_type() -> String {
    "function".to_string()
}

/// One entry of a contract ABI. Fields this crate does not use
/// (`stateMutability`, `anonymous`, ...) are ignored on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
}

impl AbiEntry {
    pub fn is_event(&self) -> bool {
        self.entry_type == "event"
    }
}

/// Compiled contract: parsed ABI plus creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDefinition {
    abi: Vec<AbiEntry>,
    bytecode: String,
}

impl ContractDefinition {
    /// Builds a definition from the ABI as a JSON string.
    pub fn new(abi_json: &str, bytecode: impl Into<String>) -> Result<Self, ContractError> {
        let abi = serde_json::from_str(abi_json).map_err(ContractError::InvalidAbi)?;
        Ok(Self::from_parts(abi, bytecode))
    }

    pub fn from_parts(abi: Vec<AbiEntry>, bytecode: impl Into<String>) -> Self {
        Self {
            abi,
            bytecode: bytecode.into(),
        }
    }

    /// Reads compiler output of the shape `{ "interface": ..., "bytecode": ... }`.
    ///
    /// `interface` may hold the ABI either as a JSON string or inline; `abi` is
    /// accepted as an alias.
    pub fn from_artifact_json(artifact: &str) -> Result<Self, ContractError> {
        let artifact: Value = serde_json::from_str(artifact)
            .map_err(|e| ContractError::InvalidArtifact(e.to_string()))?;

        let interface = artifact
            .get("interface")
            .or_else(|| artifact.get("abi"))
            .ok_or_else(|| ContractError::InvalidArtifact("missing 'interface'".to_string()))?;

        let abi: Vec<AbiEntry> = match interface {
            Value::String(abi_json) => {
                serde_json::from_str(abi_json).map_err(ContractError::InvalidAbi)?
            }
            other => serde_json::from_value(other.clone()).map_err(ContractError::InvalidAbi)?,
        };

        let bytecode = artifact
            .get("bytecode")
            .and_then(Value::as_str)
            .ok_or_else(|| ContractError::InvalidArtifact("missing 'bytecode'".to_string()))?;

        Ok(Self::from_parts(abi, bytecode))
    }

    pub fn abi(&self) -> &[AbiEntry] {
        &self.abi
    }

    pub fn bytecode(&self) -> &str {
        &self.bytecode
    }

    /// Finds the callable entry whose `name` or `type` equals `method`.
    ///
    /// Events never match. Several matches (overloads) are rejected.
    pub fn resolve_method(&self, method: &str) -> Result<Option<&AbiEntry>, ContractError> {
        let mut matches = self
            .abi
            .iter()
            .filter(|entry| !entry.is_event())
            .filter(|entry| entry.name == method || entry.entry_type == method);

        let first = matches.next();
        let extra = matches.count();
        if extra > 0 {
            return Err(ContractError::AmbiguousMethod {
                method: method.to_string(),
                count: extra + 1,
            });
        }

        Ok(first)
    }
}
