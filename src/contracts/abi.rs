use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use alloy::json_abi::{Constructor, JsonAbi};
use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One compiled contract: JSON ABI plus creation bytecode. Immutable once
/// loaded.
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct RawArtifact {
    #[serde(default)]
    abi: JsonAbi,
    bytecode: Bytes,
}

/// The compiled-contracts input document: contract name → {abi, bytecode},
/// produced upstream by the compiler step.
#[derive(Clone, Debug, Default)]
pub struct Contracts {
    by_name: BTreeMap<String, ContractArtifact>,
}

impl Contracts {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawArtifact> = serde_json::from_str(json)?;
        let by_name = raw
            .into_iter()
            .map(|(name, artifact)| {
                let artifact = ContractArtifact {
                    name: name.clone(),
                    abi: artifact.abi,
                    bytecode: artifact.bytecode,
                };
                (name, artifact)
            })
            .collect();
        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Result<&ContractArtifact> {
        self.by_name
            .get(name)
            .ok_or_else(|| Error::UnknownContract(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
