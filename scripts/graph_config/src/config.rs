use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The subgraph configuration consumed by the indexing service. The same
/// shape serves as the hand-authored template and the resolved output;
/// fields this tool does not touch are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphConfig {
    pub output: String,
    pub chain: String,
    pub datasources: Vec<Datasource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One indexing entry: points the indexer at a deployed contract's address
/// and the block its history starts at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    pub name: String,
    pub address: String,
    #[serde(rename = "startBlock")]
    pub start_block: u64,
    pub module: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubgraphConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read subgraph config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse subgraph config {}", path.display()))
    }

    /// Writes the config as 2-space-indented JSON, replacing any previous file.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write subgraph config {}", path.display()))
    }
}
