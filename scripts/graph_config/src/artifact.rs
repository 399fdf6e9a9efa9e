use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bookkeeping files written by migration tooling; never real contract artifacts.
pub const MIGRATIONS_SUFFIX: &str = ".migrations.json";

const RAW_SECURITY_CONTACT_KEY: &str = "custom:security-contact";
const SECURITY_CONTACT_KEY: &str = "securityContact";

/// One persisted contract deployment: address, transaction receipt and
/// whatever else the deployment tooling recorded alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub address: String,
    pub receipt: Receipt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devdoc: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Artifact {
    /// Folds the `custom:security-contact` devdoc tag into the conventional
    /// `securityContact` field, dropping the raw key.
    fn normalize_devdoc(&mut self) {
        if let Some(devdoc) = self.devdoc.as_mut() {
            if let Some(contact) = devdoc.remove(RAW_SECURITY_CONTACT_KEY) {
                devdoc.insert(SECURITY_CONTACT_KEY.to_string(), contact);
            }
        }
    }
}

/// An artifact together with its logical contract name (the filename with the
/// `.json` extension stripped).
#[derive(Debug, Clone)]
pub struct DeployedContract {
    pub name: String,
    pub artifact: Artifact,
}

/// Loads every contract artifact in a network's deployment directory,
/// skipping migration bookkeeping files. Filenames are sorted so iteration
/// order is stable across platforms.
pub fn load_artifacts(dir: &Path) -> Result<Vec<DeployedContract>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read deployment directory {}", dir.display()))?
        .map(|entry| Ok(entry?.path()))
        .collect::<Result<_>>()?;
    paths.sort();

    let mut contracts = Vec::new();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if file_name.ends_with(MIGRATIONS_SUFFIX) {
            continue;
        }
        let Some(name) = file_name.strip_suffix(".json") else {
            continue;
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let mut artifact: Artifact = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse artifact {}", path.display()))?;
        artifact.normalize_devdoc();
        contracts.push(DeployedContract {
            name: name.to_string(),
            artifact,
        });
    }
    Ok(contracts)
}

/// Records a deployment artifact under `<deployments_dir>/<network>/<name>.json`,
/// creating the network directory on first use.
pub fn write_artifact(
    deployments_dir: &Path,
    network: &str,
    name: &str,
    artifact: &Artifact,
) -> Result<PathBuf> {
    let dir = deployments_dir.join(network);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create deployment directory {}", dir.display()))?;
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, serde_json::to_string_pretty(artifact)?)
        .with_context(|| format!("failed to write artifact {}", path.display()))?;
    Ok(path)
}
