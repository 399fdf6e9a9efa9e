pub mod artifact;
pub mod config;

use std::path::Path;

use anyhow::{bail, Result};
use indexmap::IndexMap;

use artifact::DeployedContract;
use config::{Datasource, SubgraphConfig};

/// Overwrites each datasource's address and start block from the matching
/// deployment artifact. Matching is by exact name; contracts without a
/// template entry are reported and skipped, and no entry is ever added or
/// removed. The rebuild goes through an insertion-ordered map, so the
/// template's datasource order is preserved.
pub fn merge_datasources(config: &mut SubgraphConfig, contracts: &[DeployedContract]) {
    let mut datasources: IndexMap<String, Datasource> = config
        .datasources
        .drain(..)
        .map(|datasource| (datasource.name.clone(), datasource))
        .collect();

    for contract in contracts {
        match datasources.get_mut(&contract.name) {
            None => tracing::warn!(
                "no datasource found for {}, add an entry to subgraph.config.template.json with \
                 the name field set to the name of the contract artifact in the deployments folder",
                contract.name
            ),
            Some(datasource) => {
                tracing::info!("updating address and start block for {}", contract.name);
                datasource.address = contract.artifact.address.clone();
                datasource.start_block = contract.artifact.receipt.block_number;
            }
        }
    }

    config.datasources = datasources.into_values().collect();
}

/// Produces the resolved subgraph config for a network from its deployment
/// artifacts and the template. The output write is the last step, so a
/// failure anywhere earlier leaves no partial file behind.
pub fn generate(network: &str, deployments_dir: &Path, template: &Path, output: &Path) -> Result<()> {
    let network_dir = deployments_dir.join(network);
    if !network_dir.exists() {
        bail!("no deployment on network {network} found");
    }
    tracing::info!("updating the subgraph config for this smart contract set on network {network}");

    let contracts = artifact::load_artifacts(&network_dir)?;
    let mut config = SubgraphConfig::load(template)?;
    merge_datasources(&mut config, &contracts);
    config.chain = network.to_string();
    config.write(output)?;

    tracing::info!("done generating the subgraph config for network {network}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::tempdir;

    fn write_json(path: &Path, value: &Value) {
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    fn token_template() -> Value {
        json!({
            "output": "generated/subgraph.yaml",
            "chain": "localhost",
            "datasources": [
                { "name": "Token", "address": "0x0", "startBlock": 0, "module": ["token"] }
            ]
        })
    }

    fn token_artifact(address: &str, block_number: u64) -> Value {
        json!({
            "address": address,
            "receipt": { "blockNumber": block_number, "transactionHash": "0xdead" },
            "abi": []
        })
    }

    fn run(dir: &Path, network: &str) -> Result<Value> {
        generate(
            network,
            &dir.join("deployments"),
            &dir.join("subgraph.config.template.json"),
            &dir.join("subgraph.config.json"),
        )?;
        let raw = fs::read_to_string(dir.join("subgraph.config.json")).unwrap();
        Ok(serde_json::from_str(&raw).unwrap())
    }

    #[test]
    fn matched_datasource_gets_live_address_and_start_block() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        write_json(&dir.path().join("subgraph.config.template.json"), &token_template());
        write_json(&network_dir.join("Token.json"), &token_artifact("0xABC", 42));

        let output = run(dir.path(), "anvil").unwrap();
        assert_eq!(output["chain"], "anvil");
        assert_eq!(
            output["datasources"],
            json!([{ "name": "Token", "address": "0xABC", "startBlock": 42, "module": ["token"] }])
        );
    }

    #[test]
    fn datasource_set_and_template_order_are_preserved() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        write_json(
            &dir.path().join("subgraph.config.template.json"),
            &json!({
                "output": "generated/subgraph.yaml",
                "chain": "localhost",
                "datasources": [
                    { "name": "Registry", "address": "0x0", "startBlock": 0, "module": ["registry"] },
                    { "name": "Token", "address": "0x0", "startBlock": 0, "module": ["token"] },
                    { "name": "Vault", "address": "0x0", "startBlock": 0, "module": ["vault"] }
                ]
            }),
        );
        write_json(&network_dir.join("Token.json"), &token_artifact("0xABC", 7));
        write_json(&network_dir.join("Orphan.json"), &token_artifact("0xFFF", 9));

        let output = run(dir.path(), "anvil").unwrap();
        let names: Vec<&str> = output["datasources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Registry", "Token", "Vault"]);
    }

    #[test]
    fn unmatched_template_entry_is_carried_through_verbatim() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        // The Vault entry carries a field this tool knows nothing about.
        let vault = json!({
            "name": "Vault",
            "address": "0x123",
            "startBlock": 5,
            "module": ["vault", "vault-events"],
            "grafting": { "base": "QmBase", "block": 3 }
        });
        write_json(
            &dir.path().join("subgraph.config.template.json"),
            &json!({
                "output": "generated/subgraph.yaml",
                "chain": "localhost",
                "datasources": [vault.clone()]
            }),
        );

        let output = run(dir.path(), "anvil").unwrap();
        assert_eq!(output["datasources"][0], vault);
    }

    #[test]
    fn migration_bookkeeping_files_never_influence_the_output() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        write_json(&dir.path().join("subgraph.config.template.json"), &token_template());
        // A valid artifact body under the migrations suffix must be skipped.
        write_json(
            &network_dir.join("Token.migrations.json"),
            &token_artifact("0xBAD", 99),
        );

        let output = run(dir.path(), "anvil").unwrap();
        assert_eq!(output["datasources"][0]["address"], "0x0");
        assert_eq!(output["datasources"][0]["startBlock"], 0);
    }

    #[test]
    fn missing_deployment_directory_fails_before_writing() {
        let dir = tempdir().unwrap();
        write_json(&dir.path().join("subgraph.config.template.json"), &token_template());

        let err = generate(
            "anvil",
            &dir.path().join("deployments"),
            &dir.path().join("subgraph.config.template.json"),
            &dir.path().join("subgraph.config.json"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no deployment on network anvil found"));
        assert!(!dir.path().join("subgraph.config.json").exists());
    }

    #[test]
    fn artifact_without_a_datasource_leaves_the_set_unchanged() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        write_json(&dir.path().join("subgraph.config.template.json"), &token_template());
        write_json(&network_dir.join("Foo.json"), &token_artifact("0xF00", 3));

        let output = run(dir.path(), "anvil").unwrap();
        let names: Vec<&str> = output["datasources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Token"]);
    }

    #[test]
    fn reruns_with_unchanged_inputs_are_byte_identical() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path().join("deployments/anvil");
        fs::create_dir_all(&network_dir).unwrap();
        write_json(&dir.path().join("subgraph.config.template.json"), &token_template());
        write_json(&network_dir.join("Token.json"), &token_artifact("0xABC", 42));

        run(dir.path(), "anvil").unwrap();
        let first = fs::read(dir.path().join("subgraph.config.json")).unwrap();
        run(dir.path(), "anvil").unwrap();
        let second = fs::read(dir.path().join("subgraph.config.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn devdoc_security_contact_tag_is_normalized() {
        let dir = tempdir().unwrap();
        let network_dir = dir.path();
        write_json(
            &network_dir.join("Token.json"),
            &json!({
                "address": "0xABC",
                "receipt": { "blockNumber": 1 },
                "devdoc": {
                    "custom:security-contact": "security@example.com",
                    "title": "A token"
                }
            }),
        );

        let contracts = artifact::load_artifacts(network_dir).unwrap();
        let devdoc = contracts[0].artifact.devdoc.as_ref().unwrap();
        assert_eq!(devdoc["securityContact"], "security@example.com");
        assert_eq!(devdoc["title"], "A token");
        assert!(!devdoc.contains_key("custom:security-contact"));
    }

    #[test]
    fn written_artifacts_round_through_the_loader() {
        let dir = tempdir().unwrap();
        let recorded = artifact::Artifact {
            address: "0xABC".to_string(),
            receipt: artifact::Receipt {
                block_number: 42,
                transaction_hash: Some("0xdead".to_string()),
                extra: Default::default(),
            },
            devdoc: None,
            extra: Default::default(),
        };
        let path = artifact::write_artifact(dir.path(), "anvil", "Token", &recorded).unwrap();
        assert!(path.ends_with("anvil/Token.json"));

        let contracts = artifact::load_artifacts(&dir.path().join("anvil")).unwrap();
        assert_eq!(contracts.len(), 1);
        assert_eq!(contracts[0].name, "Token");
        assert_eq!(contracts[0].artifact, recorded);
    }
}
