use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::explorer::Explorer;

const SOURCIFY_URL: &str = "https://sourcify.dev/server/verify";

/// Submits the contract's compiler metadata to the Sourcify registry. Sourcify
/// resolves the sources referenced by the metadata itself, so the metadata
/// blob is all it needs.
pub async fn sourcify_verify(
    http: &reqwest::Client,
    chain_id: u64,
    address: &str,
    metadata: Option<&str>,
) -> Result<()> {
    let Some(metadata) = metadata else {
        bail!("the compiled contract record carries no compiler metadata, cannot verify with Sourcify");
    };
    let body = json!({
        "address": address,
        "chain": chain_id.to_string(),
        "files": { "metadata.json": metadata },
    });

    let response = http
        .post(SOURCIFY_URL)
        .json(&body)
        .send()
        .await
        .context("sourcify verification request failed")?;
    let status = response.status();
    let payload = response
        .text()
        .await
        .context("sourcify verification response was unreadable")?;
    if !status.is_success() {
        bail!("sourcify verification failed with status {status}: {payload}");
    }
    tracing::info!("sourcify verification submitted for {address}: {payload}");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    result: String,
}

/// Submits a standard-JSON-input verification request to the chain's
/// Etherscan-family explorer.
pub async fn etherscan_verify(
    http: &reqwest::Client,
    explorer: &Explorer,
    api_key: &str,
    address: &str,
    contract_name: &str,
    metadata: Option<&str>,
    constructor_args: &str,
) -> Result<()> {
    let Some(metadata) = metadata else {
        bail!(
            "the compiled contract record carries no compiler metadata, cannot verify on {}",
            explorer.chain
        );
    };
    let (source, compiler_version, fully_qualified_name) =
        standard_json_input(metadata, contract_name)?;

    let form = [
        ("apikey", api_key),
        ("module", "contract"),
        ("action", "verifysourcecode"),
        ("contractaddress", address),
        ("codeformat", "solidity-standard-json-input"),
        ("sourceCode", source.as_str()),
        ("contractname", fully_qualified_name.as_str()),
        ("compilerversion", compiler_version.as_str()),
        // the misspelling is part of the Etherscan API
        ("constructorArguements", constructor_args),
    ];
    let response = http
        .post(explorer.api_url)
        .form(&form)
        .send()
        .await
        .with_context(|| format!("verification request to {} failed", explorer.api_url))?;
    let payload: EtherscanResponse = response
        .json()
        .await
        .with_context(|| format!("{} returned a malformed verification response", explorer.chain))?;
    if payload.status != "1" {
        bail!(
            "verification on {} was rejected: {}",
            explorer.chain,
            payload.result
        );
    }
    tracing::info!(
        "verification submitted on {}, request id {}; see {}/address/{address}#code",
        explorer.chain,
        payload.result,
        explorer.browser_url
    );
    Ok(())
}

/// Rebuilds a solc standard-JSON input from the compiler metadata embedded in
/// the compiled contract record. Returns the input, the compiler version and
/// the fully qualified contract name Etherscan expects.
fn standard_json_input(metadata: &str, contract_name: &str) -> Result<(String, String, String)> {
    let metadata: Value =
        serde_json::from_str(metadata).context("compiler metadata is not valid JSON")?;
    let sources = metadata
        .get("sources")
        .cloned()
        .ok_or_else(|| anyhow!("compiler metadata lists no sources"))?;

    // compilationTarget maps a source path to the contract it defines; the
    // explorer wants them joined as "path:Name".
    let fully_qualified_name = metadata
        .pointer("/settings/compilationTarget")
        .and_then(Value::as_object)
        .and_then(|targets| {
            targets
                .iter()
                .find(|(_, name)| name.as_str() == Some(contract_name))
                .map(|(path, _)| format!("{path}:{contract_name}"))
        })
        .unwrap_or_else(|| contract_name.to_string());

    let mut settings = json!({
        "optimizer": metadata
            .pointer("/settings/optimizer")
            .cloned()
            .unwrap_or_else(|| json!({ "enabled": false })),
    });
    if let Some(evm_version) = metadata.pointer("/settings/evmVersion") {
        settings["evmVersion"] = evm_version.clone();
    }

    let input = json!({
        "language": metadata.get("language").cloned().unwrap_or_else(|| json!("Solidity")),
        "sources": sources,
        "settings": settings,
    });

    let version = metadata
        .pointer("/compiler/version")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("compiler metadata names no compiler version"))?;
    let compiler_version = if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    };

    Ok((input.to_string(), compiler_version, fully_qualified_name))
}
