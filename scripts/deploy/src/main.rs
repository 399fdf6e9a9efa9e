mod explorer;
mod verify;

use std::{env, fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::{
    abi::{Abi, Token},
    contract::ContractFactory,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Bytes,
    utils::to_checksum,
};
use graph_config::artifact::{write_artifact, Artifact, Receipt};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use explorer::ExplorerSupport;

const CONTRACT_NAME: &str = "SoulboundToken";

// Fixed constructor arguments for this collection.
const COLLECTION_NAME: &str = "Goushuin";
const COLLECTION_SYMBOL: &str = "GSOUL";
// TODO: make the base URI dynamic once the collection metadata is pinned per network
const BASE_TOKEN_URI: &str = "ipfs://QmXiwK9nn4ufrS4fojftqpaFCrKiFrNkxNrr3AbvbsHV2X/";

#[derive(Parser, Debug)]
#[command(name = "deploy")]
#[command(about = "Deploy the SoulboundToken contract and verify its source")]
struct Args {
    /// Network to deploy to
    #[arg(long, env = "NETWORK")]
    network: String,

    /// RPC URL (overrides the <NETWORK>_RPC_URL and RPC_URL env vars)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Compiled contract record (ABI, bytecode, compiler metadata)
    #[arg(long, default_value = "artifacts/SoulboundToken.json")]
    contract_artifact: PathBuf,

    /// Directory the deployment artifact is recorded under
    #[arg(long, default_value = "deployments")]
    deployments_dir: PathBuf,

    /// API key for the Etherscan verification pathway
    #[arg(long, env = "ETHERSCAN_API_KEY")]
    etherscan_api_key: Option<String>,

    /// Grace period before the Etherscan submission, so its indexer can catch up
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    verify_delay: Duration,
}

/// The compiler output for the contract, as written by the build step.
#[derive(Debug, Deserialize)]
struct CompiledContract {
    abi: Abi,
    bytecode: Bytes,
    #[serde(default)]
    metadata: Option<String>,
    #[serde(default)]
    devdoc: Option<Map<String, Value>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let Ok(private_key) = env::var("PRIVATE_KEY") else {
        bail!(
            "the node you are deploying to does not have access to a private key to sign this \
             transaction; set PRIVATE_KEY in your .env to deploy"
        );
    };

    let rpc_url = resolve_rpc_url(&args.network, args.rpc_url.clone(), |key| {
        env::var(key).ok()
    })?;
    tracing::info!("using RPC URL {rpc_url}");
    let provider: Provider<Http> = Provider::try_from(rpc_url.as_str())?;

    let wallet: LocalWallet = private_key
        .trim_start_matches("0x")
        .parse()
        .context("PRIVATE_KEY is not a valid private key")?;
    tracing::info!("deployer address: {:?}", wallet.address());

    let chain_id = provider.get_chainid().await?.as_u64();
    let signer = Arc::new(SignerMiddleware::new(
        provider.clone(),
        wallet.with_chain_id(chain_id),
    ));

    let raw = fs::read_to_string(&args.contract_artifact).with_context(|| {
        format!(
            "failed to read compiled contract record {}",
            args.contract_artifact.display()
        )
    })?;
    let compiled: CompiledContract = serde_json::from_str(&raw).with_context(|| {
        format!(
            "failed to parse compiled contract record {}",
            args.contract_artifact.display()
        )
    })?;

    tracing::info!("deploying {CONTRACT_NAME} to {}", args.network);
    let factory = ContractFactory::new(
        compiled.abi.clone(),
        compiled.bytecode.clone(),
        signer.clone(),
    );
    let deployer = factory.deploy((
        COLLECTION_NAME.to_string(),
        COLLECTION_SYMBOL.to_string(),
        BASE_TOKEN_URI.to_string(),
    ))?;
    let (contract, receipt) = deployer.send_with_receipt().await?;

    let address = to_checksum(&contract.address(), None);
    let block_number = receipt.block_number.unwrap_or_default().as_u64();
    tracing::info!("{CONTRACT_NAME} deployed at {address} in block {block_number}");

    let artifact = Artifact {
        address: address.clone(),
        receipt: Receipt {
            block_number,
            transaction_hash: Some(format!("{:?}", receipt.transaction_hash)),
            extra: Map::new(),
        },
        devdoc: compiled.devdoc.clone(),
        extra: Map::new(),
    };
    let artifact_path = write_artifact(
        &args.deployments_dir,
        &args.network,
        CONTRACT_NAME,
        &artifact,
    )?;
    tracing::info!("deployment artifact recorded at {}", artifact_path.display());

    match explorer::explorer_support(chain_id) {
        ExplorerSupport::Unsupported => {
            tracing::debug!("no block explorer for chain id {chain_id}, skipping verification");
        }
        ExplorerSupport::Supported(explorer) => {
            let http = reqwest::Client::new();
            verify::sourcify_verify(&http, chain_id, &address, compiled.metadata.as_deref())
                .await?;

            match &args.etherscan_api_key {
                None => tracing::warn!(
                    "you have not set your Etherscan API key in your .env file; set \
                     ETHERSCAN_API_KEY and run `deploy --network {}` to verify on {}",
                    args.network,
                    explorer.chain
                ),
                Some(api_key) => {
                    tracing::info!(
                        "waiting {} for the {} indexer to catch up",
                        humantime::format_duration(args.verify_delay),
                        explorer.chain
                    );
                    tokio::time::sleep(args.verify_delay).await;
                    verify::etherscan_verify(
                        &http,
                        explorer,
                        api_key,
                        &address,
                        CONTRACT_NAME,
                        compiled.metadata.as_deref(),
                        &constructor_args_hex(),
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}

/// RPC URL resolution order: the explicit flag, then `<NETWORK>_RPC_URL`,
/// then the plain `RPC_URL` fallback.
fn resolve_rpc_url(
    network: &str,
    flag: Option<String>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(url) = flag {
        return Ok(url);
    }
    let network_var = format!("{}_RPC_URL", network.to_uppercase().replace('-', "_"));
    if let Some(url) = var(&network_var) {
        return Ok(url);
    }
    if let Some(url) = var("RPC_URL") {
        return Ok(url);
    }
    bail!("no RPC URL for network {network}; pass --rpc-url or set {network_var} or RPC_URL")
}

/// ABI-encodes the fixed constructor tuple, hex-encoded the way the explorer
/// verification endpoint expects it.
fn constructor_args_hex() -> String {
    let encoded = ethers::abi::encode(&[
        Token::String(COLLECTION_NAME.to_string()),
        Token::String(COLLECTION_SYMBOL.to_string()),
        Token::String(BASE_TOKEN_URI.to_string()),
    ]);
    hex::encode(encoded)
}
