use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "graph-config")]
#[command(about = "Generate a subgraph config from the deployment artifacts of a network")]
struct Args {
    /// Network whose deployment artifacts feed the config
    #[arg(long, env = "NETWORK")]
    network: String,

    /// Directory holding per-network deployment artifacts
    #[arg(long, default_value = "deployments")]
    deployments_dir: PathBuf,

    /// Hand-authored template the live values are merged into
    #[arg(long, default_value = "subgraph.config.template.json")]
    template: PathBuf,

    /// Where the resolved config is written
    #[arg(long, default_value = "subgraph.config.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    graph_config::generate(
        &args.network,
        &args.deployments_dir,
        &args.template,
        &args.output,
    )
}
