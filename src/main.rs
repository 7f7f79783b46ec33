mod chain;
mod config;
mod contracts;
mod deploy;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;

use crate::chain::{
    AccountManager, Connector, DEFAULT_GAS_CEILING, EthRpc, Executor, GasConfig, PollPolicy,
    spin_until_connected,
};
use crate::config::AppConfig;
use crate::contracts::Contracts;
use crate::deploy::{ContractDeployer, DeployOptions, manifest};

#[derive(Parser, Debug)]
#[command(name = "smelter")]
#[command(about = "Deployer CLI for the Sai stablecoin contract system")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named network from the configuration to deploy to
    #[arg(long)]
    network: Option<String>,

    /// Compiled contracts input document
    #[arg(long, default_value = "out/contracts.json")]
    contracts: PathBuf,

    /// Directory receiving addresses.json and addresses.env
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Also deploy the OasisDex market and whitelist the sai/gem pair
    #[arg(long)]
    with_market: bool,

    /// Exercise the deployed system end to end after wiring
    #[arg(long)]
    smoke_test: bool,

    /// Gas ceiling applied after estimation padding
    #[arg(long)]
    gas_ceiling: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();
    }

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let (network_name, network) = config
        .get_network(cli.network.as_deref())
        .ok_or_else(|| eyre::eyre!("no configured network matches the request"))?;

    let key = network.resolve_private_key()?;
    let trimmed = key.as_str().trim();
    let signer: PrivateKeySigner = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .parse()
        .wrap_err("Failed to parse private key")?;

    let rpc: Arc<dyn EthRpc> = Arc::new(Connector::connect(&network.rpc_url).await?);
    spin_until_connected(rpc.as_ref(), &network.rpc_url, PollPolicy::default()).await?;

    let contracts = Contracts::load(&cli.contracts)
        .wrap_err_with(|| format!("Failed to load {:?}", cli.contracts))?;
    tracing::info!(
        network = %network_name,
        input = %cli.contracts.display(),
        out = %cli.out.display(),
        contracts = contracts.len(),
        sender = %signer.address(),
        "deploying"
    );

    let accounts = AccountManager::new(signer, network.chain_id);
    let gas = GasConfig {
        ceiling: cli.gas_ceiling.unwrap_or(DEFAULT_GAS_CEILING),
    };
    let executor = Arc::new(Executor::new(
        rpc.clone(),
        accounts,
        gas,
        PollPolicy::default(),
        network.gas_price,
    ));

    let options = DeployOptions {
        with_market: cli.with_market,
        smoke_test: cli.smoke_test,
        ..Default::default()
    };
    let addresses = ContractDeployer::new(executor, contracts, options)
        .deploy()
        .await?;

    let network_id = rpc.network_id().await?;
    let manifest_path = cli.out.join("addresses.json");
    manifest::persist(&manifest_path, network_id, addresses.clone())?;
    manifest::write_env(&cli.out.join("addresses.env"), &addresses)?;

    tracing::info!(
        network_id,
        manifest = %manifest_path.display(),
        roles = addresses.len(),
        "deployment complete"
    );
    Ok(())
}
