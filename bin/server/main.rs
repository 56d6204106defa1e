use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use fitstake::config::Config;
use fitstake::confirm::Confirmer;
use fitstake::query::ContestQuery;
use fitstake::registry::{EvmRegistry, Registry};
use fitstake::rpc::{ContestRpc, RpcConfig, RpcState};
use fitstake::submit::Submitter;
use fitstake::util::parse_address;

#[derive(Parser)]
#[command(name = "fitstake-server", about = "Contest staking REST service")]
struct Cli {
    #[arg(long, env = "FITSTAKE_HOST")]
    host: Option<String>,

    #[arg(long, env = "FITSTAKE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "FITSTAKE_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::parse_from_file(&cli.config)?;

    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);

    let registry = Arc::new(EvmRegistry::connect(&config.chain)?);

    // A service pointed at the wrong network would answer every read with
    // NotFound; refuse to start instead.
    match registry.chain_id().await {
        Ok(id) if id == config.chain.chain_id => {}
        Ok(id) => anyhow::bail!(
            "chain id mismatch: node reports {}, config expects {}",
            id,
            config.chain.chain_id
        ),
        Err(e) => warn!(error = %e, "could not verify chain id at startup"),
    }

    let registry: Arc<dyn Registry> = registry;
    let submitter = Submitter::from_config(registry.clone(), &config.chain)?;
    if !submitter.admin_enabled() {
        warn!("no operator secret configured; admin endpoints are disabled");
    }

    let state = RpcState {
        query: ContestQuery::new(registry.clone()),
        submitter,
        confirmer: Confirmer::new(registry),
        contract_address: parse_address(&config.chain.contract_address)?,
        gas_limit: config.chain.gas_limit,
    };

    info!(
        host = %host,
        port,
        chain = %config.chain.name,
        contract = %config.chain.contract_address,
        "starting contest service"
    );

    ContestRpc::new(RpcConfig { host, port }, state).start().await
}
