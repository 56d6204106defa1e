//! Command-line client for the contest registry.
//!
//! Reads go straight to the registry; `join` runs the full attempt state
//! machine with the user's own key, and `create`/`distribute` require the
//! operator secret from the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use web3::types::U256;

use fitstake::config::Config;
use fitstake::confirm::Confirmer;
use fitstake::flow::{run_join, JoinState};
use fitstake::query::ContestQuery;
use fitstake::registry::{EvmRegistry, Registry};
use fitstake::submit::Submitter;
use fitstake::types::NewContest;
use fitstake::util::{address_of, parse_address, parse_secret_key};

#[derive(Parser)]
#[command(name = "fitstake", about = "Contest staking client")]
struct Cli {
    #[arg(short = 'c', long = "config", env = "FITSTAKE_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all contests
    List,
    /// Show one contest with its participants
    Show { id: u64 },
    /// Check whether an address joined a contest
    Joined { id: u64, address: String },
    /// Join a contest, staking with your own key
    Join {
        id: u64,
        /// Hex-encoded secret key of the joining account
        #[arg(long, env = "FITSTAKE_USER_SECRET")]
        key: String,
    },
    /// Create a contest (operator key required in config)
    Create {
        name: String,
        /// Stake in wei
        stake: String,
        start: u64,
        end: u64,
        max: u32,
        min: u32,
    },
    /// Distribute rewards to three winners (operator key required)
    Distribute {
        id: u64,
        winner1: String,
        winner2: String,
        winner3: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::parse_from_file(&cli.config)?;

    let registry: Arc<dyn Registry> = Arc::new(EvmRegistry::connect(&config.chain)?);
    let query = ContestQuery::new(registry.clone());
    let submitter = Submitter::from_config(registry.clone(), &config.chain)?;
    let confirmer = Confirmer::new(registry);

    match cli.command {
        Command::List => {
            let contests = query.list().await?;
            if contests.is_empty() {
                println!("no contests");
                return Ok(());
            }
            for view in contests {
                let tag = if view.synthesized { " (synthesized)" } else { "" };
                println!(
                    "#{:<4} {:<30} stake {:>24} wei  {}/{} joined{}",
                    view.contest_id,
                    view.name,
                    view.stake_amount,
                    view.participant_count,
                    view.max_participants,
                    tag
                );
            }
        }
        Command::Show { id } => {
            let (view, participants) = query.contest(id).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            for (i, p) in participants.iter().enumerate() {
                println!("  {:>3}. {:?}", i + 1, p);
            }
        }
        Command::Joined { id, address } => {
            let address = parse_address(&address)?;
            let joined = query.joined(id, address).await?;
            println!("{}", if joined { "joined" } else { "not joined" });
        }
        Command::Join { id, key } => {
            let signer = parse_secret_key(&key)?;
            println!("joining contest {} as {:?}", id, address_of(&signer));
            match run_join(&query, &submitter, &confirmer, id, &signer).await {
                JoinState::Joined(record) => {
                    println!(
                        "joined: position {} in contest {}, tx {}",
                        record.position, record.contest_id, record.tx_hash
                    );
                }
                JoinState::PendingOrFailed { tx_hash } => {
                    println!(
                        "tx {} submitted but not yet visible; re-check membership later",
                        tx_hash
                    );
                    std::process::exit(1);
                }
                JoinState::Failed(err) => {
                    eprintln!("join failed: {}", err);
                    std::process::exit(1);
                }
                other => {
                    eprintln!("join ended in unexpected state: {}", other.name());
                    std::process::exit(1);
                }
            }
        }
        Command::Create {
            name,
            stake,
            start,
            end,
            max,
            min,
        } => {
            let stake_amount = U256::from_dec_str(&stake)
                .map_err(|_| anyhow::anyhow!("invalid stake amount: {}", stake))?;
            let created = submitter
                .create_contest(&NewContest {
                    name,
                    stake_amount,
                    start_time: start,
                    end_time: end,
                    max_participants: max,
                    min_participants: min,
                })
                .await?;
            match created.contest_id {
                Some(id) => println!("created contest {} (tx {:?})", id, created.tx_hash),
                None => println!(
                    "contest created (tx {:?}), id not found in receipt logs",
                    created.tx_hash
                ),
            }
        }
        Command::Distribute {
            id,
            winner1,
            winner2,
            winner3,
        } => {
            let winners = [
                parse_address(&winner1)?,
                parse_address(&winner2)?,
                parse_address(&winner3)?,
            ];
            let outcome = submitter.distribute_rewards(id, winners).await?;
            println!("rewards distributed (tx {:?})", outcome.tx_hash);
        }
    }

    Ok(())
}
