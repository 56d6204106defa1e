//! Service configuration.
//!
//! Chain settings come from a JSON config file; listener host/port are
//! overridable from the environment at the binary (see `bin/server`). The
//! operator secret is optional: without it the admin operations are disabled
//! and fail fast with `AdminNotConfigured`.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub chain: ChainConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChainConfig {
    pub name: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    /// JSON-RPC endpoint of the node fronting the registry.
    pub endpoint: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "gasLimit", default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Legacy gas price in wei; the node's estimate is used when unset.
    #[serde(rename = "gasPrice", default)]
    pub gas_price: Option<u64>,
    #[serde(rename = "requestTimeoutSecs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Operator signing key for createContest/distributeRewards. Admin
    /// operations are unavailable when absent.
    #[serde(rename = "operatorSecret", default)]
    pub operator_secret: Option<String>,
}

fn default_gas_limit() -> u64 {
    300_000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn parse_from_file(file: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("read config file {}", file.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config file {}", file.display()))
    }
}
