//! Configuration management
//! Load settings from .env file / process environment

use crate::types::ChainId;
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

// Built-in discovery defaults for Base (the only chain shipped with them).
// Other EVM chains must be configured explicitly before they can be enabled.
const BASE_RPC_URL: &str = "https://base.llamarpc.com";
const BASE_FACTORY: &str = "0xFDa619b6d20975be80A10332cD39b9a4b0FAa8BB"; // BaseSwap
const BASE_PAIR_TOPIC: &str =
    "0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9"; // PairCreated

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub database_path: String,
    pub labels_file: String,

    // Provider credentials are all optional: a missing key only matters if
    // the corresponding provider is actually exercised.
    pub blockscout_api_key: Option<String>,
    pub solscan_api_key: Option<String>,
    pub blockchair_api_key: Option<String>,

    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub request_timeout_secs: u64,

    pub chains: Vec<ChainConfig>,
}

/// Per-chain settings for one worker.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: ChainId,
    /// Assumed USD price of the chain's native token, used to convert traced
    /// hop amounts into an approximate impact figure.
    pub native_price_usd: Decimal,
    /// Log-polling discovery settings. None for chains whose discovery
    /// arrives out-of-band (Solana).
    pub discovery: Option<EvmDiscovery>,
}

#[derive(Debug, Clone)]
pub struct EvmDiscovery {
    pub rpc_url: String,
    pub factory_address: String,
    pub pair_created_topic: String,
}

/// Parse a comma-separated chain list (CLI flag or CHAINS env var).
/// Order is preserved, duplicates are dropped.
pub fn parse_chain_list(s: &str) -> Result<Vec<ChainId>> {
    let mut chains: Vec<ChainId> = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match ChainId::parse(part) {
            Some(chain) => {
                if !chains.contains(&chain) {
                    chains.push(chain);
                }
            }
            None => bail!(
                "Unsupported chain: '{}'. Supported: base, ethereum, bsc, solana",
                part
            ),
        }
    }
    if chains.is_empty() {
        bail!("No chains enabled");
    }
    Ok(chains)
}

pub fn load_config(chains: &[ChainId]) -> Result<BotConfig> {
    dotenv::dotenv().ok();

    let mut chain_configs = Vec::with_capacity(chains.len());
    for &chain in chains {
        chain_configs.push(load_chain_config(chain)?);
    }

    Ok(BotConfig {
        database_path: env_or("DATABASE_PATH", "suspects.db"),
        labels_file: env_or("LABELS_FILE", "labels.json"),
        blockscout_api_key: std::env::var("BLOCKSCOUT_API_KEY").ok(),
        solscan_api_key: std::env::var("SOLSCAN_API_KEY").ok(),
        blockchair_api_key: std::env::var("BLOCKCHAIR_API_KEY").ok(),
        poll_interval_secs: env_u64("POLL_INTERVAL_SECS", 5)?,
        error_backoff_secs: env_u64("ERROR_BACKOFF_SECS", 10)?,
        request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 10)?,
        chains: chain_configs,
    })
}

fn load_chain_config(chain: ChainId) -> Result<ChainConfig> {
    let prefix = chain.as_str().to_uppercase();

    let native_price_usd = match std::env::var(format!("{}_NATIVE_PRICE_USD", prefix)) {
        Ok(v) => Decimal::from_str(&v)
            .with_context(|| format!("Invalid {}_NATIVE_PRICE_USD: '{}'", prefix, v))?,
        Err(_) => default_native_price(chain),
    };

    let discovery = if chain.is_evm() {
        Some(load_evm_discovery(chain, &prefix)?)
    } else {
        None
    };

    Ok(ChainConfig {
        chain,
        native_price_usd,
        discovery,
    })
}

fn load_evm_discovery(chain: ChainId, prefix: &str) -> Result<EvmDiscovery> {
    let rpc_url = match std::env::var(format!("{}_RPC_URL", prefix)) {
        Ok(v) => v,
        Err(_) if chain == ChainId::Base => BASE_RPC_URL.to_string(),
        Err(_) => bail!(
            "{}_RPC_URL not set but chain '{}' is enabled",
            prefix,
            chain.as_str()
        ),
    };

    let factory_address = match std::env::var(format!("{}_FACTORY", prefix)) {
        Ok(v) => v,
        Err(_) if chain == ChainId::Base => BASE_FACTORY.to_string(),
        Err(_) => bail!(
            "{}_FACTORY not set but chain '{}' is enabled",
            prefix,
            chain.as_str()
        ),
    };

    // The PairCreated signature is shared by Uniswap V2 forks, so the Base
    // default topic is a usable fallback everywhere.
    let pair_created_topic = env_or(&format!("{}_PAIR_TOPIC", prefix), BASE_PAIR_TOPIC);

    Ok(EvmDiscovery {
        rpc_url,
        factory_address,
        pair_created_topic,
    })
}

fn default_native_price(chain: ChainId) -> Decimal {
    match chain {
        ChainId::Base | ChainId::Ethereum => Decimal::from(2500),
        ChainId::Bsc => Decimal::from(600),
        ChainId::Solana => Decimal::from(150),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", key, v)),
        Err(_) => Ok(default),
    }
}
