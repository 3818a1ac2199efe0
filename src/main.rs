//! Funding-Source Tracer Bot
//!
//! Main entry point. Watches several chains for newly deployed tokens,
//! traces the wallet that financed each deployer back to the first
//! recognizable entity, classifies it against a known-entity whitelist, and
//! keeps a risk-scored suspect ledger for downstream alerting.
//!
//! Architecture:
//! - One worker task per enabled chain (discover → trace → record)
//! - Shared circuit breaker picks primary vs backup data providers
//! - Whitelist degrades to empty on load failure; the bot keeps running
//! - SQLite ledger with an escalating, idempotent upsert per funder
//!
//! Author: AI-Generated
//! Created: 2026-07-28
//! Modified: 2026-08-01 - Multi-chain: --chains CLI arg, per-chain env config
//! Modified: 2026-08-04 - Shared reqwest client with a single request timeout

use anyhow::Result;
use clap::Parser;
use fundtrace_bot::config;
use fundtrace_bot::ledger::SuspectLedger;
use fundtrace_bot::providers::{
    BlockchairClient, BlockscoutClient, ProviderBreaker, SolscanClient,
};
use fundtrace_bot::tracer::AncestorTracer;
use fundtrace_bot::whitelist::WhitelistIndex;
use fundtrace_bot::worker::ChainWorker;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

/// Funding-Source Tracer Bot - Multi-Chain (Base, Ethereum, BSC, Solana)
#[derive(Parser)]
#[command(name = "fundtrace-bot")]
struct Args {
    /// Comma-separated chains to watch (base, ethereum, bsc, solana)
    #[arg(short, long, env = "CHAINS", default_value = "base")]
    chains: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // .env must be in place before clap resolves env-backed args
    dotenv::dotenv().ok();

    let args = Args::parse();
    let chains = config::parse_chain_list(&args.chains)?;
    info!(
        "Funding tracer starting — chains: {}",
        chains
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let cfg = config::load_config(&chains)?;
    info!(
        "Configuration loaded (db: {}, poll: {}s, backoff: {}s)",
        cfg.database_path, cfg.poll_interval_secs, cfg.error_backoff_secs
    );

    let whitelist = Arc::new(WhitelistIndex::load_or_empty(&cfg.labels_file));
    let ledger = Arc::new(SuspectLedger::open(&cfg.database_path)?);
    info!("Suspect ledger ready: {} known suspects", ledger.count()?);

    // One client for every provider and the discovery RPC: bounded
    // per-request timeout keeps a slow upstream from stalling a worker
    // beyond one iteration.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()?;

    let breaker = Arc::new(ProviderBreaker::new());
    let tracer = Arc::new(AncestorTracer::new(
        whitelist,
        breaker,
        Arc::new(BlockscoutClient::new(
            client.clone(),
            cfg.blockscout_api_key.clone(),
        )),
        Arc::new(SolscanClient::new(
            client.clone(),
            cfg.solscan_api_key.clone(),
        )),
        Arc::new(BlockchairClient::new(
            client.clone(),
            cfg.blockchair_api_key.clone(),
        )),
    ));

    let mut handles = Vec::new();
    for chain_cfg in cfg.chains.clone() {
        let worker = ChainWorker::new(
            chain_cfg,
            &cfg,
            Arc::clone(&tracer),
            Arc::clone(&ledger),
            client.clone(),
        );
        handles.push(tokio::spawn(worker.run()));
    }

    info!("All workers running");
    join_all(handles).await;
    Ok(())
}
