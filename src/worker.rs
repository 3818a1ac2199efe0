//! Per-chain worker loops
//!
//! One long-lived task per chain: discover new tokens, trace the deployer's
//! funding source, record the sighting. Events are processed sequentially
//! within a chain; chains never block each other. An iteration error is
//! logged and followed by a longer backoff sleep, so a single bad event
//! never terminates the worker.
//!
//! Author: AI-Generated
//! Created: 2026-08-02
//! Modified: 2026-08-05 - Ledger outcome logging per upsert result

use crate::config::{BotConfig, ChainConfig, EvmDiscovery};
use crate::discovery::EvmLogPoller;
use crate::ledger::{Sighting, SuspectLedger, UpsertOutcome};
use crate::tracer::AncestorTracer;
use crate::types::TokenDeployment;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Idle heartbeat for chains whose discovery arrives out-of-band.
const IDLE_SLEEP_SECS: u64 = 30;

pub struct ChainWorker {
    cfg: ChainConfig,
    poll_interval: Duration,
    error_backoff: Duration,
    tracer: Arc<AncestorTracer>,
    ledger: Arc<SuspectLedger>,
    client: reqwest::Client,
}

impl ChainWorker {
    pub fn new(
        cfg: ChainConfig,
        bot: &BotConfig,
        tracer: Arc<AncestorTracer>,
        ledger: Arc<SuspectLedger>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            cfg,
            poll_interval: Duration::from_secs(bot.poll_interval_secs),
            error_backoff: Duration::from_secs(bot.error_backoff_secs),
            tracer,
            ledger,
            client,
        }
    }

    pub async fn run(self) {
        info!(chain = self.cfg.chain.as_str(), "worker started");
        match self.cfg.discovery.clone() {
            Some(discovery) => self.run_evm(discovery).await,
            None => self.run_idle().await,
        }
    }

    async fn run_evm(&self, discovery: EvmDiscovery) {
        let mut poller = EvmLogPoller::new(self.client.clone(), self.cfg.chain, discovery);
        loop {
            match poller.poll().await {
                Ok(events) => {
                    for event in events {
                        self.handle_deployment(&event).await;
                    }
                    sleep(self.poll_interval).await;
                }
                Err(e) => {
                    error!(
                        chain = self.cfg.chain.as_str(),
                        "discovery iteration failed: {:#}", e
                    );
                    sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// Trace one deployment and record the sighting. Ledger trouble is
    /// logged and the event still counts as delivered: writes are
    /// best-effort, not a durability-guaranteed path.
    async fn handle_deployment(&self, event: &TokenDeployment) {
        info!(
            chain = event.chain.as_str(),
            token = %event.token,
            deployer = %event.deployer,
            "new token deployment"
        );

        let result = self.tracer.trace(event.chain, &event.deployer, 1).await;
        let sighting = Sighting {
            impact_usd: result.impact.to_usd(self.cfg.native_price_usd),
            funder: result.funder,
            chain: event.chain,
            evidence_link: event.evidence_link.clone(),
        };

        match self.ledger.upsert(&sighting) {
            Ok(UpsertOutcome::Inserted) => info!(
                chain = event.chain.as_str(),
                funder = %sighting.funder.address,
                status = %sighting.funder.name,
                "new suspect recorded"
            ),
            Ok(UpsertOutcome::Escalated) => warn!(
                chain = event.chain.as_str(),
                funder = %sighting.funder.address,
                "repeat funder escalated to serial scammer"
            ),
            Ok(UpsertOutcome::SkippedSafe) => info!(
                chain = event.chain.as_str(),
                funder = %sighting.funder.address,
                entity = %sighting.funder.name,
                "funder is known safe infrastructure — not recorded"
            ),
            Err(e) => error!(
                chain = event.chain.as_str(),
                funder = %sighting.funder.address,
                "ledger write failed, event dropped: {:#}", e
            ),
        }
    }

    /// Solana new-token discovery arrives via webhook infrastructure in
    /// production; this keeps the task alive without hammering any RPC.
    async fn run_idle(&self) {
        loop {
            sleep(Duration::from_secs(IDLE_SLEEP_SECS)).await;
        }
    }
}
