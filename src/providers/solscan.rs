//! Primary Solana explorer client (Solscan)
//!
//! Solscan lists account transactions newest-first; the earliest entry in
//! the window is treated as the funding transaction and its first signer as
//! the funder. No amount can be derived from this endpoint, so the hop
//! amount is always zero.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use super::{FunderProvider, ProviderError, ProviderId};
use crate::types::{ChainId, ProviderAnswer};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

const SOLSCAN_URL: &str = "https://public-api.solscan.io/account/transactions";
const WINDOW: u32 = 5;

#[derive(Debug, Deserialize)]
pub(crate) struct SolscanTx {
    #[serde(default)]
    pub signer: Vec<String>,
}

pub struct SolscanClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SolscanClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl FunderProvider for SolscanClient {
    fn id(&self) -> ProviderId {
        ProviderId::Solscan
    }

    async fn query_funder(
        &self,
        _chain: ChainId,
        address: &str,
    ) -> Result<ProviderAnswer, ProviderError> {
        let limit = WINDOW.to_string();
        let mut request = self
            .client
            .get(SOLSCAN_URL)
            .query(&[("account", address), ("limit", limit.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header("token", key);
        }

        let txs: Vec<SolscanTx> = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let signer = earliest_signer(&txs)?;
        Ok(ProviderAnswer::Funder {
            address: signer,
            amount: Decimal::ZERO,
        })
    }
}

/// First signer of the earliest (last-listed) transaction. An empty window
/// or a transaction without signers is a provider failure, not a clean miss.
pub(crate) fn earliest_signer(txs: &[SolscanTx]) -> Result<String, ProviderError> {
    let earliest = txs
        .last()
        .ok_or_else(|| ProviderError::Payload("empty transaction list".into()))?;
    earliest
        .signer
        .first()
        .cloned()
        .ok_or_else(|| ProviderError::Payload("missing signer field".into()))
}
