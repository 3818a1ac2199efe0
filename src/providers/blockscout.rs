//! Primary EVM explorer client (Blockscout)
//!
//! Answers "who funded this address" from the address's transaction list:
//! among transfers into the address, the one with the greatest value wins
//! and ties keep the explorer's first-seen order. Values arrive in wei and
//! are converted with the chain's fixed decimal exponent.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use super::{FunderProvider, ProviderError, ProviderId};
use crate::types::{ChainId, ProviderAnswer};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

fn instance_host(chain: ChainId) -> Option<&'static str> {
    match chain {
        ChainId::Base => Some("base.blockscout.com"),
        ChainId::Ethereum => Some("eth.blockscout.com"),
        ChainId::Bsc => Some("bsc.blockscout.com"),
        ChainId::Solana => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxEntry {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
}

pub struct BlockscoutClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl BlockscoutClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn url(&self, host: &str, address: &str) -> String {
        let mut url = format!(
            "https://{}/api?module=account&action=txlist&address={}&sort=asc&page=1&offset=10",
            host, address
        );
        if let Some(key) = &self.api_key {
            url.push_str("&apikey=");
            url.push_str(key);
        }
        url
    }
}

#[async_trait]
impl FunderProvider for BlockscoutClient {
    fn id(&self) -> ProviderId {
        ProviderId::Blockscout
    }

    async fn query_funder(
        &self,
        chain: ChainId,
        address: &str,
    ) -> Result<ProviderAnswer, ProviderError> {
        let host = instance_host(chain).ok_or_else(|| {
            ProviderError::Payload(format!("no explorer instance for chain {}", chain))
        })?;

        let body: serde_json::Value = self
            .client
            .get(self.url(host, address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let txs = parse_txlist(&body)?;
        match select_funder(&txs, address, chain.native_decimals()) {
            Some((funder, amount)) => Ok(ProviderAnswer::Funder {
                address: funder,
                amount,
            }),
            None => Ok(ProviderAnswer::NoCandidate),
        }
    }
}

/// The `result` field must be a non-empty array to count as a usable
/// response. Blockscout reports rate limits and errors as a string in the
/// same field, which is a provider failure, not an empty account.
pub(crate) fn parse_txlist(body: &serde_json::Value) -> Result<Vec<TxEntry>, ProviderError> {
    let result = body
        .get("result")
        .ok_or_else(|| ProviderError::Payload("missing result field".into()))?;
    let entries = result
        .as_array()
        .ok_or_else(|| ProviderError::Payload("result is not a list".into()))?;
    if entries.is_empty() {
        return Err(ProviderError::Payload("empty transaction list".into()));
    }
    entries
        .iter()
        .map(|entry| {
            serde_json::from_value::<TxEntry>(entry.clone())
                .map_err(|e| ProviderError::Payload(format!("bad tx entry: {}", e)))
        })
        .collect()
}

/// Pick the funder among `txs`: the greatest-value transfer into `address`.
/// Strictly-greater comparison keeps the explorer's first-seen order on ties
/// and rejects zero-value transfers.
pub(crate) fn select_funder(
    txs: &[TxEntry],
    address: &str,
    native_decimals: u32,
) -> Option<(String, Decimal)> {
    let target = address.to_lowercase();
    let scale = Decimal::from(10u64.pow(native_decimals));

    let mut best: Option<String> = None;
    let mut max_value = Decimal::ZERO;
    for tx in txs {
        if tx.to.to_lowercase() != target {
            continue;
        }
        let wei = match Decimal::from_str(&tx.value) {
            Ok(wei) => wei,
            Err(_) => continue,
        };
        let value = wei / scale;
        if value > max_value {
            max_value = value;
            best = Some(tx.from.to_lowercase());
        }
    }
    best.map(|funder| (funder, max_value))
}
