//! Universal balance backup (Blockchair)
//!
//! Emergency path used when a primary explorer is down. Blockchair only
//! yields an account balance here (no transaction-level attribution), so
//! the answer is always balance-only. A shape mismatch in the payload means
//! "no candidate", never an error: this endpoint is the last resort, and a
//! malformed response must not poison the trace.
//!
//! Author: AI-Generated
//! Created: 2026-07-31

use super::{FunderProvider, ProviderError, ProviderId};
use crate::types::{ChainId, ProviderAnswer};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

pub struct BlockchairClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl BlockchairClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn url(&self, chain: ChainId, address: &str) -> String {
        let mut url = format!(
            "https://api.blockchair.com/{}/dashboards/address/{}",
            chain.blockchair_slug(),
            address
        );
        if let Some(key) = &self.api_key {
            url.push_str("?key=");
            url.push_str(key);
        }
        url
    }
}

#[async_trait]
impl FunderProvider for BlockchairClient {
    fn id(&self) -> ProviderId {
        ProviderId::Blockchair
    }

    async fn query_funder(
        &self,
        chain: ChainId,
        address: &str,
    ) -> Result<ProviderAnswer, ProviderError> {
        let body: Value = self
            .client
            .get(self.url(chain, address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match parse_balance(&body, address) {
            Some(balance_usd) => Ok(ProviderAnswer::BalanceOnly { balance_usd }),
            None => {
                debug!("Blockchair: unusable response shape for {}", address);
                Ok(ProviderAnswer::NoCandidate)
            }
        }
    }
}

/// Returns None when the response shape is unusable (missing data section or
/// address key). A present entry without a balance figure yields zero.
pub(crate) fn parse_balance(body: &Value, address: &str) -> Option<Decimal> {
    let entry = body.get("data")?.as_object()?.get(address)?;
    let usd = entry
        .get("address")
        .and_then(|a| a.get("balance_usd"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    Some(Decimal::from_f64_retain(usd).unwrap_or(Decimal::ZERO))
}
