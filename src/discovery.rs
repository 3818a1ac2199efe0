//! New-token discovery (EVM)
//!
//! Polls factory pair-creation logs over raw JSON-RPC and resolves each
//! log's transaction to find the deployer. Cursor state is private to the
//! poller and only advances after a sweep that saw logs; re-scanning a block
//! range is harmless because the ledger upsert is idempotent.
//!
//! Author: AI-Generated
//! Created: 2026-08-02

use crate::config::EvmDiscovery;
use crate::types::{ChainId, TokenDeployment};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};

pub struct EvmLogPoller {
    client: reqwest::Client,
    chain: ChainId,
    cfg: EvmDiscovery,
    /// Next block to scan. None until the first successful eth_blockNumber;
    /// initialization is retried every sweep until it lands.
    cursor: Option<u64>,
}

impl EvmLogPoller {
    pub fn new(client: reqwest::Client, chain: ChainId, cfg: EvmDiscovery) -> Self {
        Self {
            client,
            chain,
            cfg,
            cursor: None,
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
        let resp: Value = self
            .client
            .post(&self.cfg.rpc_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("non-JSON response to {}", method))?;

        if let Some(err) = resp.get("error") {
            return Err(anyhow!("RPC error from {}: {}", method, err));
        }
        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("RPC response missing result for {}", method))
    }

    async fn latest_block(&self) -> Result<u64> {
        let result = self.rpc("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&result).context("bad eth_blockNumber result")
    }

    /// One discovery sweep: fetch pair-creation logs since the cursor and
    /// resolve each one to a deployment event.
    pub async fn poll(&mut self) -> Result<Vec<TokenDeployment>> {
        let from = match self.cursor {
            Some(block) => block,
            None => {
                let latest = self.latest_block().await?;
                self.cursor = Some(latest);
                latest
            }
        };

        let result = self
            .rpc(
                "eth_getLogs",
                json!([{
                    "fromBlock": format!("{:#x}", from),
                    "toBlock": "latest",
                    "address": self.cfg.factory_address,
                    "topics": [self.cfg.pair_created_topic],
                }]),
            )
            .await?;
        let logs = result.as_array().cloned().unwrap_or_default();

        let mut deployments = Vec::new();
        for log in &logs {
            match self.resolve_log(log).await {
                Ok(Some(deployment)) => deployments.push(deployment),
                Ok(None) => {}
                Err(e) => warn!(
                    chain = self.chain.as_str(),
                    "skipping undecodable log: {:#}", e
                ),
            }
        }

        if !logs.is_empty() {
            let latest = self.latest_block().await?;
            if latest > from {
                self.cursor = Some(latest + 1);
            }
        }
        Ok(deployments)
    }

    async fn resolve_log(&self, log: &Value) -> Result<Option<TokenDeployment>> {
        let tx_hash = log
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("log missing transactionHash"))?;
        let topic = log
            .get("topics")
            .and_then(|t| t.get(1))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("log missing token topic"))?;
        let token = token_address_from_topic(topic)
            .ok_or_else(|| anyhow!("malformed token topic: {}", topic))?;

        let tx = self.rpc("eth_getTransactionByHash", json!([tx_hash])).await?;
        let deployer = match tx.get("from").and_then(Value::as_str) {
            Some(from) => from.to_lowercase(),
            None => {
                debug!("transaction {} not yet available", tx_hash);
                return Ok(None);
            }
        };

        Ok(Some(TokenDeployment {
            chain: self.chain,
            deployer,
            evidence_link: format!(
                "https://dexscreener.com/{}/{}",
                self.chain.as_str(),
                token
            ),
            token,
        }))
    }
}

/// The new token address is the right-aligned 20 bytes of the first indexed
/// topic.
pub(crate) fn token_address_from_topic(topic: &str) -> Option<String> {
    let hex = topic.strip_prefix("0x")?;
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", hex[24..].to_lowercase()))
}

pub(crate) fn parse_hex_u64(value: &Value) -> Result<u64> {
    let s = value
        .as_str()
        .ok_or_else(|| anyhow!("expected hex string, got {}", value))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid hex quantity: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_address_from_topic() {
        let topic = "0x000000000000000000000000AbCdEf1234567890abcdef1234567890ABCDEF12";
        assert_eq!(
            token_address_from_topic(topic).unwrap(),
            "0xabcdef1234567890abcdef1234567890abcdef12"
        );
    }

    #[test]
    fn test_token_topic_rejects_bad_input() {
        assert!(token_address_from_topic("deadbeef").is_none()); // no prefix
        assert!(token_address_from_topic("0x1234").is_none()); // too short
        assert!(token_address_from_topic(&format!("0x{}", "zz".repeat(32))).is_none()); // not hex
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64(&serde_json::json!("0x10")).unwrap(), 16);
        assert_eq!(parse_hex_u64(&serde_json::json!("0x0")).unwrap(), 0);
        assert!(parse_hex_u64(&serde_json::json!("0xzz")).is_err());
        assert!(parse_hex_u64(&serde_json::json!(42)).is_err());
    }
}
