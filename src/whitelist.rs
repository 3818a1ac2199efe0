//! Known-Entity Whitelist
//!
//! Case-insensitive lookup from (chain, address) to a pre-classified entity
//! (exchanges, bridges, DEX routers, mixers). Loaded once from labels.json
//! at startup; load failure degrades to an empty index so the bot keeps
//! running without a whitelist instead of aborting.
//!
//! Author: AI-Generated
//! Created: 2026-07-29

use crate::types::{ChainId, EntityDescriptor, EntityType};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// One entry in the labels file. The address is the enclosing map key.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    #[serde(default = "default_risk")]
    pub risk: u8,
}

fn default_risk() -> u8 {
    3
}

/// Read-only index built once at startup. Addresses are lowercased at load
/// time so lookups are case-insensitive regardless of how the labels file
/// mixes casing.
pub struct WhitelistIndex {
    entries: HashMap<ChainId, HashMap<String, LabelEntry>>,
}

impl WhitelistIndex {
    /// Load from a JSON file, degrading to an empty index on any failure.
    pub fn load_or_empty(path: &str) -> Self {
        match Self::load(path) {
            Ok(index) => {
                info!("Whitelist loaded: {} entries from {}", index.len(), path);
                index
            }
            Err(e) => {
                warn!(
                    "Failed to load whitelist {}: {:#} — running without whitelist",
                    path, e
                );
                Self::empty()
            }
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file: {}", path))?;
        Self::from_json(&content)
    }

    /// Build from raw JSON: `{ "<chain>": { "<address>": {type, name, risk} } }`.
    /// Unknown chain keys are skipped with a warning.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, LabelEntry>> =
            serde_json::from_str(content).context("Failed to parse labels JSON")?;

        let mut entries: HashMap<ChainId, HashMap<String, LabelEntry>> = HashMap::new();
        for (chain_key, labels) in raw {
            let chain = match ChainId::parse(&chain_key) {
                Some(chain) => chain,
                None => {
                    warn!(
                        "Unknown chain '{}' in labels file — skipping {} entries",
                        chain_key,
                        labels.len()
                    );
                    continue;
                }
            };
            let normalized = labels
                .into_iter()
                .map(|(address, entry)| (address.trim().to_lowercase(), entry))
                .collect();
            entries.insert(chain, normalized);
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Case-insensitive lookup. The returned descriptor carries the queried
    /// address, not the label key's original casing.
    pub fn lookup(&self, chain: ChainId, address: &str) -> Option<EntityDescriptor> {
        let entry = self
            .entries
            .get(&chain)?
            .get(&address.trim().to_lowercase())?;
        Some(EntityDescriptor {
            address: address.to_string(),
            entity_type: entry.entity_type,
            name: entry.name.clone(),
            risk: entry.risk,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_index() -> WhitelistIndex {
        let json = r#"{
            "base": {
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48": {"type": "CEX", "name": "Coinbase Hot Wallet", "risk": 1},
                "0x3154cf16ccdb4c6d922629664174b904d80f2c35": {"type": "BRIDGE", "name": "Base Bridge", "risk": 1}
            },
            "solana": {
                "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9": {"type": "CEX", "name": "Binance Hot Wallet"}
            }
        }"#;
        WhitelistIndex::from_json(json).unwrap()
    }

    #[test]
    fn test_lookup_hit() {
        let index = test_index();
        let entry = index
            .lookup(ChainId::Base, "0x3154cf16ccdb4c6d922629664174b904d80f2c35")
            .unwrap();
        assert_eq!(entry.entity_type, EntityType::Bridge);
        assert_eq!(entry.name, "Base Bridge");
        assert_eq!(entry.risk, 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = test_index();
        // Label key is checksummed; query is lowercase.
        let entry = index
            .lookup(ChainId::Base, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
            .unwrap();
        assert_eq!(entry.name, "Coinbase Hot Wallet");
        // Query casing is preserved in the returned descriptor.
        assert_eq!(entry.address, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    }

    #[test]
    fn test_lookup_miss() {
        let index = test_index();
        assert!(index
            .lookup(ChainId::Base, "0x0000000000000000000000000000000000000001")
            .is_none());
        // Right address, wrong chain.
        assert!(index
            .lookup(ChainId::Ethereum, "0x3154cf16ccdb4c6d922629664174b904d80f2c35")
            .is_none());
    }

    #[test]
    fn test_risk_defaults_to_three() {
        let index = test_index();
        let entry = index
            .lookup(ChainId::Solana, "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9")
            .unwrap();
        assert_eq!(entry.risk, 3);
    }

    #[test]
    fn test_unknown_chain_keys_are_skipped() {
        let json = r#"{
            "dogecoin": { "DAbc": {"type": "CEX", "name": "Somewhere"} },
            "base": { "0xabc": {"type": "DEX", "name": "BaseSwap Router", "risk": 2} }
        }"#;
        let index = WhitelistIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.lookup(ChainId::Base, "0xABC").is_some());
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let index = WhitelistIndex::load_or_empty("/nonexistent/labels.json");
        assert!(index.is_empty());
        assert!(index.lookup(ChainId::Base, "0xabc").is_none());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        assert!(WhitelistIndex::from_json("{not valid json").is_err());
        // load_or_empty swallows the parse failure.
        let index = WhitelistIndex::load_or_empty("/dev/null");
        assert!(index.is_empty());
    }
}
