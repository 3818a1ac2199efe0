// Core data structures shared across discovery, tracing, and the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chains serviced by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Base,
    Ethereum,
    Bsc,
    Solana,
}

impl ChainId {
    pub const ALL: [ChainId; 4] = [
        ChainId::Base,
        ChainId::Ethereum,
        ChainId::Bsc,
        ChainId::Solana,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Base => "base",
            ChainId::Ethereum => "ethereum",
            ChainId::Bsc => "bsc",
            ChainId::Solana => "solana",
        }
    }

    pub fn parse(s: &str) -> Option<ChainId> {
        match s.trim().to_lowercase().as_str() {
            "base" => Some(ChainId::Base),
            "ethereum" => Some(ChainId::Ethereum),
            "bsc" => Some(ChainId::Bsc),
            "solana" => Some(ChainId::Solana),
            _ => None,
        }
    }

    /// EVM chains support recursive funding attribution; Solana resolves a
    /// single hop.
    pub fn is_evm(&self) -> bool {
        !matches!(self, ChainId::Solana)
    }

    /// Fixed decimal exponent of the chain's native unit.
    pub fn native_decimals(&self) -> u32 {
        match self {
            ChainId::Solana => 9,
            _ => 18,
        }
    }

    /// Chain identifier used by the Blockchair dashboards API.
    pub fn blockchair_slug(&self) -> &'static str {
        match self {
            ChainId::Base => "base",
            ChainId::Ethereum => "ethereum",
            ChainId::Bsc => "binance-smart-chain",
            ChainId::Solana => "solana",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a funding source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Cex,
    Bridge,
    Dex,
    Gov,
    Mixer,
    Eoa,
    Unknown,
    Limit,
}

impl EntityType {
    /// Known safe infrastructure: never tracked as a suspect, and a sighting
    /// resolving to one of these never escalates an existing record.
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            EntityType::Cex | EntityType::Bridge | EntityType::Dex | EntityType::Gov
        )
    }

    /// Terminal high-signal types: once the walk reaches one of these, its
    /// descriptor is propagated over the intermediate private wallets.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, EntityType::Cex | EntityType::Bridge | EntityType::Mixer)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            EntityType::Cex => "CEX",
            EntityType::Bridge => "BRIDGE",
            EntityType::Dex => "DEX",
            EntityType::Gov => "GOV",
            EntityType::Mixer => "MIXER",
            EntityType::Eoa => "EOA",
            EntityType::Unknown => "UNKNOWN",
            EntityType::Limit => "LIMIT",
        };
        write!(f, "{}", s)
    }
}

/// A classified funding source: loaded from the whitelist, or synthesized by
/// the tracer when no whitelisted entity was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub address: String,
    pub entity_type: EntityType,
    pub name: String,
    pub risk: u8,
}

impl EntityDescriptor {
    pub fn new(address: &str, entity_type: EntityType, name: &str, risk: u8) -> Self {
        Self {
            address: address.to_string(),
            entity_type,
            name: name.to_string(),
            risk,
        }
    }

    /// Generic classification for an unrecognized funder wallet.
    pub fn private_wallet(address: &str, chain: ChainId) -> Self {
        let name = match chain {
            ChainId::Solana => "Solana Wallet",
            _ => "Private Wallet",
        };
        Self::new(address, EntityType::Eoa, name, 3)
    }

    /// Synthetic terminal returned when the walk hits the depth cap.
    pub fn trace_limit(address: &str) -> Self {
        Self::new(address, EntityType::Limit, "Trace Limit", 3)
    }

    /// Attribution could not be resolved; `via_backup` marks whether the
    /// balance backup at least produced a figure.
    pub fn unresolved(address: &str, via_backup: bool) -> Self {
        let name = if via_backup {
            "Unknown (Blockchair)"
        } else {
            "Unresolved"
        };
        Self::new(address, EntityType::Unknown, name, 3)
    }
}

/// Normalized result of one provider query.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderAnswer {
    /// A concrete funding transfer was attributed. Amount is in the chain's
    /// native unit; zero when the provider cannot derive one.
    Funder { address: String, amount: Decimal },
    /// Only an account balance could be obtained (already USD). The backup
    /// provider does not attempt transaction-level attribution.
    BalanceOnly { balance_usd: Decimal },
    /// Semantically valid response with nothing attributable.
    NoCandidate,
}

/// Approximate impact attached to a trace, tagged by unit. Explorer-derived
/// hop amounts are native units; backup balances are already USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpactAmount {
    Native(Decimal),
    Usd(Decimal),
}

impl ImpactAmount {
    pub const ZERO: ImpactAmount = ImpactAmount::Native(Decimal::ZERO);

    pub fn to_usd(&self, native_price_usd: Decimal) -> Decimal {
        match self {
            ImpactAmount::Native(amount) => *amount * native_price_usd,
            ImpactAmount::Usd(usd) => *usd,
        }
    }
}

/// Outcome of one funding-source trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceResult {
    pub funder: EntityDescriptor,
    pub impact: ImpactAmount,
}

/// A newly observed token deployment, emitted by discovery.
#[derive(Debug, Clone)]
pub struct TokenDeployment {
    pub chain: ChainId,
    pub deployer: String,
    pub token: String,
    pub evidence_link: String,
}
