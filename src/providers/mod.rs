//! Blockchain-data providers
//!
//! Each provider answers one normalized question, "who funded this address
//! and how much", over a single upstream HTTP API. All network and parse
//! failures are converted into `ProviderError` at this boundary; nothing
//! crosses into the tracer as a panic or an unwind.

pub mod blockchair;
pub mod blockscout;
pub mod breaker;
pub mod solscan;

pub use blockchair::BlockchairClient;
pub use blockscout::BlockscoutClient;
pub use breaker::ProviderBreaker;
pub use solscan::SolscanClient;

use crate::types::{ChainId, ProviderAnswer};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Logical upstream data providers. Breaker state is keyed by this id and
/// shared across every chain serviced by the same provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Blockscout,
    Solscan,
    Blockchair,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ProviderId::Blockscout => "blockscout",
            ProviderId::Solscan => "solscan",
            ProviderId::Blockchair => "blockchair",
        };
        write!(f, "{}", s)
    }
}

/// What a provider call can fail with. Recorded against the circuit breaker
/// by the caller; never propagated past the tracer.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad payload: {0}")]
    Payload(String),
}

/// Core abstraction: anything that can attribute the funding of an address.
#[async_trait]
pub trait FunderProvider: Send + Sync {
    /// Breaker identity of this provider.
    fn id(&self) -> ProviderId;

    /// Who funded `address` on `chain`, and how much.
    async fn query_funder(
        &self,
        chain: ChainId,
        address: &str,
    ) -> Result<ProviderAnswer, ProviderError>;
}
