//! Funding-Source Tracer Library
//!
//! Provides components for tracing the wallets that finance new token
//! deployers and maintaining a risk-scored suspect ledger.
//!
//! Author: AI-Generated
//! Created: 2026-07-28

pub mod config;
pub mod discovery;
pub mod ledger;
pub mod providers;
pub mod tracer;
pub mod types;
pub mod whitelist;
pub mod worker;

// Re-export commonly used types
pub use config::{load_config, BotConfig};
pub use ledger::{Sighting, SuspectLedger, SuspectRecord, UpsertOutcome};
pub use tracer::{AncestorTracer, MAX_TRACE_DEPTH};
pub use types::{ChainId, EntityDescriptor, EntityType, ImpactAmount, TraceResult};
pub use whitelist::WhitelistIndex;
