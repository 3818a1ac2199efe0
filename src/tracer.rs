//! Ancestor Tracer
//!
//! Walks funding edges backward from a token deployer until it reaches a
//! whitelisted entity, the depth cap, or runs out of providers. The walk
//! favors signal over completeness: it stops at the first recognizable
//! institutional entity instead of walking to origin, because institutional
//! attribution is the strongest cheap signal and the free upstream APIs are
//! rate-limited.
//!
//! The walk is an explicit loop rather than recursion. The accumulator is
//! the first hop (the deployer's direct funder and amount): a pass-through
//! terminal propagates its own descriptor with the first hop's amount, and
//! every other terminal collapses to the first funder as a private wallet.
//!
//! Author: AI-Generated
//! Created: 2026-08-01
//! Modified: 2026-08-04 - Breaker bookkeeping moved out of provider clients

use crate::providers::{FunderProvider, ProviderBreaker};
use crate::types::{ChainId, EntityDescriptor, ImpactAmount, ProviderAnswer, TraceResult};
use crate::whitelist::WhitelistIndex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum hop depth before a walk terminates with the limit classification.
pub const MAX_TRACE_DEPTH: u32 = 5;

pub struct AncestorTracer {
    whitelist: Arc<WhitelistIndex>,
    breaker: Arc<ProviderBreaker>,
    evm_primary: Arc<dyn FunderProvider>,
    solana_primary: Arc<dyn FunderProvider>,
    backup: Arc<dyn FunderProvider>,
}

impl AncestorTracer {
    pub fn new(
        whitelist: Arc<WhitelistIndex>,
        breaker: Arc<ProviderBreaker>,
        evm_primary: Arc<dyn FunderProvider>,
        solana_primary: Arc<dyn FunderProvider>,
        backup: Arc<dyn FunderProvider>,
    ) -> Self {
        Self {
            whitelist,
            breaker,
            evm_primary,
            solana_primary,
            backup,
        }
    }

    /// Trace the funding source of `address`, starting at `depth` (1 for a
    /// fresh deployer). Never fails: provider trouble degrades to an
    /// unresolved classification.
    pub async fn trace(&self, chain: ChainId, address: &str, depth: u32) -> TraceResult {
        let mut current = address.to_string();
        let mut depth = depth;
        // The deployer's direct funder and hop amount. Terminals that are
        // not pass-through entities collapse to this hop.
        let mut first_hop: Option<(String, Decimal)> = None;

        loop {
            // Whitelisted entities are trace terminals at any depth.
            if let Some(known) = self.whitelist.lookup(chain, &current) {
                return match first_hop {
                    None => TraceResult {
                        funder: known,
                        impact: ImpactAmount::ZERO,
                    },
                    Some((_, amount)) if known.entity_type.is_pass_through() => TraceResult {
                        funder: known,
                        impact: ImpactAmount::Native(amount),
                    },
                    Some((funder, amount)) => TraceResult {
                        funder: EntityDescriptor::private_wallet(&funder, chain),
                        impact: ImpactAmount::Native(amount),
                    },
                };
            }

            // Depth cap bounds the walk through long private-wallet chains.
            if depth > MAX_TRACE_DEPTH {
                return match first_hop {
                    None => TraceResult {
                        funder: EntityDescriptor::trace_limit(&current),
                        impact: ImpactAmount::ZERO,
                    },
                    Some((funder, amount)) => TraceResult {
                        funder: EntityDescriptor::private_wallet(&funder, chain),
                        impact: ImpactAmount::Native(amount),
                    },
                };
            }

            match self.query_with_failover(chain, &current).await {
                ProviderAnswer::Funder { address: funder, amount } => {
                    if !chain.is_evm() {
                        // Single-hop attribution: the immediate funder is
                        // the result.
                        return TraceResult {
                            funder: EntityDescriptor::private_wallet(&funder, chain),
                            impact: ImpactAmount::Native(amount),
                        };
                    }
                    if first_hop.is_none() {
                        first_hop = Some((funder.clone(), amount));
                    }
                    debug!(
                        chain = chain.as_str(),
                        funder = %funder,
                        depth,
                        "following funding edge"
                    );
                    current = funder;
                    depth += 1;
                }
                ProviderAnswer::BalanceOnly { balance_usd } => {
                    return match first_hop {
                        None => TraceResult {
                            funder: EntityDescriptor::unresolved(&current, true),
                            impact: ImpactAmount::Usd(balance_usd),
                        },
                        Some((funder, amount)) => TraceResult {
                            funder: EntityDescriptor::private_wallet(&funder, chain),
                            impact: ImpactAmount::Native(amount),
                        },
                    };
                }
                ProviderAnswer::NoCandidate => {
                    return match first_hop {
                        None => TraceResult {
                            funder: EntityDescriptor::unresolved(&current, false),
                            impact: ImpactAmount::Usd(Decimal::ZERO),
                        },
                        Some((funder, amount)) => TraceResult {
                            funder: EntityDescriptor::private_wallet(&funder, chain),
                            impact: ImpactAmount::Native(amount),
                        },
                    };
                }
            }
        }
    }

    /// One funding query with breaker-gated primary-to-backup failover. A
    /// valid primary response with nothing attributable still falls through
    /// to the backup, which may at least contribute a balance figure.
    async fn query_with_failover(&self, chain: ChainId, address: &str) -> ProviderAnswer {
        let primary = if chain.is_evm() {
            &self.evm_primary
        } else {
            &self.solana_primary
        };

        if self.breaker.should_use_primary(primary.id()) {
            match primary.query_funder(chain, address).await {
                Ok(answer) => {
                    self.breaker.record_success(primary.id());
                    if let ProviderAnswer::Funder { .. } = answer {
                        return answer;
                    }
                }
                Err(e) => {
                    let count = self.breaker.record_failure(primary.id());
                    warn!(
                        "{} failed ({}/{}): {}",
                        primary.id(),
                        count,
                        self.breaker.threshold(),
                        e
                    );
                }
            }
        } else {
            debug!("{} breaker open — routing to backup", primary.id());
        }

        match self.backup.query_funder(chain, address).await {
            Ok(answer) => {
                self.breaker.record_success(self.backup.id());
                answer
            }
            Err(e) => {
                self.breaker.record_failure(self.backup.id());
                warn!("{} backup failed: {}", self.backup.id(), e);
                ProviderAnswer::NoCandidate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderError, ProviderId};
    use crate::types::EntityType;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    const DEPLOYER: &str = "0xdddddddddddddddddddddddddddddddddddddddd";
    const WALLET: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
    const BRIDGE: &str = "0xb1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1";
    const TREASURY: &str = "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0";

    /// Scripted provider: maps lowercase address to a fixed answer and
    /// counts every call.
    struct ScriptedProvider {
        id: ProviderId,
        answers: HashMap<String, ProviderAnswer>,
        fail_all: bool,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(id: ProviderId) -> Self {
            Self {
                id,
                answers: HashMap::new(),
                fail_all: false,
                calls: AtomicU32::new(0),
            }
        }

        fn with_funder(mut self, address: &str, funder: &str, amount: Decimal) -> Self {
            self.answers.insert(
                address.to_lowercase(),
                ProviderAnswer::Funder {
                    address: funder.to_lowercase(),
                    amount,
                },
            );
            self
        }

        fn with_balance(mut self, address: &str, usd: Decimal) -> Self {
            self.answers.insert(
                address.to_lowercase(),
                ProviderAnswer::BalanceOnly { balance_usd: usd },
            );
            self
        }

        fn failing(mut self) -> Self {
            self.fail_all = true;
            self
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FunderProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn query_funder(
            &self,
            _chain: ChainId,
            address: &str,
        ) -> Result<ProviderAnswer, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(ProviderError::Payload("scripted failure".into()));
            }
            Ok(self
                .answers
                .get(&address.to_lowercase())
                .cloned()
                .unwrap_or(ProviderAnswer::NoCandidate))
        }
    }

    fn whitelist_fixture() -> Arc<WhitelistIndex> {
        let json = format!(
            r#"{{
                "base": {{
                    "{}": {{"type": "BRIDGE", "name": "Base Bridge", "risk": 1}},
                    "{}": {{"type": "GOV", "name": "Treasury Multisig", "risk": 1}}
                }},
                "solana": {{
                    "KnownCexWalletSol111111111111111111111111111": {{"type": "CEX", "name": "Binance Hot Wallet", "risk": 1}}
                }}
            }}"#,
            BRIDGE, TREASURY
        );
        Arc::new(WhitelistIndex::from_json(&json).unwrap())
    }

    struct Fixture {
        tracer: AncestorTracer,
        evm: Arc<ScriptedProvider>,
        solana: Arc<ScriptedProvider>,
        backup: Arc<ScriptedProvider>,
    }

    fn fixture(
        evm: ScriptedProvider,
        solana: ScriptedProvider,
        backup: ScriptedProvider,
    ) -> Fixture {
        let evm = Arc::new(evm);
        let solana = Arc::new(solana);
        let backup = Arc::new(backup);
        let tracer = AncestorTracer::new(
            whitelist_fixture(),
            Arc::new(ProviderBreaker::new()),
            evm.clone(),
            solana.clone(),
            backup.clone(),
        );
        Fixture {
            tracer,
            evm,
            solana,
            backup,
        }
    }

    #[tokio::test]
    async fn test_whitelisted_address_short_circuits() {
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout).failing(),
            ScriptedProvider::new(ProviderId::Solscan).failing(),
            ScriptedProvider::new(ProviderId::Blockchair).failing(),
        );

        let result = f.tracer.trace(ChainId::Base, BRIDGE, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Bridge);
        assert_eq!(result.funder.name, "Base Bridge");
        assert_eq!(result.impact, ImpactAmount::ZERO);

        // A whitelist terminal performs no provider calls at all.
        assert_eq!(f.evm.calls(), 0);
        assert_eq!(f.backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_depth_past_limit_returns_limit_descriptor() {
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout).failing(),
            ScriptedProvider::new(ProviderId::Solscan).failing(),
            ScriptedProvider::new(ProviderId::Blockchair).failing(),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 6).await;
        assert_eq!(result.funder.entity_type, EntityType::Limit);
        assert_eq!(result.funder.risk, 3);
        assert_eq!(result.impact, ImpactAmount::ZERO);
        // Provider state is irrelevant: the cap fires before any call.
        assert_eq!(f.evm.calls(), 0);
        assert_eq!(f.backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_pass_through_entity_propagates_with_first_hop_amount() {
        // deployer <- wallet <- bridge; bridge is whitelisted pass-through.
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout)
                .with_funder(DEPLOYER, WALLET, dec!(2))
                .with_funder(WALLET, BRIDGE, dec!(50)),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Bridge);
        assert_eq!(result.funder.name, "Base Bridge");
        // The first hop's amount, not the wallet-to-bridge amount.
        assert_eq!(result.impact, ImpactAmount::Native(dec!(2)));
    }

    #[tokio::test]
    async fn test_non_pass_through_terminal_collapses_to_first_funder() {
        // deployer <- wallet <- treasury (GOV: whitelisted but not a
        // pass-through type).
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout)
                .with_funder(DEPLOYER, WALLET, dec!(2))
                .with_funder(WALLET, TREASURY, dec!(9)),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Eoa);
        assert_eq!(result.funder.address, WALLET);
        assert_eq!(result.funder.name, "Private Wallet");
        assert_eq!(result.impact, ImpactAmount::Native(dec!(2)));
    }

    #[tokio::test]
    async fn test_unresolvable_ancestor_collapses_to_first_funder() {
        // The wallet's own funding cannot be attributed; only a balance
        // comes back for it. The result is the first funder as a wallet.
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout)
                .with_funder(DEPLOYER, WALLET, dec!(0.75)),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair).with_balance(WALLET, dec!(41000)),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Eoa);
        assert_eq!(result.funder.address, WALLET);
        assert_eq!(result.impact, ImpactAmount::Native(dec!(0.75)));
    }

    #[tokio::test]
    async fn test_deep_wallet_chain_stops_at_depth_cap() {
        // a1 <- a2 <- ... <- a7, all unlisted private wallets.
        let addrs: Vec<String> = (1..=7).map(|i| format!("0xa{}", i)).collect();
        let mut primary = ScriptedProvider::new(ProviderId::Blockscout);
        for window in addrs.windows(2) {
            primary = primary.with_funder(&window[0], &window[1], dec!(1));
        }
        let f = fixture(
            primary,
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair),
        );

        let result = f.tracer.trace(ChainId::Base, &addrs[0], 1).await;
        // Depth cap of 5 means hops were followed for depths 1..=5.
        assert_eq!(f.evm.calls(), 5);
        assert_eq!(result.funder.entity_type, EntityType::Eoa);
        assert_eq!(result.funder.address, addrs[1]);
        assert_eq!(result.impact, ImpactAmount::Native(dec!(1)));
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_balance_backup() {
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout).failing(),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair).with_balance(DEPLOYER, dec!(123.45)),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Unknown);
        assert_eq!(result.funder.name, "Unknown (Blockchair)");
        assert_eq!(result.funder.address, DEPLOYER);
        assert_eq!(result.impact, ImpactAmount::Usd(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_breaker_opens_after_three_failures_and_skips_primary() {
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout).failing(),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair).with_balance(DEPLOYER, dec!(1)),
        );

        for _ in 0..3 {
            f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        }
        assert_eq!(f.evm.calls(), 3);
        assert_eq!(f.backup.calls(), 3);

        // Fourth trace routes straight to the backup.
        f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(f.evm.calls(), 3);
        assert_eq!(f.backup.calls(), 4);
    }

    #[tokio::test]
    async fn test_nothing_resolvable_yields_unresolved_marker() {
        // Primary answers cleanly with no candidate; backup shape-mismatches.
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout),
            ScriptedProvider::new(ProviderId::Solscan),
            ScriptedProvider::new(ProviderId::Blockchair),
        );

        let result = f.tracer.trace(ChainId::Base, DEPLOYER, 1).await;
        assert_eq!(result.funder.entity_type, EntityType::Unknown);
        assert_eq!(result.funder.name, "Unresolved");
        assert_eq!(result.impact, ImpactAmount::Usd(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_solana_resolves_single_hop_without_recursion() {
        let signer = "FunderSignerSol11111111111111111111111111111";
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout),
            ScriptedProvider::new(ProviderId::Solscan).with_funder(
                "DeployerSol111111111111111111111111111111111",
                signer,
                Decimal::ZERO,
            ),
            ScriptedProvider::new(ProviderId::Blockchair),
        );

        let result = f
            .tracer
            .trace(
                ChainId::Solana,
                "DeployerSol111111111111111111111111111111111",
                1,
            )
            .await;
        assert_eq!(result.funder.entity_type, EntityType::Eoa);
        assert_eq!(result.funder.name, "Solana Wallet");
        assert_eq!(result.funder.address, signer.to_lowercase());
        assert_eq!(result.impact, ImpactAmount::Native(Decimal::ZERO));
        // Exactly one lookup: the signer itself is never traced further.
        assert_eq!(f.solana.calls(), 1);
        assert_eq!(f.evm.calls(), 0);
    }

    #[tokio::test]
    async fn test_solana_whitelisted_deployer_short_circuits() {
        let f = fixture(
            ScriptedProvider::new(ProviderId::Blockscout),
            ScriptedProvider::new(ProviderId::Solscan).failing(),
            ScriptedProvider::new(ProviderId::Blockchair).failing(),
        );

        let result = f
            .tracer
            .trace(
                ChainId::Solana,
                "knowncexwalletsol111111111111111111111111111",
                1,
            )
            .await;
        assert_eq!(result.funder.entity_type, EntityType::Cex);
        assert_eq!(result.impact, ImpactAmount::ZERO);
        assert_eq!(f.solana.calls(), 0);
    }
}
