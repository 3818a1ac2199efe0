//! Provider Circuit Breaker
//!
//! Tracks consecutive failures per logical provider and decides
//! primary-vs-backup routing. A provider is bypassed once it reaches the
//! threshold and stays bypassed until a success resets the counter. There
//! is no time-based recovery; only a lucky or retried success reopens it.
//!
//! One breaker instance is shared by every worker task, so the counters use
//! per-key locking (DashMap entry API) rather than plain reads and writes.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use super::ProviderId;
use dashmap::DashMap;
use tracing::info;

/// Consecutive failures at which a provider is bypassed.
pub const FAILURE_THRESHOLD: u32 = 3;

pub struct ProviderBreaker {
    failures: DashMap<ProviderId, u32>,
    threshold: u32,
}

impl ProviderBreaker {
    pub fn new() -> Self {
        Self::with_threshold(FAILURE_THRESHOLD)
    }

    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            failures: DashMap::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True while the provider has not reached the failure threshold.
    pub fn should_use_primary(&self, id: ProviderId) -> bool {
        self.consecutive_failures(id) < self.threshold
    }

    /// Record a semantically-complete success: the counter resets to zero.
    pub fn record_success(&self, id: ProviderId) {
        if let Some(mut entry) = self.failures.get_mut(&id) {
            if *entry >= self.threshold {
                info!("Provider {} recovered — resuming primary routing", id);
            }
            *entry = 0;
        }
    }

    /// Record a failure; returns the new consecutive count. The increment is
    /// a read-modify-write under the entry lock, so concurrent workers never
    /// under- or over-count.
    pub fn record_failure(&self, id: ProviderId) -> u32 {
        let mut entry = self.failures.entry(id).or_insert(0);
        *entry += 1;
        let count = *entry;
        drop(entry);

        if count == self.threshold {
            info!(
                "Provider {} hit {} consecutive failures — bypassing until next success",
                id, count
            );
        }
        count
    }

    pub fn consecutive_failures(&self, id: ProviderId) -> u32 {
        self.failures.get(&id).map(|c| *c).unwrap_or(0)
    }
}

impl Default for ProviderBreaker {
    fn default() -> Self {
        Self::new()
    }
}
