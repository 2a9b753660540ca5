//! Per-principal account view cache
//!
//! The surrounding application caches balance and transaction views per
//! principal. The orchestrator invalidates the entry when a transfer
//! completes so the next read reflects the settled state.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxSummary {
    pub hash: String,
    pub description: String,
}

/// Cached view of one account
#[derive(Debug, Clone)]
pub struct AccountView {
    pub holdings: Vec<Holding>,
    pub transactions: Vec<TxSummary>,
    pub last_updated: DateTime<Utc>,
}

/// Account views keyed by principal address
pub struct AccountCache {
    entries: DashMap<String, AccountView>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, principal: &str) -> Option<AccountView> {
        self.entries.get(principal).map(|v| v.clone())
    }

    pub fn put(&self, principal: &str, holdings: Vec<Holding>, transactions: Vec<TxSummary>) {
        self.entries.insert(
            principal.to_string(),
            AccountView {
                holdings,
                transactions,
                last_updated: Utc::now(),
            },
        );
    }

    pub fn invalidate(&self, principal: &str) {
        self.entries.remove(principal);
    }
}

impl Default for AccountCache {
    fn default() -> Self {
        Self::new()
    }
}
