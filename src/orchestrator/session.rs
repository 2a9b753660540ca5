//! Pending-transfer records and the session store seam
//!
//! Transfer progress is persisted per principal in an external key-value
//! session collaborator. The orchestrator is the only writer; records
//! are created on start, mutated by the orchestrator's own transitions,
//! and deleted on completion or explicit abandonment.

use crate::error::{TransferError, TransferResult};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Ordered hop sequence of one transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    /// Chain names from source to destination, length >= 1
    pub route: Vec<String>,
    /// Current hop, 0-based
    pub hop_index: usize,
}

impl TransferPlan {
    pub fn is_cross_chain(&self) -> bool {
        self.route.len() > 1
    }

    /// Number of chain-to-chain legs
    pub fn hop_count(&self) -> usize {
        self.route.len().saturating_sub(1)
    }

    pub fn is_last_hop(&self) -> bool {
        self.hop_index + 1 >= self.hop_count()
    }
}

/// What is being moved, fixed at start time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDescriptor {
    pub fungible: bool,
    pub destination: String,
    pub symbol: String,
    pub amount_or_id: String,
}

/// Addresses the settlement transaction references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDescriptor {
    pub source_chain_address: String,
    pub destination_chain_address: String,
}

/// Which transaction the orchestrator is currently waiting on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransferPhase {
    HopConfirming,
    SettlementConfirming,
}

/// Persisted progress of one transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub principal: String,
    pub plan: TransferPlan,
    pub transfer: TransferDescriptor,
    /// Hash of the most recently submitted transaction (hop or settlement)
    pub last_tx_hash: String,
    /// Current hop confirmed but the follow-up action not yet submitted
    pub hop_confirmed: bool,
    /// Block that included the confirmed final hop, needed for settlement
    pub hop_block_hash: Option<String>,
    pub settlement: Option<SettlementDescriptor>,
    pub phase: TransferPhase,
    pub completed: bool,
}

/// External key-value store holding one record per principal
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, principal: &str) -> TransferResult<Option<PendingTransfer>>;

    /// Insert a new record; fails if the principal already has one
    async fn create(&self, record: PendingTransfer) -> TransferResult<()>;

    /// Replace an existing record
    async fn put(&self, record: PendingTransfer) -> TransferResult<()>;

    async fn remove(&self, principal: &str) -> TransferResult<()>;
}

/// In-process session store
pub struct MemorySessionStore {
    entries: DashMap<String, PendingTransfer>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, principal: &str) -> TransferResult<Option<PendingTransfer>> {
        Ok(self.entries.get(principal).map(|r| r.clone()))
    }

    async fn create(&self, record: PendingTransfer) -> TransferResult<()> {
        match self.entries.entry(record.principal.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(TransferError::TransferInProgress {
                    principal: record.principal,
                })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn put(&self, record: PendingTransfer) -> TransferResult<()> {
        self.entries.insert(record.principal.clone(), record);
        Ok(())
    }

    async fn remove(&self, principal: &str) -> TransferResult<()> {
        self.entries.remove(principal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(principal: &str) -> PendingTransfer {
        PendingTransfer {
            principal: principal.to_string(),
            plan: TransferPlan {
                route: vec!["main".to_string(), "nft".to_string()],
                hop_index: 0,
            },
            transfer: TransferDescriptor {
                fungible: true,
                destination: "Sdest".to_string(),
                symbol: "SOUL".to_string(),
                amount_or_id: "1.5".to_string(),
            },
            last_tx_hash: "tx-1".to_string(),
            hop_confirmed: false,
            hop_block_hash: None,
            settlement: None,
            phase: TransferPhase::HopConfirming,
            completed: false,
        }
    }

    #[test]
    fn plan_geometry() {
        let single = TransferPlan {
            route: vec!["main".to_string()],
            hop_index: 0,
        };
        assert!(!single.is_cross_chain());
        assert_eq!(single.hop_count(), 0);

        let multi = TransferPlan {
            route: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            hop_index: 0,
        };
        assert!(multi.is_cross_chain());
        assert_eq!(multi.hop_count(), 2);
        assert!(!multi.is_last_hop());

        let at_end = TransferPlan {
            hop_index: 1,
            ..multi
        };
        assert!(at_end.is_last_hop());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let store = MemorySessionStore::new();
        store.create(record("alice")).await.unwrap();

        let err = store.create(record("alice")).await.unwrap_err();
        assert!(matches!(err, TransferError::TransferInProgress { .. }));

        store.create(record("bob")).await.unwrap();
    }

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let store = MemorySessionStore::new();
        store.create(record("alice")).await.unwrap();

        let mut updated = record("alice");
        updated.hop_confirmed = true;
        store.put(updated.clone()).await.unwrap();

        let loaded = store.get("alice").await.unwrap().unwrap();
        assert_eq!(loaded, updated);

        store.remove("alice").await.unwrap();
        assert!(store.get("alice").await.unwrap().is_none());
    }
}
