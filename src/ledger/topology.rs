//! Chain topology snapshot
//!
//! The ledger arranges chains in a parent/child tree. The topology is
//! fetched explicitly with `load()` and cached until the next `load()`;
//! there is no background refresh, so a transfer's view of the topology
//! stays fixed for its duration.

use crate::error::{TransferError, TransferResult};
use crate::ledger::LedgerRpc;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// One chain of the ledger
///
/// `parent` is a weak reference by name; a chain never owns its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub name: String,
    pub address: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

/// Snapshot of all chains, keyed by name
pub type ChainMap = HashMap<String, Chain>;

/// Cached chain topology with explicit refresh
pub struct ChainTopology {
    rpc: Arc<dyn LedgerRpc>,
    chains: RwLock<ChainMap>,
}

impl ChainTopology {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc,
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the current chain list and replace the cached snapshot atomically
    pub async fn load(&self) -> TransferResult<()> {
        let entries = self.rpc.get_chains().await?;

        let mut chains: ChainMap = entries
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    Chain {
                        name: e.name.clone(),
                        address: e.address.clone(),
                        parent: e.parent.clone(),
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        // Derive child lists in node order
        for entry in &entries {
            if let Some(parent) = &entry.parent {
                if let Some(chain) = chains.get_mut(parent) {
                    chain.children.push(entry.name.clone());
                }
            }
        }

        let count = chains.len();
        *self.chains.write().await = chains;
        info!("Loaded topology snapshot with {} chains", count);
        Ok(())
    }

    /// Get a chain by name from the cached snapshot
    pub async fn get(&self, name: &str) -> TransferResult<Chain> {
        self.chains
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| TransferError::ChainNotFound(name.to_string()))
    }

    /// Clone the full snapshot, for route computation
    pub async fn snapshot(&self) -> ChainMap {
        self.chains.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        !self.chains.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ChainInfo, ConfirmationInfo, TokenInfo};
    use async_trait::async_trait;

    struct StaticLedger(Vec<ChainInfo>);

    #[async_trait]
    impl LedgerRpc for StaticLedger {
        async fn get_chains(&self) -> TransferResult<Vec<ChainInfo>> {
            Ok(self.0.clone())
        }
        async fn get_tokens(&self) -> TransferResult<Vec<TokenInfo>> {
            Ok(vec![])
        }
        async fn send_raw_transaction(&self, _signed_hex: &str) -> TransferResult<String> {
            unreachable!()
        }
        async fn get_confirmations(&self, _tx_hash: &str) -> TransferResult<ConfirmationInfo> {
            unreachable!()
        }
    }

    fn sample_chains() -> Vec<ChainInfo> {
        vec![
            ChainInfo {
                name: "main".to_string(),
                address: "chain:main".to_string(),
                parent: None,
            },
            ChainInfo {
                name: "account".to_string(),
                address: "chain:account".to_string(),
                parent: Some("main".to_string()),
            },
            ChainInfo {
                name: "nft".to_string(),
                address: "chain:nft".to_string(),
                parent: Some("main".to_string()),
            },
        ]
    }

    #[tokio::test]
    async fn load_builds_child_lists() {
        let topology = ChainTopology::new(Arc::new(StaticLedger(sample_chains())));
        topology.load().await.unwrap();

        let main = topology.get("main").await.unwrap();
        assert_eq!(main.children, vec!["account", "nft"]);
        assert_eq!(main.parent, None);

        let nft = topology.get("nft").await.unwrap();
        assert_eq!(nft.parent.as_deref(), Some("main"));
        assert!(nft.children.is_empty());
    }

    #[tokio::test]
    async fn get_unknown_chain_fails() {
        let topology = ChainTopology::new(Arc::new(StaticLedger(sample_chains())));
        topology.load().await.unwrap();

        let err = topology.get("ghost").await.unwrap_err();
        assert!(matches!(err, TransferError::ChainNotFound(_)));
    }

    #[tokio::test]
    async fn load_replaces_previous_snapshot() {
        let topology = ChainTopology::new(Arc::new(StaticLedger(sample_chains())));
        topology.load().await.unwrap();
        assert!(topology.is_loaded().await);
        assert_eq!(topology.snapshot().await.len(), 3);
    }
}
