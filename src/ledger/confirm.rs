//! Confirmation polling
//!
//! A submitted transaction is treated as final once it has gathered the
//! fixed confirmation threshold. Polling is side-effect free and safe to
//! repeat at any cadence; the caller drives the schedule.

use crate::error::TransferResult;
use crate::ledger::LedgerRpc;

use std::sync::Arc;
use tracing::debug;

/// Minimum confirmation count at which a transaction is final
pub const CONFIRMATION_THRESHOLD: u64 = 5;

/// Confirmation state of a submitted transaction
#[derive(Debug, Clone)]
pub struct TxConfirmation {
    pub hash: String,
    pub confirmations: u64,
    /// Hash of the including block, once mined
    pub block_hash: Option<String>,
}

impl TxConfirmation {
    pub fn confirmed(&self) -> bool {
        self.confirmations >= CONFIRMATION_THRESHOLD
    }
}

/// Queries confirmation counts for submitted transactions
pub struct ConfirmationPoller {
    rpc: Arc<dyn LedgerRpc>,
}

impl ConfirmationPoller {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    pub async fn confirmations(&self, tx_hash: &str) -> TransferResult<TxConfirmation> {
        let info = self.rpc.get_confirmations(tx_hash).await?;

        debug!(
            "Transaction {} has {} / {} confirmations",
            tx_hash, info.confirmations, CONFIRMATION_THRESHOLD
        );

        Ok(TxConfirmation {
            hash: info.hash,
            confirmations: info.confirmations,
            block_hash: info.block_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(count: u64) -> TxConfirmation {
        TxConfirmation {
            hash: "0xabc".to_string(),
            confirmations: count,
            block_hash: None,
        }
    }

    #[test]
    fn threshold_boundary() {
        assert!(!confirmation(0).confirmed());
        assert!(!confirmation(4).confirmed());
        assert!(confirmation(5).confirmed());
        assert!(confirmation(6).confirmed());
    }
}
