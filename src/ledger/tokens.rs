//! Token catalog snapshot
//!
//! Same refresh contract as the chain topology: `load()` replaces the
//! cached snapshot, lookups never trigger network calls.

use crate::error::{TransferError, TransferResult};
use crate::ledger::LedgerRpc;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Token metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub fungible: bool,
}

/// Cached token catalog with explicit refresh
pub struct TokenCatalog {
    rpc: Arc<dyn LedgerRpc>,
    tokens: RwLock<HashMap<String, Token>>,
}

impl TokenCatalog {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the current token list and replace the cached snapshot atomically
    pub async fn load(&self) -> TransferResult<()> {
        let entries = self.rpc.get_tokens().await?;

        let tokens: HashMap<String, Token> = entries
            .into_iter()
            .map(|e| {
                (
                    e.symbol.clone(),
                    Token {
                        symbol: e.symbol,
                        name: e.name,
                        decimals: e.decimals,
                        fungible: e.fungible,
                    },
                )
            })
            .collect();

        let count = tokens.len();
        *self.tokens.write().await = tokens;
        info!("Loaded token catalog with {} tokens", count);
        Ok(())
    }

    /// Get a token by symbol from the cached snapshot
    pub async fn get_by_symbol(&self, symbol: &str) -> TransferResult<Token> {
        self.tokens
            .read()
            .await
            .get(symbol)
            .cloned()
            .ok_or_else(|| TransferError::TokenNotFound(symbol.to_string()))
    }

    pub async fn is_loaded(&self) -> bool {
        !self.tokens.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ChainInfo, ConfirmationInfo, TokenInfo};
    use async_trait::async_trait;

    struct StaticLedger(Vec<TokenInfo>);

    #[async_trait]
    impl LedgerRpc for StaticLedger {
        async fn get_chains(&self) -> TransferResult<Vec<ChainInfo>> {
            Ok(vec![])
        }
        async fn get_tokens(&self) -> TransferResult<Vec<TokenInfo>> {
            Ok(self.0.clone())
        }
        async fn send_raw_transaction(&self, _signed_hex: &str) -> TransferResult<String> {
            unreachable!()
        }
        async fn get_confirmations(&self, _tx_hash: &str) -> TransferResult<ConfirmationInfo> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn lookup_after_load() {
        let catalog = TokenCatalog::new(Arc::new(StaticLedger(vec![TokenInfo {
            symbol: "SOUL".to_string(),
            name: "Soul".to_string(),
            decimals: 8,
            fungible: true,
        }])));
        catalog.load().await.unwrap();

        let token = catalog.get_by_symbol("SOUL").await.unwrap();
        assert_eq!(token.decimals, 8);
        assert!(token.fungible);

        let err = catalog.get_by_symbol("GHOST").await.unwrap_err();
        assert!(matches!(err, TransferError::TokenNotFound(_)));
    }
}
