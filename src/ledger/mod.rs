//! Ledger node access
//!
//! This module provides:
//! - The `LedgerRpc` trait, the full RPC surface the orchestrator consumes
//! - `NodeClient`, a JSON-RPC client with bounded request timeouts
//! - Cached topology and token snapshots with explicit refresh
//! - Confirmation polling

pub mod confirm;
pub mod tokens;
pub mod topology;

pub use confirm::{ConfirmationPoller, TxConfirmation, CONFIRMATION_THRESHOLD};
pub use tokens::{Token, TokenCatalog};
pub use topology::{Chain, ChainMap, ChainTopology};

use crate::error::{TransferError, TransferResult};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Chain entry as returned by the node
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Token entry as returned by the node
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub fungible: bool,
}

/// Confirmation entry as returned by the node
///
/// `block_hash` is the hash of the block that included the transaction,
/// present once the transaction has been mined. Settlement references it.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationInfo {
    pub hash: String,
    pub confirmations: u64,
    #[serde(default, rename = "blockHash")]
    pub block_hash: Option<String>,
}

/// RPC surface consumed from the ledger node
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn get_chains(&self) -> TransferResult<Vec<ChainInfo>>;
    async fn get_tokens(&self) -> TransferResult<Vec<TokenInfo>>;
    async fn send_raw_transaction(&self, signed_hex: &str) -> TransferResult<String>;
    async fn get_confirmations(&self, tx_hash: &str) -> TransferResult<ConfirmationInfo>;
}

/// JSON-RPC client for a ledger node
pub struct NodeClient {
    http: reqwest::Client,
    rpc_url: String,
    request_timeout: Duration,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

impl NodeClient {
    pub fn new(rpc_url: &str, request_timeout: Duration) -> TransferResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransferError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC call with a bounded timeout
    ///
    /// A transport timeout surfaces as `Timeout`, never as a resend.
    async fn call(&self, method: &str, params: Value) -> TransferResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!("RPC call {} (id {})", method, id);

        let request = self.http.post(&self.rpc_url).json(&body).send();
        let response = match timeout(self.request_timeout, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                return Err(TransferError::Rpc {
                    operation: method.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransferError::Timeout {
                    operation: method.to_string(),
                })
            }
        };

        let envelope: RpcEnvelope =
            response.json().await.map_err(|e| TransferError::Rpc {
                operation: method.to_string(),
                message: format!("malformed response: {}", e),
            })?;

        if let Some(err) = envelope.error {
            return Err(TransferError::Rpc {
                operation: method.to_string(),
                message: format!("node error {}: {}", err.code, err.message),
            });
        }

        envelope.result.ok_or_else(|| TransferError::Rpc {
            operation: method.to_string(),
            message: "empty result".to_string(),
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        method: &str,
        value: Value,
    ) -> TransferResult<T> {
        serde_json::from_value(value).map_err(|e| TransferError::Rpc {
            operation: method.to_string(),
            message: format!("malformed result: {}", e),
        })
    }
}

#[async_trait]
impl LedgerRpc for NodeClient {
    async fn get_chains(&self) -> TransferResult<Vec<ChainInfo>> {
        let result = self.call("getChains", json!([])).await?;
        Self::decode("getChains", result)
    }

    async fn get_tokens(&self) -> TransferResult<Vec<TokenInfo>> {
        let result = self.call("getTokens", json!([])).await?;
        Self::decode("getTokens", result)
    }

    async fn send_raw_transaction(&self, signed_hex: &str) -> TransferResult<String> {
        let result = self
            .call("sendRawTransaction", json!([signed_hex]))
            .await?;
        let hash: String = Self::decode("sendRawTransaction", result)?;
        if hash.is_empty() {
            return Err(TransferError::Rpc {
                operation: "sendRawTransaction".to_string(),
                message: "node returned empty transaction hash".to_string(),
            });
        }
        crate::metrics::record_tx_submitted();
        Ok(hash)
    }

    async fn get_confirmations(&self, tx_hash: &str) -> TransferResult<ConfirmationInfo> {
        let result = self.call("getConfirmations", json!([tx_hash])).await?;
        Self::decode("getConfirmations", result)
    }
}
