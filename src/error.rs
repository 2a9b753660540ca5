//! Error types for the transfer orchestrator

use thiserror::Error;

/// Main error type for transfer orchestration
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Chain {0} not found")]
    ChainNotFound(String),

    #[error("Token {0} not found")]
    TokenNotFound(String),

    #[error("No route between chain {from} and chain {to}")]
    RouteNotFound { from: String, to: String },

    #[error("RPC error during {operation}: {message}")]
    Rpc { operation: String, message: String },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Settlement error: {0}")]
    Settlement(String),

    #[error("A transfer is already pending for {principal}")]
    TransferInProgress { principal: String },

    #[error("No pending transfer for {principal}")]
    NoPendingTransfer { principal: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Check if the failed operation can be retried from the last
    /// recorded step without duplicating on-chain effects
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::Rpc { .. }
                | TransferError::Timeout { .. }
                | TransferError::Settlement(_)
        )
    }

    /// Stable kind label, used for metrics and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Config(_) => "config",
            TransferError::Validation(_) => "validation",
            TransferError::ChainNotFound(_) => "chain_not_found",
            TransferError::TokenNotFound(_) => "token_not_found",
            TransferError::RouteNotFound { .. } => "route_not_found",
            TransferError::Rpc { .. } => "rpc",
            TransferError::Timeout { .. } => "timeout",
            TransferError::Settlement(_) => "settlement",
            TransferError::TransferInProgress { .. } => "transfer_in_progress",
            TransferError::NoPendingTransfer { .. } => "no_pending_transfer",
            TransferError::Internal(_) => "internal",
        }
    }
}

/// Result type for orchestrator operations
pub type TransferResult<T> = Result<T, TransferError>;
