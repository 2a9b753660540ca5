//! Transfer state machine
//!
//! Drives a transfer from request to completion: validate, compute the
//! route, submit the first hop, then advance one step per caller-driven
//! poll. Waiting is never done inside the orchestrator; callers re-invoke
//! `poll` on their own schedule. A confirmed or submitted transaction is
//! never re-sent.

use crate::config::TxConfig;
use crate::error::{TransferError, TransferResult};
use crate::ledger::{ChainTopology, ConfirmationPoller, LedgerRpc, Token, TokenCatalog};
use crate::orchestrator::cache::AccountCache;
use crate::orchestrator::session::{
    PendingTransfer, SessionStore, SettlementDescriptor, TransferDescriptor, TransferPhase,
    TransferPlan,
};
use crate::routing;
use crate::tx::{amount, SignedTransaction, TransactionBuilder, TransferSigner};

use std::sync::Arc;
use tracing::{info, warn};

/// A request to move an asset between two chains
pub struct TransferRequest<'a> {
    pub signer: &'a TransferSigner,
    pub destination: String,
    pub source_chain: String,
    pub destination_chain: String,
    pub symbol: String,
    /// Decimal amount for fungible tokens, identifier otherwise
    pub amount_or_id: String,
    pub fungible: bool,
}

/// Outcome of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    HopConfirming {
        tx_hash: String,
        hop_index: usize,
        confirmations: u64,
    },
    SettlementConfirming {
        tx_hash: String,
        confirmations: u64,
    },
    Completed,
}

/// Orchestrates transfers for one ledger, one record per principal
pub struct TransferOrchestrator {
    rpc: Arc<dyn LedgerRpc>,
    topology: Arc<ChainTopology>,
    tokens: Arc<TokenCatalog>,
    sessions: Arc<dyn SessionStore>,
    cache: Arc<AccountCache>,
    builder: TransactionBuilder,
    poller: ConfirmationPoller,
}

impl TransferOrchestrator {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        topology: Arc<ChainTopology>,
        tokens: Arc<TokenCatalog>,
        sessions: Arc<dyn SessionStore>,
        cache: Arc<AccountCache>,
        tx_config: &TxConfig,
    ) -> Self {
        Self {
            poller: ConfirmationPoller::new(rpc.clone()),
            rpc,
            topology,
            tokens,
            sessions,
            cache,
            builder: TransactionBuilder::new(tx_config),
        }
    }

    /// Validate the request, compute the route, and submit the first hop
    ///
    /// Fails before any network call on bad input, and before building any
    /// transaction when no route exists. Rejected while the principal
    /// already has a pending transfer.
    pub async fn start(&self, request: TransferRequest<'_>) -> TransferResult<String> {
        let principal = request.signer.address();

        if self.sessions.get(&principal).await?.is_some() {
            return Err(TransferError::TransferInProgress { principal });
        }

        let token = self.validate(&request).await?;

        let snapshot = self.topology.snapshot().await;
        let route = routing::find_path(&snapshot, &request.source_chain, &request.destination_chain)?;

        let transfer = TransferDescriptor {
            fungible: request.fungible,
            destination: request.destination.clone(),
            symbol: request.symbol.clone(),
            amount_or_id: request.amount_or_id.clone(),
        };

        let tx = if route.len() == 1 {
            self.builder.same_chain_transfer(
                request.signer,
                &route[0],
                &transfer.destination,
                &token,
                &transfer.amount_or_id,
            )?
        } else {
            let next_address = &snapshot[&route[1]].address;
            self.builder.cross_chain_hop(
                request.signer,
                &route[0],
                next_address,
                &transfer.destination,
                &token,
                &transfer.amount_or_id,
            )?
        };

        // Reserve the principal's slot before submitting so a concurrent
        // start cannot produce two conflicting transfers
        let mut record = PendingTransfer {
            principal: principal.clone(),
            plan: TransferPlan {
                route: route.clone(),
                hop_index: 0,
            },
            transfer,
            last_tx_hash: String::new(),
            hop_confirmed: false,
            hop_block_hash: None,
            settlement: None,
            phase: TransferPhase::HopConfirming,
            completed: false,
        };
        self.sessions.create(record.clone()).await?;

        let hash = match self.submit(&tx).await {
            Ok(hash) => hash,
            Err(e) => {
                // Nothing reached the chain; release the slot so the
                // caller can retry the start
                self.sessions.remove(&principal).await?;
                return Err(e);
            }
        };

        record.last_tx_hash = hash.clone();
        self.sessions.put(record).await?;

        crate::metrics::record_transfer_started(route.len() > 1);
        info!(
            "Transfer started for {}: route {:?}, tx {}",
            principal, route, hash
        );

        Ok(hash)
    }

    /// Advance the transfer by at most one step
    ///
    /// Safe to call any number of times: while the awaited transaction is
    /// unconfirmed this is a read-only no-op.
    pub async fn poll(
        &self,
        principal: &str,
        signer: &TransferSigner,
    ) -> TransferResult<PollStatus> {
        let record = self
            .sessions
            .get(principal)
            .await?
            .ok_or_else(|| TransferError::NoPendingTransfer {
                principal: principal.to_string(),
            })?;

        match record.phase {
            TransferPhase::HopConfirming => self.poll_hop(record, signer).await,
            TransferPhase::SettlementConfirming => self.poll_settlement(record).await,
        }
    }

    /// Discard local tracking state for the principal's transfer
    ///
    /// Has no on-chain effect; a submitted transaction cannot be cancelled.
    pub async fn abandon(&self, principal: &str) -> TransferResult<()> {
        if self.sessions.get(principal).await?.is_none() {
            return Err(TransferError::NoPendingTransfer {
                principal: principal.to_string(),
            });
        }

        self.sessions.remove(principal).await?;
        crate::metrics::record_transfer_abandoned();
        warn!("Transfer abandoned for {}", principal);
        Ok(())
    }

    /// Build and submit a name registration transaction
    pub async fn register_name(
        &self,
        signer: &TransferSigner,
        chain: &str,
        name: &str,
    ) -> TransferResult<String> {
        self.topology.get(chain).await?;
        let tx = self.builder.register_name(signer, chain, name)?;
        let hash = self.submit(&tx).await?;
        info!("Name '{}' registration submitted: {}", name, hash);
        Ok(hash)
    }

    async fn poll_hop(
        &self,
        mut record: PendingTransfer,
        signer: &TransferSigner,
    ) -> TransferResult<PollStatus> {
        // Skip the confirmation query when the hop is already known to be
        // confirmed and only the follow-up submission is owed
        if !record.hop_confirmed {
            let conf = self.poller.confirmations(&record.last_tx_hash).await?;

            if !conf.confirmed() {
                return Ok(PollStatus::HopConfirming {
                    tx_hash: record.last_tx_hash,
                    hop_index: record.plan.hop_index,
                    confirmations: conf.confirmations,
                });
            }

            record.hop_confirmed = true;
            record.hop_block_hash = conf.block_hash;
            self.sessions.put(record.clone()).await?;
        }

        if !record.plan.is_cross_chain() {
            return self.complete(record).await;
        }

        if record.plan.is_last_hop() {
            self.submit_settlement(record, signer).await
        } else {
            self.submit_next_hop(record, signer).await
        }
    }

    async fn submit_next_hop(
        &self,
        mut record: PendingTransfer,
        signer: &TransferSigner,
    ) -> TransferResult<PollStatus> {
        let token = self.tokens.get_by_symbol(&record.transfer.symbol).await?;
        let next_index = record.plan.hop_index + 1;
        let hop_chain = record.plan.route[next_index].clone();
        let target_chain = self.topology.get(&record.plan.route[next_index + 1]).await?;

        let tx = self.builder.cross_chain_hop(
            signer,
            &hop_chain,
            &target_chain.address,
            &record.transfer.destination,
            &token,
            &record.transfer.amount_or_id,
        )?;

        // A failure here leaves the record untouched with the previous hop
        // marked confirmed; the next poll rebuilds and resubmits this hop
        let hash = self.submit(&tx).await?;

        record.plan.hop_index = next_index;
        record.last_tx_hash = hash.clone();
        record.hop_confirmed = false;
        record.hop_block_hash = None;
        self.sessions.put(record).await?;

        crate::metrics::record_hop_submitted();
        info!("Hop {} submitted on {}: {}", next_index, hop_chain, hash);

        Ok(PollStatus::HopConfirming {
            tx_hash: hash,
            hop_index: next_index,
            confirmations: 0,
        })
    }

    async fn submit_settlement(
        &self,
        mut record: PendingTransfer,
        signer: &TransferSigner,
    ) -> TransferResult<PollStatus> {
        let route = &record.plan.route;
        let source_chain = self.topology.get(&route[route.len() - 2]).await?;
        let destination_chain = self.topology.get(&route[route.len() - 1]).await?;

        let block_hash = record
            .hop_block_hash
            .clone()
            .ok_or_else(|| TransferError::Rpc {
                operation: "getConfirmations".to_string(),
                message: "confirmed hop carried no block hash".to_string(),
            })?;

        let tx = self.builder.settlement(
            signer,
            &destination_chain.name,
            &source_chain.address,
            &block_hash,
        )?;

        let hash = self.submit(&tx).await?;

        record.settlement = Some(SettlementDescriptor {
            source_chain_address: source_chain.address,
            destination_chain_address: destination_chain.address,
        });
        record.last_tx_hash = hash.clone();
        record.phase = TransferPhase::SettlementConfirming;
        record.hop_confirmed = false;
        self.sessions.put(record).await?;

        crate::metrics::record_settlement_submitted();
        info!(
            "Settlement submitted on {}: {}",
            destination_chain.name, hash
        );

        Ok(PollStatus::SettlementConfirming {
            tx_hash: hash,
            confirmations: 0,
        })
    }

    async fn poll_settlement(&self, record: PendingTransfer) -> TransferResult<PollStatus> {
        // After the hops confirmed the asset has left the source chain;
        // failures here are settlement errors, retryable on their own
        let conf = self
            .poller
            .confirmations(&record.last_tx_hash)
            .await
            .map_err(|e| TransferError::Settlement(e.to_string()))?;

        if !conf.confirmed() {
            return Ok(PollStatus::SettlementConfirming {
                tx_hash: record.last_tx_hash,
                confirmations: conf.confirmations,
            });
        }

        self.complete(record).await
    }

    async fn complete(&self, mut record: PendingTransfer) -> TransferResult<PollStatus> {
        record.completed = true;
        self.sessions.remove(&record.principal).await?;
        self.cache.invalidate(&record.principal);

        crate::metrics::record_transfer_completed();
        info!(
            "Transfer completed for {}: {} hop(s)",
            record.principal,
            record.plan.hop_count().max(1)
        );

        Ok(PollStatus::Completed)
    }

    async fn validate(&self, request: &TransferRequest<'_>) -> TransferResult<Token> {
        let token = self.tokens.get_by_symbol(&request.symbol).await?;

        if token.fungible != request.fungible {
            return Err(TransferError::Validation(format!(
                "token {} fungibility mismatch",
                token.symbol
            )));
        }

        if request.destination.is_empty() {
            return Err(TransferError::Validation(
                "destination address is empty".to_string(),
            ));
        }

        // Parse strictly up front so no network call happens on bad input
        if token.fungible {
            amount::to_fixed(&request.amount_or_id, token.decimals)?;
        } else {
            amount::parse_token_id(&request.amount_or_id)?;
        }

        self.topology.get(&request.source_chain).await?;
        self.topology.get(&request.destination_chain).await?;

        Ok(token)
    }

    async fn submit(&self, tx: &SignedTransaction) -> TransferResult<String> {
        self.rpc.send_raw_transaction(&tx.raw_hex()).await
    }
}
