//! Shardflow - transfer orchestration for a sharded ledger
//!
//! Moves tokens between chains of one ledger by routing through the
//! chain tree, submitting one hop at a time and settling the final hop
//! on the destination chain. Progress is driven entirely by caller
//! polls; nothing is retried or resubmitted automatically.

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod routing;
pub mod tx;

pub use error::{TransferError, TransferResult};
