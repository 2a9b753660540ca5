pub mod cache;
pub mod engine;
pub mod session;

pub use cache::{AccountCache, AccountView, Holding, TxSummary};
pub use engine::{PollStatus, TransferOrchestrator, TransferRequest};
pub use session::{
    MemorySessionStore, PendingTransfer, SessionStore, SettlementDescriptor, TransferDescriptor,
    TransferPhase, TransferPlan,
};
