//! Transaction assembly, signing, and amount conversion

pub mod amount;
pub mod builder;
pub mod script;

pub use builder::{SignedTransaction, TransactionBuilder, TransferSigner};
pub use script::{Script, ScriptArg, ScriptOp};
