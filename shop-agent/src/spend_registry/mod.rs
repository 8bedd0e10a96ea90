//! Spend registry
//!
//! Writes an on-chain audit record for each paid step via the SpendRegistry
//! contract's `logSpend`. Logging is best-effort: callers get a
//! `Result` back and decide what to do with it, nothing here can revert a
//! payment that has already been made.

mod abi;
mod ledger;
mod logger;
mod types;

pub use abi::{LOG_SPEND_SELECTOR, LOG_SPEND_SIGNATURE, encode_log_spend};
pub use ledger::{EvmSpendLedger, SpendLedger};
pub use logger::SpendLogger;
pub use types::{SpendLogError, SpendLogStatus, SpendRecord};
