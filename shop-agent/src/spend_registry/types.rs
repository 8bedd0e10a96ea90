//! Spend registry data types

use ethers::types::{Address, H256, U256};
use paid_tools_types::Price;
use serde::Serialize;
use thiserror::Error;

use crate::nonce::NonceError;

/// One audit entry destined for the SpendRegistry contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendRecord {
    pub step_id: String,
    /// Amount in the payment asset's minor units
    pub amount: Price,
    pub memo: String,
    pub payer: Address,
    /// Process-local dedupe key, "{step_id}:{order_ref}"
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum SpendLogError {
    #[error(transparent)]
    Nonce(#[from] NonceError),
    #[error("spend submission with nonce {nonce} failed: {reason}")]
    Submission { nonce: U256, reason: String },
}

/// Result of a spend log call, as surfaced to callers that care
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SpendLogStatus {
    Logged { tx_hash: H256 },
    Failed { reason: String },
    Disabled,
}

impl SpendLogStatus {
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            SpendLogStatus::Logged { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}

impl From<&Result<H256, SpendLogError>> for SpendLogStatus {
    fn from(result: &Result<H256, SpendLogError>) -> Self {
        match result {
            Ok(tx_hash) => SpendLogStatus::Logged { tx_hash: *tx_hash },
            Err(e) => SpendLogStatus::Failed { reason: e.to_string() },
        }
    }
}
