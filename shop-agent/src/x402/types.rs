//! x402 client-side types
//!
//! Wire types live in `paid_tools_types`; this file holds what only the
//! paying side needs.

use ethers::types::H256;
use paid_tools_types::{PaymentPayload, Price, SettleResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::spend_registry::SpendLogStatus;

/// Per-call payment constraints
#[derive(Debug, Clone, Default)]
pub struct PaymentOptions {
    /// Refuse to sign for more than this
    pub max_amount: Option<Price>,
    /// Groups the spend logs of one purchase chain; used as the idempotency
    /// key suffix ("{step_id}:{order_ref}")
    pub order_ref: Option<String>,
}

/// Final response of a `post_with_payment` call
#[derive(Debug, Clone)]
pub struct PaidResponse {
    pub status: u16,
    pub body: Value,
    /// `None` when the first request succeeded without a challenge
    pub payment: Option<PaymentOutcome>,
}

/// What was paid and how the side effects went
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub step_id: String,
    pub amount: Price,
    /// Advisory only; missing or undecodable settlement never fails a payment
    pub settlement: Option<SettleResponse>,
    pub spend: SpendLogStatus,
}

impl PaymentOutcome {
    pub fn spend_tx(&self) -> Option<H256> {
        self.spend.tx_hash()
    }

    pub fn settlement_tx(&self) -> Option<String> {
        self.settlement.as_ref().and_then(|s| s.transaction.clone())
    }
}

/// Signed proof for one step, ready to attach to the retry
#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub step_id: String,
    pub amount: Price,
    pub payload: PaymentPayload,
}

#[derive(Debug, Error)]
pub enum X402Error {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed payment challenge: {0}")]
    MalformedChallenge(String),
    #[error("no accepted payment option for network {network}")]
    NoAcceptedScheme { network: String },
    #[error("payment option is for '{found}', challenge was for '{expected}'")]
    StepMismatch { expected: String, found: String },
    #[error("payment option asks {requested} minor units, challenge priced {challenged}")]
    PriceMismatch { challenged: u64, requested: u64 },
    #[error("price {price} exceeds limit {limit}")]
    PriceAboveLimit { price: Price, limit: Price },
    #[error("failed to sign payment: {0}")]
    Signing(String),
    #[error("payment rejected with {status}: {body}")]
    PaymentRejected { status: u16, body: String },
    #[error("server asked for payment again for '{step}'")]
    ChallengeRepeated { step: String },
}
