//! Purchase chain data types

use chrono::{DateTime, Utc};
use ethers::types::H256;
use paid_tools_types::{Price, default_catalog};
use serde::{Deserialize, Serialize};

/// One billable unit of work in the purchase chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedStep {
    pub id: String,
    pub display_name: String,
    pub price: Price,
}

impl PricedStep {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            price,
        }
    }
}

/// quote -> reserve -> checkout -> fulfill, priced from the shared catalog
pub fn default_steps() -> Vec<PricedStep> {
    default_catalog()
        .into_iter()
        .map(|tool| PricedStep::new(tool.id, tool.name, tool.price))
        .collect()
}

/// What happened to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDecision {
    /// Not processed yet
    Queued,
    Paid,
    /// Ineligible; budget untouched
    Skipped,
    /// Payment attempted and failed; budget untouched
    Error,
}

impl std::fmt::Display for StepDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDecision::Queued => write!(f, "queued"),
            StepDecision::Paid => write!(f, "paid"),
            StepDecision::Skipped => write!(f, "skipped"),
            StepDecision::Error => write!(f, "error"),
        }
    }
}

/// Proof that a step was paid for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReceipt {
    /// Receipt id issued by the tool server
    pub id: Option<String>,
    pub paid_at: Option<String>,
    /// Settlement reference from the payment-response header
    pub settlement_tx: Option<String>,
    /// Spend registry transaction, when spend logging is on and succeeded
    pub spend_tx: Option<H256>,
}

/// Trace entry for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStep {
    pub step_id: String,
    pub name: String,
    pub price: Price,
    pub decision: StepDecision,
    /// Skip reason or error detail
    pub reason: Option<String>,
    pub receipt: Option<StepReceipt>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ChainStep {
    pub fn queued(step: &PricedStep) -> Self {
        Self {
            step_id: step.id.clone(),
            name: step.display_name.clone(),
            price: step.price,
            decision: StepDecision::Queued,
            reason: None,
            receipt: None,
            finished_at: None,
        }
    }

    pub(crate) fn finish(&mut self, decision: StepDecision, reason: Option<String>, receipt: Option<StepReceipt>) {
        self.decision = decision;
        self.reason = reason;
        self.receipt = receipt;
        self.finished_at = Some(Utc::now());
    }
}

/// Overall result, derived from the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOutcome {
    /// Every step paid
    Complete,
    /// Some steps paid
    Partial,
    /// Nothing paid, or nothing to pay for
    Failed,
}

/// Full trace of one run. Always complete once `ChainRunner::run` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRun {
    pub run_id: String,
    pub steps: Vec<ChainStep>,
    pub budget: Price,
    pub spent: Price,
    pub remaining: Price,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ChainRun {
    pub fn all_paid(&self) -> bool {
        self.steps.iter().all(|s| s.decision == StepDecision::Paid)
    }

    pub fn count(&self, decision: StepDecision) -> usize {
        self.steps.iter().filter(|s| s.decision == decision).count()
    }

    pub fn decisions(&self) -> Vec<StepDecision> {
        self.steps.iter().map(|s| s.decision).collect()
    }

    pub fn outcome(&self) -> ChainOutcome {
        if self.steps.is_empty() {
            ChainOutcome::Failed
        } else if self.all_paid() {
            ChainOutcome::Complete
        } else if self.count(StepDecision::Paid) > 0 {
            ChainOutcome::Partial
        } else {
            ChainOutcome::Failed
        }
    }
}
