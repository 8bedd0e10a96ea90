//! Purchase chain orchestration
//!
//! Runs quote -> reserve -> checkout -> fulfill against a budget. Each step is
//! checked against the remaining budget, then the eligibility policy, then
//! paid through a `PaidStepExecutor`. The resulting `ChainRun` is the full
//! audit trace; the caller decides what a partial run means.

mod policy;
mod runner;
mod tools;
mod types;

pub use policy::{AlwaysEligible, DEFAULT_INTENT_THRESHOLD, EligibilityPolicy, IntentScore, MinCartValue, Verdict};
pub use runner::{ChainRunner, OVER_BUDGET, PaidStepExecutor};
pub use tools::ToolsEndpoint;
pub use types::{ChainOutcome, ChainRun, ChainStep, PricedStep, StepDecision, StepReceipt, default_steps};
