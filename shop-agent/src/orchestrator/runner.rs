//! Sequential purchase chain runner

use async_trait::async_trait;
use chrono::Utc;
use paid_tools_types::Price;
use std::sync::Arc;

use super::policy::{EligibilityPolicy, Verdict};
use super::types::{ChainRun, ChainStep, PricedStep, StepDecision, StepReceipt};

pub const OVER_BUDGET: &str = "Over budget";

/// Pays for and performs one step
#[async_trait]
pub trait PaidStepExecutor: Send + Sync {
    /// `run_id` groups the steps of one run for spend log deduplication
    async fn execute(&self, step: &PricedStep, run_id: &str) -> Result<StepReceipt, String>;
}

/// Runs a fixed, ordered list of priced steps against a budget.
///
/// Steps run strictly one after another. A skipped or failed step never
/// stops the chain and never undoes an earlier payment.
pub struct ChainRunner {
    steps: Vec<PricedStep>,
    budget: Price,
    policy: Arc<dyn EligibilityPolicy>,
}

impl ChainRunner {
    pub fn new(steps: Vec<PricedStep>, budget: Price, policy: Arc<dyn EligibilityPolicy>) -> Self {
        Self { steps, budget, policy }
    }

    pub fn steps(&self) -> &[PricedStep] {
        &self.steps
    }

    pub async fn run(&self, executor: &dyn PaidStepExecutor) -> ChainRun {
        self.run_with_id(executor, uuid::Uuid::new_v4().to_string()).await
    }

    pub async fn run_with_id(&self, executor: &dyn PaidStepExecutor, run_id: String) -> ChainRun {
        let mut run = ChainRun {
            run_id,
            steps: self.steps.iter().map(ChainStep::queued).collect(),
            budget: self.budget,
            spent: Price::ZERO,
            remaining: self.budget,
            started_at: Utc::now(),
            finished_at: None,
        };

        log::info!(
            "[Chain] Run {} started: {} steps, budget {}, policy {}",
            run.run_id,
            self.steps.len(),
            self.budget,
            self.policy.name()
        );

        for (index, step) in self.steps.iter().enumerate() {
            if step.price > run.remaining {
                log::info!("[Chain] Skipping '{}': {} > remaining {}", step.id, step.price, run.remaining);
                run.steps[index].finish(StepDecision::Skipped, Some(OVER_BUDGET.to_string()), None);
                continue;
            }

            if let Verdict::Ineligible(reason) = self.policy.evaluate(step) {
                log::info!("[Chain] Skipping '{}': {}", step.id, reason);
                run.steps[index].finish(StepDecision::Skipped, Some(reason), None);
                continue;
            }

            match executor.execute(step, &run.run_id).await {
                Ok(receipt) => {
                    // Affordability was checked above
                    run.remaining = run.remaining.saturating_sub(step.price);
                    run.spent = run.budget.saturating_sub(run.remaining);
                    log::info!("[Chain] Paid '{}' ({}), remaining {}", step.id, step.price, run.remaining);
                    run.steps[index].finish(StepDecision::Paid, None, Some(receipt));
                }
                Err(e) => {
                    log::warn!("[Chain] Step '{}' failed: {}", step.id, e);
                    run.steps[index].finish(StepDecision::Error, Some(e), None);
                }
            }
        }

        run.finished_at = Some(Utc::now());
        log::info!(
            "[Chain] Run {} finished: {:?}, spent {}",
            run.run_id,
            run.outcome(),
            run.spent
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::policy::{AlwaysEligible, IntentScore};
    use crate::orchestrator::types::ChainOutcome;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeExecutor {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        fn failing(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaidStepExecutor for FakeExecutor {
        async fn execute(&self, step: &PricedStep, run_id: &str) -> Result<StepReceipt, String> {
            self.calls.lock().unwrap().push(step.id.clone());
            if self.failing.contains(&step.id) {
                return Err("connection refused".to_string());
            }
            Ok(StepReceipt {
                id: Some(format!("rcpt_{}_{}", step.id, run_id)),
                ..Default::default()
            })
        }
    }

    fn abc() -> Vec<PricedStep> {
        vec![
            PricedStep::new("a", "A", Price::from_minor_units(4)),
            PricedStep::new("b", "B", Price::from_minor_units(7)),
            PricedStep::new("c", "C", Price::from_minor_units(6)),
        ]
    }

    #[tokio::test]
    async fn test_over_budget_step_does_not_block_later_steps() {
        let runner = ChainRunner::new(abc(), Price::from_minor_units(10), Arc::new(AlwaysEligible));
        let executor = FakeExecutor::default();

        let run = runner.run_with_id(&executor, "run-1".to_string()).await;

        assert_eq!(
            run.decisions(),
            vec![StepDecision::Paid, StepDecision::Skipped, StepDecision::Paid]
        );
        assert_eq!(run.steps[1].reason.as_deref(), Some("Over budget"));
        assert_eq!(run.remaining, Price::ZERO);
        assert_eq!(run.spent, Price::from_minor_units(10));
        assert_eq!(executor.calls(), vec!["a", "c"]);
        assert_eq!(run.outcome(), ChainOutcome::Partial);
        assert_eq!(
            run.steps[0].receipt.as_ref().and_then(|r| r.id.as_deref()),
            Some("rcpt_a_run-1")
        );
    }

    #[tokio::test]
    async fn test_failed_step_is_recorded_and_chain_continues() {
        let steps = vec![
            PricedStep::new("a", "A", Price::from_minor_units(1)),
            PricedStep::new("b", "B", Price::from_minor_units(1)),
            PricedStep::new("c", "C", Price::from_minor_units(1)),
        ];
        let runner = ChainRunner::new(steps, Price::from_minor_units(10), Arc::new(AlwaysEligible));
        let executor = FakeExecutor::failing(&["b"]);

        let run = runner.run(&executor).await;

        assert_eq!(
            run.decisions(),
            vec![StepDecision::Paid, StepDecision::Error, StepDecision::Paid]
        );
        assert_eq!(run.steps[1].reason.as_deref(), Some("connection refused"));
        // Failed payment leaves the budget alone, earlier payment stands
        assert_eq!(run.remaining, Price::from_minor_units(8));
        assert_eq!(executor.calls(), vec!["a", "b", "c"]);
        assert!(run.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_policy_rejection_skips_without_spending() {
        let runner = ChainRunner::new(abc(), Price::from_minor_units(100), Arc::new(IntentScore::new(10)));
        let executor = FakeExecutor::default();

        let run = runner.run(&executor).await;

        assert!(run.steps.iter().all(|s| s.decision == StepDecision::Skipped));
        assert!(run.steps.iter().all(|s| s.reason.as_deref() == Some("Intent score too low")));
        assert_eq!(run.remaining, Price::from_minor_units(100));
        assert!(executor.calls().is_empty());
        assert_eq!(run.outcome(), ChainOutcome::Failed);
    }

    #[tokio::test]
    async fn test_all_paid_is_complete() {
        let runner = ChainRunner::new(abc(), Price::from_minor_units(17), Arc::new(AlwaysEligible));
        let run = runner.run(&FakeExecutor::default()).await;

        assert!(run.all_paid());
        assert_eq!(run.outcome(), ChainOutcome::Complete);
        assert_eq!(run.remaining, Price::ZERO);
    }

    #[tokio::test]
    async fn test_each_run_gets_its_own_id() {
        let runner = ChainRunner::new(abc(), Price::ZERO, Arc::new(AlwaysEligible));
        let executor = FakeExecutor::default();
        let first = runner.run(&executor).await;
        let second = runner.run(&executor).await;
        assert_ne!(first.run_id, second.run_id);
    }
}
