//! Step eligibility policies
//!
//! The budget check always runs first inside the runner; a policy only adds
//! the business predicate. Inputs are fixed for the whole run.

use paid_tools_types::Price;

use super::types::PricedStep;

/// Intent scores below this are not worth paying for
pub const DEFAULT_INTENT_THRESHOLD: u32 = 65;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Ineligible(String),
}

pub trait EligibilityPolicy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn evaluate(&self, step: &PricedStep) -> Verdict;
}

/// Pays for every affordable step
pub struct AlwaysEligible;

impl EligibilityPolicy for AlwaysEligible {
    fn name(&self) -> &'static str {
        "always"
    }

    fn evaluate(&self, _step: &PricedStep) -> Verdict {
        Verdict::Eligible
    }
}

pub struct MinCartValue {
    pub cart_subtotal: Price,
    pub min_cart_value: Price,
}

impl EligibilityPolicy for MinCartValue {
    fn name(&self) -> &'static str {
        "min_cart_value"
    }

    fn evaluate(&self, _step: &PricedStep) -> Verdict {
        if self.cart_subtotal < self.min_cart_value {
            Verdict::Ineligible("Cart below minimum".to_string())
        } else {
            Verdict::Eligible
        }
    }
}

pub struct IntentScore {
    pub score: u32,
    pub threshold: u32,
}

impl IntentScore {
    pub fn new(score: u32) -> Self {
        Self {
            score,
            threshold: DEFAULT_INTENT_THRESHOLD,
        }
    }
}

impl EligibilityPolicy for IntentScore {
    fn name(&self) -> &'static str {
        "intent_score"
    }

    fn evaluate(&self, _step: &PricedStep) -> Verdict {
        if self.score < self.threshold {
            Verdict::Ineligible("Intent score too low".to_string())
        } else {
            Verdict::Eligible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> PricedStep {
        PricedStep::new("quote", "Dynamic Price Quote", Price::from_minor_units(400))
    }

    #[test]
    fn test_min_cart_value() {
        let policy = MinCartValue {
            cart_subtotal: Price::parse_decimal("19.99").unwrap(),
            min_cart_value: Price::parse_decimal("20").unwrap(),
        };
        assert_eq!(policy.evaluate(&step()), Verdict::Ineligible("Cart below minimum".to_string()));

        let policy = MinCartValue {
            cart_subtotal: Price::parse_decimal("20").unwrap(),
            min_cart_value: Price::parse_decimal("20").unwrap(),
        };
        assert_eq!(policy.evaluate(&step()), Verdict::Eligible);
    }

    #[test]
    fn test_intent_score_threshold() {
        assert_eq!(IntentScore::new(64).evaluate(&step()), Verdict::Ineligible("Intent score too low".to_string()));
        assert_eq!(IntentScore::new(65).evaluate(&step()), Verdict::Eligible);
    }
}
