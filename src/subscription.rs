// Subscription checkout placeholder.
// No payment processor is wired up yet: every checkout reports that
// subscriptions are not active after a short simulated delay.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Annual => "annual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Some(Plan::Monthly),
            "annual" | "yearly" | "year" => Some(Plan::Annual),
            _ => None,
        }
    }

    /// Listed price in the account currency
    pub fn price(&self) -> f64 {
        match self {
            Plan::Monthly => 29.0,
            Plan::Annual => 290.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    NotYetActive { plan: Plan, message: String },
}

pub struct CheckoutStub {
    delay: Duration,
}

impl CheckoutStub {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn start(&self, plan: Plan) -> CheckoutOutcome {
        log::info!("checkout requested for {} plan (stub)", plan.as_str());
        std::thread::sleep(self.delay);
        CheckoutOutcome::NotYetActive {
            plan,
            message: "Online subscriptions are not available yet. We'll let you know as soon as checkout opens."
                .to_string(),
        }
    }
}
