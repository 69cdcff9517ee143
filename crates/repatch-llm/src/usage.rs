//! Running usage and cost ledger.
//!
//! Cost per model round is computed from four independent token counters,
//! each priced at a fixed per-model per-million-token rate. The ledger
//! lives as long as the conversation capability and is shared by reference
//! with callers that read it after each turn.

use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use repatch_core::TokenUsage;

/// USD per million tokens.
#[derive(Debug, Clone, Copy)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

const PRICING: &[(&str, ModelRates)] = &[
    (
        "claude-opus",
        ModelRates {
            input: 15.0,
            output: 75.0,
            cache_write: 18.75,
            cache_read: 1.50,
        },
    ),
    (
        "claude-sonnet",
        ModelRates {
            input: 3.0,
            output: 15.0,
            cache_write: 3.75,
            cache_read: 0.30,
        },
    ),
    (
        "claude-haiku",
        ModelRates {
            input: 0.80,
            output: 4.0,
            cache_write: 1.0,
            cache_read: 0.08,
        },
    ),
];

// Unknown model ids are charged at the mid-tier rate rather than zero.
const FALLBACK_RATES: ModelRates = ModelRates {
    input: 3.0,
    output: 15.0,
    cache_write: 3.75,
    cache_read: 0.30,
};

/// Rates for a model id, matched by family prefix.
pub fn rates_for(model: &str) -> ModelRates {
    PRICING
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, rates)| *rates)
        .unwrap_or(FALLBACK_RATES)
}

/// Cost of one round in USD.
pub fn round_cost(usage: &TokenUsage, rates: &ModelRates) -> f64 {
    (usage.input as f64 * rates.input
        + usage.output as f64 * rates.output
        + usage.cache_write as f64 * rates.cache_write
        + usage.cache_read as f64 * rates.cache_read)
        / 1_000_000.0
}

/// Snapshot of the running ledger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageLedger {
    pub session_cost: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
    pub tokens: TokenUsage,
}

/// Monotonically increasing cost ledger. `record` is called once per
/// completed model round; `reset_session` zeroes only the session-scoped
/// fields. Daily/monthly rollover is the caller's schedule, not ours.
pub struct CostTracker {
    rates: ModelRates,
    inner: Mutex<UsageLedger>,
}

impl CostTracker {
    pub fn new(model: &str) -> Self {
        Self {
            rates: rates_for(model),
            inner: Mutex::new(UsageLedger::default()),
        }
    }

    pub fn record(&self, usage: &TokenUsage) {
        if usage.is_zero() {
            return;
        }
        let cost = round_cost(usage, &self.rates);
        let mut ledger = self.inner.lock().unwrap();
        ledger.session_cost += cost;
        ledger.daily_cost += cost;
        ledger.monthly_cost += cost;
        ledger.tokens.add(usage);
        debug!(
            cost_usd = cost,
            session_usd = ledger.session_cost,
            "recorded model usage"
        );
    }

    pub fn snapshot(&self) -> UsageLedger {
        self.inner.lock().unwrap().clone()
    }

    pub fn reset_session(&self) {
        let mut ledger = self.inner.lock().unwrap();
        ledger.session_cost = 0.0;
        ledger.tokens = TokenUsage::default();
    }
}
