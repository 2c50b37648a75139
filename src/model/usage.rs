//! Token usage and per-step cost accounting
//!
//! Every AI call reports its token counts. Cost is accumulated into the
//! invoking step's own counter; there is no subsystem-level running total,
//! the external caller sums the step reports.

use serde::{Deserialize, Serialize};

/// Token counts reported by a single AI call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Usage accumulated by one pipeline step across its AI calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub ai_calls: usize,
}

impl StepUsage {
    /// Records one AI call at the given prices (USD per million tokens)
    pub fn record(&mut self, usage: TokenUsage, input_price: f64, output_price: f64) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.cost_usd += usage.input_tokens as f64 / 1_000_000.0 * input_price
            + usage.output_tokens as f64 / 1_000_000.0 * output_price;
        self.ai_calls += 1;
    }
}
