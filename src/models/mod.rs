//! Model lookup table and usage accounting
//!
//! Every model the assistant may talk to is listed in [`MODEL_TABLE`] with
//! its price per million tokens. Configuration resolves model names through
//! this table, so an unknown identifier fails at startup instead of during
//! a call.

use crate::error::{HyqaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// What a model is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Chat,
    Embedding,
}

/// One row of the model table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub kind: ModelKind,
    /// USD per 1M input tokens
    pub input_price: f64,
    /// USD per 1M output tokens
    pub output_price: f64,
}

const fn spec(name: &'static str, kind: ModelKind, input: f64, output: f64) -> ModelSpec {
    ModelSpec {
        name,
        kind,
        input_price: input,
        output_price: output,
    }
}

/// Supported models, priced per 1M tokens
pub const MODEL_TABLE: &[ModelSpec] = &[
    spec("gpt-5", ModelKind::Chat, 5.00, 15.00),
    spec("gpt-5-mini", ModelKind::Chat, 1.25, 10.00),
    spec("text-embedding-3-small", ModelKind::Embedding, 0.02, 0.02),
    // Local models cost nothing per token
    spec("llama3.1", ModelKind::Chat, 0.0, 0.0),
    spec("nomic-embed-text", ModelKind::Embedding, 0.0, 0.0),
    spec("all-MiniLM-L6-v2", ModelKind::Embedding, 0.0, 0.0),
    spec("bge-small-en-v1.5", ModelKind::Embedding, 0.0, 0.0),
    spec("bge-base-en-v1.5", ModelKind::Embedding, 0.0, 0.0),
];

/// A resolved model: name plus pricing
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    spec: ModelSpec,
}

impl Model {
    /// Look up a model by identifier
    pub fn resolve(name: &str) -> Result<Self> {
        MODEL_TABLE
            .iter()
            .find(|s| s.name == name)
            .map(|s| Self { spec: *s })
            .ok_or_else(|| HyqaError::UnsupportedModel {
                name: name.to_string(),
                supported: Self::supported(),
            })
    }

    /// Names of every supported model
    pub fn supported() -> Vec<&'static str> {
        MODEL_TABLE.iter().map(|s| s.name).collect()
    }

    pub fn name(&self) -> &str {
        self.spec.name
    }

    pub fn kind(&self) -> ModelKind {
        self.spec.kind
    }

    /// Price a call from its token counters
    pub fn usage(&self, tokens: TokenCounts, elapsed: Duration) -> Usage {
        let input_cost = tokens.input as f64 / 1_000_000.0 * self.spec.input_price;
        let output_cost = tokens.output as f64 / 1_000_000.0 * self.spec.output_price;

        Usage {
            input_tokens: tokens.input,
            output_tokens: tokens.output,
            input_cost,
            output_cost,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

/// Raw token counters reported by a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
}

impl TokenCounts {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }
}

/// Priced usage of one or more service calls
///
/// `Usage::zero()` is the identity of [`Usage::combine`], so usage can be
/// folded across any number of calls, including failed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub elapsed_secs: f64,
}

impl Usage {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn combine(self, other: Usage) -> Usage {
        Usage {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            input_cost: self.input_cost + other.input_cost,
            output_cost: self.output_cost + other.output_cost,
            elapsed_secs: self.elapsed_secs + other.elapsed_secs,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        self.combine(rhs)
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Usage) {
        *self = self.combine(rhs);
    }
}

impl Sum for Usage {
    fn sum<I: Iterator<Item = Usage>>(iter: I) -> Usage {
        iter.fold(Usage::zero(), Usage::combine)
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API calls took {:.2} seconds", self.elapsed_secs)?;
        write!(
            f,
            "Cost: ${:.6} (Input: {} tokens for ${:.6}, Output: {} tokens for ${:.6})",
            self.total_cost(),
            self.input_tokens,
            self.input_cost,
            self.output_tokens,
            self.output_cost
        )
    }
}
