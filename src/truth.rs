//! Probabilistic truth values.
//!
//! A [`TruthValue`] is a (strength, count) pair: strength is the probability
//! in [0, 1] that the judged statement holds, count is the amount of evidence
//! behind it. Confidence is derived from count as `count / (count + K)`.

use serde::{Deserialize, Serialize};

/// Evidence lookahead used to turn a count into a confidence.
pub const DEFAULT_K: f64 = 800.0;

/// Count assigned to crisp judgments; its confidence rounds to 1.0.
pub const CRISP_COUNT: f64 = 1.0e35;

/// A strength/count probabilistic boolean judgment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    strength: f64,
    count: f64,
}

impl TruthValue {
    /// Crisp true: strength 1.0, maximal confidence.
    pub const TRUE: TruthValue = TruthValue {
        strength: 1.0,
        count: CRISP_COUNT,
    };

    /// Crisp false: strength 0.0, maximal confidence.
    pub const FALSE: TruthValue = TruthValue {
        strength: 0.0,
        count: CRISP_COUNT,
    };

    /// No evidence either way.
    pub const DEFAULT: TruthValue = TruthValue {
        strength: 0.0,
        count: 0.0,
    };

    /// Create a truth value, clamping strength to [0, 1] and count to >= 0.
    pub fn new(strength: f64, count: f64) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            count: count.max(0.0),
        }
    }

    /// Create a truth value from a confidence in [0, 1) instead of a count.
    pub fn from_confidence(strength: f64, confidence: f64) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let count = if confidence >= 1.0 {
            CRISP_COUNT
        } else {
            DEFAULT_K * confidence / (1.0 - confidence)
        };
        Self::new(strength, count)
    }

    /// Crisp value for a boolean outcome.
    pub fn crisp(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn count(&self) -> f64 {
        self.count
    }

    /// Confidence in [0, 1] derived from the evidence count.
    pub fn confidence(&self) -> f64 {
        self.count / (self.count + DEFAULT_K)
    }

    /// Complement: strength becomes `1 - strength`, count is unchanged.
    pub fn negate(&self) -> Self {
        Self {
            strength: 1.0 - self.strength,
            count: self.count,
        }
    }

    /// Whether this is the evidence-free default.
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(stv {} {:.4})", self.strength, self.confidence())
    }
}
