//! Confidence thresholds and feedback arithmetic.
//!
//! A pattern's confidence gates its eligibility under the selected
//! aggressiveness mode. Feedback nudges confidence up slowly and down
//! faster; scores are always clamped to [0, 1]. Patterns drifting below
//! the disable threshold are swept to zero rather than deleted.

use serde::{Deserialize, Serialize};

use super::models::ConfidenceAdjustment;

/// Confidence bump for a satisfied feedback event.
pub const POSITIVE_DELTA: f64 = 0.01;

/// Confidence cut for an unsatisfied feedback event.
pub const NEGATIVE_DELTA: f64 = -0.03;

/// Patterns below this score are candidates for the auto-disable sweep.
pub const DISABLE_THRESHOLD: f64 = 0.30;

/// Fixed minimum confidence for prefix (Pass 0) rules, independent of mode.
pub const PREFIX_MIN_CONFIDENCE: f64 = 0.50;

/// Aggressiveness mode selecting the minimum confidence for Pass 1/2 rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Only well-proven rules (>= 0.85).
    Conservative,
    /// Balanced rule set (>= 0.70).
    #[default]
    Default,
    /// Everything not effectively disabled (>= 0.40).
    Aggressive,
}

impl CompressionMode {
    /// Minimum confidence a pattern needs to be loaded under this mode.
    pub fn min_confidence(self) -> f64 {
        match self {
            Self::Conservative => 0.85,
            Self::Default => 0.70,
            Self::Aggressive => 0.40,
        }
    }
}

/// Clamp a confidence score to [0, 1].
pub fn clamp(confidence: f64) -> f64 {
    confidence.clamp(0.0, 1.0)
}

/// Feedback delta for one event.
pub fn feedback_delta(satisfied: bool) -> f64 {
    if satisfied {
        POSITIVE_DELTA
    } else {
        NEGATIVE_DELTA
    }
}

/// Audit reason recorded for one feedback event.
pub fn feedback_reason(satisfied: bool) -> &'static str {
    if satisfied {
        "positive feedback"
    } else {
        "negative feedback"
    }
}

/// Describe a persisted confidence mutation as reported to the caller.
pub fn adjustment(
    pattern_id: i64,
    old_confidence: f64,
    new_confidence: f64,
    satisfied: bool,
) -> ConfidenceAdjustment {
    ConfidenceAdjustment {
        pattern_id,
        old_confidence,
        new_confidence,
        delta: new_confidence - old_confidence,
        reason: feedback_reason(satisfied).to_string(),
    }
}
