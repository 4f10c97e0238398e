use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sequence::Sequence;

/// Recall condition: same order or reverse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Forward,
    Backward,
}

impl Condition {
    /// The condition that follows this one in a run, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Condition::Forward => Some(Condition::Backward),
            Condition::Backward => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Forward => "Forward Span",
            Condition::Backward => "Backward Span",
        }
    }
}

/// Per-trial presentation phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    /// Waiting for the participant to start the next trial.
    Transition,
    /// Digits are revealed one per interval.
    Showing,
    /// Waiting for the typed response.
    Input,
    /// The last trial of the last condition has been scored.
    Complete,
}

/// A scored presentation-and-response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub sequence: Sequence,
    pub response: String,
    /// Digits matching the expected sequence at the same position.
    pub correct_digits: usize,
    pub fully_correct: bool,
    pub length: usize,
    /// 1-based index within the length.
    pub trial_number: usize,
    pub condition: Condition,
    pub completed_at: DateTime<Utc>,
}
