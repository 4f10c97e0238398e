use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trial::{Condition, Trial};

/// Aggregate scores for one recall condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub total_responses: usize,
    pub total_correct: usize,
    /// Longest length with at least one fully correct trial, 0 if none.
    pub max_span: usize,
    /// Sum of sequence lengths presented.
    pub digits_shown: usize,
    /// Sum of positionally correct digits.
    pub digits_correct: usize,
}

impl ConditionSummary {
    pub fn from_trials(trials: &[Trial]) -> Self {
        let correct = trials.iter().filter(|t| t.fully_correct);
        Self {
            total_responses: trials.len(),
            total_correct: correct.clone().count(),
            max_span: correct.map(|t| t.length).max().unwrap_or(0),
            digits_shown: trials.iter().map(|t| t.length).sum(),
            digits_correct: trials.iter().map(|t| t.correct_digits).sum(),
        }
    }

    /// Percentage of fully correct trials.
    pub fn trial_accuracy(&self) -> f64 {
        percent(self.total_correct, self.total_responses)
    }

    /// Percentage of presented digits placed in the right position.
    pub fn digit_accuracy(&self) -> f64 {
        percent(self.digits_correct, self.digits_shown)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Final record of a completed run. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub participant_id: String,
    pub forward_trials: Vec<Trial>,
    pub backward_trials: Vec<Trial>,
    pub forward: ConditionSummary,
    pub backward: ConditionSummary,
    pub completed_at: DateTime<Utc>,
}

impl TestResults {
    pub fn compile(
        participant_id: impl Into<String>,
        forward_trials: Vec<Trial>,
        backward_trials: Vec<Trial>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let forward = ConditionSummary::from_trials(&forward_trials);
        let backward = ConditionSummary::from_trials(&backward_trials);
        Self {
            participant_id: participant_id.into(),
            forward_trials,
            backward_trials,
            forward,
            backward,
            completed_at,
        }
    }

    pub fn summary(&self, condition: Condition) -> &ConditionSummary {
        match condition {
            Condition::Forward => &self.forward,
            Condition::Backward => &self.backward,
        }
    }

    pub fn trials(&self, condition: Condition) -> &[Trial] {
        match condition {
            Condition::Forward => &self.forward_trials,
            Condition::Backward => &self.backward_trials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    fn trial(length: usize, correct_digits: usize, fully_correct: bool) -> Trial {
        Trial {
            sequence: Sequence::new((0..length as u8).collect()).unwrap(),
            response: String::new(),
            correct_digits,
            fully_correct,
            length,
            trial_number: 1,
            condition: Condition::Forward,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn max_span_is_zero_without_full_credit() {
        let summary = ConditionSummary::from_trials(&[trial(2, 1, false), trial(3, 2, false)]);
        assert_eq!(summary.max_span, 0);
        assert_eq!(summary.total_correct, 0);
        assert_eq!(summary.total_responses, 2);
    }

    #[test]
    fn max_span_takes_longest_fully_correct_length() {
        let summary = ConditionSummary::from_trials(&[
            trial(2, 2, true),
            trial(5, 5, true),
            trial(6, 4, false),
            trial(4, 4, true),
        ]);
        assert_eq!(summary.max_span, 5);
        assert_eq!(summary.total_correct, 3);
        assert_eq!(summary.digits_shown, 17);
        assert_eq!(summary.digits_correct, 15);
    }

    #[test]
    fn accuracy_guards_empty_condition() {
        let summary = ConditionSummary::default();
        assert_eq!(summary.trial_accuracy(), 0.0);
        assert_eq!(summary.digit_accuracy(), 0.0);
    }

    #[test]
    fn compile_summarises_each_condition_independently() {
        let results = TestResults::compile(
            "p-17",
            vec![trial(3, 3, true)],
            vec![trial(2, 0, false), trial(2, 1, false)],
            Utc::now(),
        );
        assert_eq!(results.forward.max_span, 3);
        assert_eq!(results.backward.max_span, 0);
        assert_eq!(results.summary(Condition::Backward).total_responses, 2);
        assert!((results.forward.digit_accuracy() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn results_serialize_with_lowercase_conditions() {
        let mut t = trial(2, 2, true);
        t.condition = Condition::Backward;
        let results = TestResults::compile("p", vec![], vec![t], Utc::now());
        let json = serde_json::to_string(&results).unwrap();
        assert!(json.contains("\"condition\":\"backward\""));
        let back: TestResults = serde_json::from_str(&json).unwrap();
        assert_eq!(back, results);
    }
}
