use dspan_core::{Condition, Sequence};

/// Outcome of comparing a typed response with a presented sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct_digits: usize,
    pub fully_correct: bool,
}

/// The order in which the participant should type the digits back.
pub fn expected_sequence(sequence: &Sequence, condition: Condition) -> Sequence {
    match condition {
        Condition::Forward => sequence.clone(),
        Condition::Backward => sequence.reversed(),
    }
}

/// Positional partial-credit scoring.
///
/// Each position of the expected sequence earns one point when the response
/// has the same digit at the same index, so a response of the wrong length
/// still collects credit where positions coincide. Full credit requires the
/// whole response to equal the expected digits exactly. The response is not
/// validated; non-digit characters simply never match.
pub fn score_response(sequence: &Sequence, response: &str, condition: Condition) -> Score {
    let expected = expected_sequence(sequence, condition);
    let typed: Vec<char> = response.chars().collect();

    let correct_digits = expected
        .digits()
        .iter()
        .enumerate()
        .filter(|&(i, &d)| typed.get(i) == Some(&char::from(b'0' + d)))
        .count();
    let fully_correct = response == expected.to_string();

    Score {
        correct_digits,
        fully_correct,
    }
}
