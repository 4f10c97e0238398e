use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered run of single decimal digits shown to the participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(Vec<u8>);

impl Sequence {
    /// Builds a sequence from digits in `0..=9`. Returns `None` if any value
    /// is not a single decimal digit.
    pub fn new(digits: Vec<u8>) -> Option<Self> {
        digits.iter().all(|d| *d <= 9).then_some(Self(digits))
    }

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }

    /// True if two neighbouring digits are equal.
    pub fn has_adjacent_repeat(&self) -> bool {
        self.0.windows(2).any(|w| w[0] == w[1])
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
