//! Digit sequence sources.
//!
//! The engine only asks for `(length, trial)` pairs inside its configured
//! range. `FixedSequences` serves the same table to every participant;
//! `RandomSequences` draws one table per session up front.

use std::collections::HashMap;

use dspan_core::{Sequence, SpanError};
use rand::Rng;

use crate::config::SpanConfig;

pub trait SequenceProvider {
    /// Returns the sequence for `length` and 1-based `trial`.
    fn sequence(&self, length: usize, trial: usize) -> Result<Sequence, SpanError>;
}

impl<P: SequenceProvider + ?Sized> SequenceProvider for Box<P> {
    fn sequence(&self, length: usize, trial: usize) -> Result<Sequence, SpanError> {
        (**self).sequence(length, trial)
    }
}

const FIXED_MIN_LENGTH: usize = 2;

static FIXED_TABLE: [[&[u8]; 2]; 9] = [
    [&[3, 7], &[5, 2]],
    [&[4, 9, 2], &[7, 3, 8]],
    [&[6, 2, 9, 4], &[3, 8, 1, 5]],
    [&[5, 3, 8, 1, 9], &[2, 7, 4, 9, 6]],
    [&[7, 4, 2, 8, 5, 1], &[9, 3, 6, 1, 7, 4]],
    [&[4, 9, 6, 2, 7, 3, 8], &[8, 1, 5, 9, 2, 6, 4]],
    [&[5, 2, 9, 1, 7, 4, 8, 3], &[6, 9, 3, 7, 2, 5, 1, 8]],
    [&[3, 8, 5, 2, 9, 6, 1, 7, 4], &[7, 2, 6, 4, 1, 8, 3, 9, 5]],
    [
        &[9, 4, 7, 2, 5, 8, 1, 6, 3, 4],
        &[2, 8, 3, 6, 9, 1, 5, 7, 4, 8],
    ],
];

/// Pre-generated table: two sequences for each length from 2 to 10.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSequences;

impl SequenceProvider for FixedSequences {
    fn sequence(&self, length: usize, trial: usize) -> Result<Sequence, SpanError> {
        let row = length
            .checked_sub(FIXED_MIN_LENGTH)
            .and_then(|i| FIXED_TABLE.get(i));
        let digits = row
            .zip(trial.checked_sub(1))
            .and_then(|(row, t)| row.get(t))
            .ok_or(SpanError::InvalidRequest { length, trial })?;
        Sequence::new(digits.to_vec()).ok_or(SpanError::InvalidRequest { length, trial })
    }
}

/// Sequences drawn once at construction and reused for the whole session.
#[derive(Debug, Clone)]
pub struct RandomSequences {
    table: HashMap<(usize, usize), Sequence>,
}

impl RandomSequences {
    pub fn generate<R: Rng>(config: &SpanConfig, rng: &mut R) -> Self {
        let mut table = HashMap::new();
        for length in config.lengths() {
            for trial in 1..=config.trials_per_length {
                table.insert((length, trial), random_sequence(length, rng));
            }
        }
        tracing::debug!(sequences = table.len(), "generated random sequence table");
        Self { table }
    }
}

impl SequenceProvider for RandomSequences {
    fn sequence(&self, length: usize, trial: usize) -> Result<Sequence, SpanError> {
        self.table
            .get(&(length, trial))
            .cloned()
            .ok_or(SpanError::InvalidRequest { length, trial })
    }
}

fn random_sequence<R: Rng>(length: usize, rng: &mut R) -> Sequence {
    let mut digits: Vec<u8> = Vec::with_capacity(length);
    for _ in 0..length {
        let digit = match digits.last() {
            // Draw from the nine digits that differ from the previous one.
            Some(&prev) => {
                let d = rng.random_range(0..9u8);
                if d >= prev { d + 1 } else { d }
            }
            None => rng.random_range(0..10u8),
        };
        digits.push(digit);
    }
    Sequence::new(digits).unwrap_or_else(|| unreachable!("digits are drawn from 0..=9"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fixed_table_covers_every_supported_pair() {
        let provider = FixedSequences;
        for length in 2..=10 {
            for trial in 1..=2 {
                let seq = provider.sequence(length, trial).unwrap();
                assert_eq!(seq.len(), length);
                assert!(!seq.has_adjacent_repeat(), "{length}/{trial}: {seq}");
                assert_eq!(provider.sequence(length, trial).unwrap(), seq);
            }
        }
    }

    #[test]
    fn fixed_table_rejects_unsupported_requests() {
        let provider = FixedSequences;
        for (length, trial) in [(1, 1), (11, 1), (0, 1), (5, 0), (5, 3)] {
            assert_eq!(
                provider.sequence(length, trial),
                Err(SpanError::InvalidRequest { length, trial })
            );
        }
    }

    #[test]
    fn random_table_is_stable_and_free_of_repeats() {
        let config = SpanConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let provider = RandomSequences::generate(&config, &mut rng);
        for length in config.lengths() {
            for trial in 1..=config.trials_per_length {
                let seq = provider.sequence(length, trial).unwrap();
                assert_eq!(seq.len(), length);
                assert!(!seq.has_adjacent_repeat());
                assert_eq!(provider.sequence(length, trial).unwrap(), seq);
            }
        }
        assert!(provider.sequence(config.max_length + 1, 1).is_err());
    }

    #[test]
    fn random_tables_are_reproducible_from_a_seed() {
        let config = SpanConfig::default();
        let a = RandomSequences::generate(&config, &mut StdRng::seed_from_u64(42));
        let b = RandomSequences::generate(&config, &mut StdRng::seed_from_u64(42));
        for length in config.lengths() {
            assert_eq!(a.sequence(length, 1), b.sequence(length, 1));
        }
    }

    #[test]
    fn boxed_provider_delegates() {
        let provider: Box<dyn SequenceProvider> = Box::new(FixedSequences);
        assert_eq!(provider.sequence(4, 1).unwrap().to_string(), "6294");
    }
}
