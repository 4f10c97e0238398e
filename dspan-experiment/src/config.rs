use std::ops::RangeInclusive;
use std::time::Duration;

use dspan_core::SpanError;

pub const MIN_LENGTH: usize = 2;
pub const MAX_LENGTH: usize = 10;
pub const TRIALS_PER_LENGTH: usize = 2;
pub const DIGIT_DISPLAY_MS: u64 = 1000;
/// Upper bound on the per-digit interval.
pub const MAX_DIGIT_DISPLAY_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub trials_per_length: usize,
    pub digit_display_ms: u64,
}

impl Default for SpanConfig {
    fn default() -> Self {
        Self {
            min_length: MIN_LENGTH,
            max_length: MAX_LENGTH,
            trials_per_length: TRIALS_PER_LENGTH,
            digit_display_ms: DIGIT_DISPLAY_MS,
        }
    }
}

impl SpanConfig {
    pub fn validate(&self) -> Result<(), SpanError> {
        if self.min_length < MIN_LENGTH || self.max_length > MAX_LENGTH {
            return Err(SpanError::InvalidConfig(format!(
                "lengths must lie within {MIN_LENGTH}..={MAX_LENGTH}, got {}..={}",
                self.min_length, self.max_length
            )));
        }
        if self.min_length > self.max_length {
            return Err(SpanError::InvalidConfig(format!(
                "min length {} exceeds max length {}",
                self.min_length, self.max_length
            )));
        }
        if self.trials_per_length == 0 {
            return Err(SpanError::InvalidConfig(
                "at least one trial per length is required".into(),
            ));
        }
        if self.digit_display_ms == 0 || self.digit_display_ms > MAX_DIGIT_DISPLAY_MS {
            return Err(SpanError::InvalidConfig(format!(
                "digit display interval must lie within 1..={MAX_DIGIT_DISPLAY_MS} ms, got {}",
                self.digit_display_ms
            )));
        }
        Ok(())
    }

    pub fn lengths(&self) -> RangeInclusive<usize> {
        self.min_length..=self.max_length
    }

    pub fn trials_per_condition(&self) -> usize {
        self.lengths().count() * self.trials_per_length
    }

    /// Trials across both conditions.
    pub fn total_trials(&self) -> usize {
        self.trials_per_condition() * 2
    }

    pub fn digit_interval(&self) -> Duration {
        Duration::from_millis(self.digit_display_ms)
    }
}
