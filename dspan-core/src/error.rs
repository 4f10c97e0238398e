use thiserror::Error;

use crate::trial::TrialPhase;

/// Errors raised by the span test components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    /// A sequence was requested for a length or trial index the provider
    /// does not carry. Only reachable through misuse of the provider.
    #[error("invalid sequence request: length {length}, trial {trial}")]
    InvalidRequest { length: usize, trial: usize },

    /// An engine entry point was called in a phase that does not accept it.
    #[error("cannot {operation} while in {phase:?} phase")]
    InvalidState {
        operation: &'static str,
        phase: TrialPhase,
    },

    /// The welcome form was submitted without a usable identifier.
    #[error("participant identifier must not be empty")]
    EmptyParticipantId,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
