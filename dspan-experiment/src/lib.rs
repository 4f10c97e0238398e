pub mod config;
pub mod engine;
pub mod instructions;
pub mod scoring;
pub mod sequences;
pub mod session;
pub mod store;

pub use config::SpanConfig;
pub use engine::{EngineEvent, Progress, TrialEngine};
pub use instructions::{INSTRUCTIONS, Instruction};
pub use scoring::{Score, expected_sequence, score_response};
pub use sequences::{FixedSequences, RandomSequences, SequenceProvider};
pub use session::Session;
pub use store::SessionStore;
