pub mod error;
pub mod phase;
pub mod results;
pub mod sequence;
pub mod trial;

pub use error::SpanError;
pub use phase::{Phase, Stage};
pub use results::{ConditionSummary, TestResults};
pub use sequence::Sequence;
pub use trial::{Condition, Trial, TrialPhase};
