pub mod schedule;
pub mod timer;

pub use schedule::{TickScheduler, TickTicket};
pub use timer::{FrameStats, HighPrecisionTimer, ManualTimer, Timer};
