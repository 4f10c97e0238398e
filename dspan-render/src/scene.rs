use dspan_core::{Condition, TestResults, TrialPhase};

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub enum Scene<'a> {
    Welcome {
        participant: &'a str,
    },
    Instructions {
        step: usize,
        total: usize,
        title: &'a str,
        body: &'a str,
    },
    Trial(TrialView<'a>),
    Results {
        results: &'a TestResults,
        span_scale: usize,
    },
    ThankYou,
}

#[derive(Debug, Clone, Copy)]
pub struct TrialView<'a> {
    pub condition: Condition,
    pub phase: TrialPhase,
    pub length: usize,
    pub trial_number: usize,
    pub trials_per_length: usize,
    /// Digit on screen while Showing.
    pub digit: Option<u8>,
    /// 1-based position of `digit` and the sequence length.
    pub position: Option<(usize, usize)>,
    pub response: &'a str,
    pub progress: f32,
    /// First trial of a condition: the transition screen shows the briefing.
    pub condition_intro: bool,
}
