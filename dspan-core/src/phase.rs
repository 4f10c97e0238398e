/// Screen-level phases of a testing session and how they chain.
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn next(&self) -> Option<Self>;

    /// Whether free text typed by the participant is captured in this phase.
    fn allows_text_entry(&self) -> bool;

    fn is_welcome(&self) -> bool {
        false
    }
    fn is_test(&self) -> bool {
        false
    }
    fn is_results(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Welcome,
    Instructions,
    Test,
    Results,
    ThankYou,
}

impl Phase for Stage {
    fn next(&self) -> Option<Self> {
        use Stage::*;
        Some(match self {
            Welcome => Instructions,
            Instructions => Test,
            Test => Results,
            Results => ThankYou,
            ThankYou => return None,
        })
    }

    fn allows_text_entry(&self) -> bool {
        matches!(self, Self::Welcome | Self::Test)
    }

    fn is_welcome(&self) -> bool {
        matches!(self, Stage::Welcome)
    }

    fn is_test(&self) -> bool {
        matches!(self, Stage::Test)
    }

    fn is_results(&self) -> bool {
        matches!(self, Stage::Results)
    }
}
