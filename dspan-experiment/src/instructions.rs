/// One page of the briefing shown before the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub title: &'static str,
    pub body: &'static str,
}

pub static INSTRUCTIONS: &[Instruction] = &[
    Instruction {
        title: "Digit Span Test",
        body: "This test measures working memory by asking you to remember \
               sequences of digits. It gets harder as you go.",
    },
    Instruction {
        title: "How It Works",
        body: "Digits appear on the screen one at a time. When they are gone, \
               type them back and press Enter. Lists start short and grow longer.",
    },
    Instruction {
        title: "Two Conditions",
        body: "Forward span: type the digits in the order shown. \
               Backward span: type them in reverse order.",
    },
    Instruction {
        title: "Before You Start",
        body: "There is no time limit for answering. Every length is presented \
               twice in each condition. Press Enter to begin.",
    },
];
