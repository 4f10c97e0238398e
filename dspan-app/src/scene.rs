//! Maps session state and key presses onto renderer scenes and session
//! commands, keeping the winit handler thin.

use dspan_core::Stage;
use dspan_experiment::{INSTRUCTIONS, SequenceProvider, Session};
use dspan_render::{Scene, TrialView};
use dspan_timing::Timer;
use winit::keyboard::{Key, NamedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Advance,
    Type(char),
    Backspace,
    Restart,
    SaveImage,
    Exit,
}

pub fn build_scene<S, T>(session: &Session<S, T>) -> Scene<'_>
where
    S: SequenceProvider,
    T: Timer,
{
    match session.stage() {
        Stage::Welcome => Scene::Welcome {
            participant: session.participant_field(),
        },
        Stage::Instructions => {
            let (step, page) = session.instruction();
            Scene::Instructions {
                step,
                total: INSTRUCTIONS.len(),
                title: page.title,
                body: page.body,
            }
        }
        Stage::Test => {
            let engine = session.engine();
            Scene::Trial(TrialView {
                condition: engine.condition(),
                phase: engine.phase(),
                length: engine.length(),
                trial_number: engine.trial_number(),
                trials_per_length: engine.config.trials_per_length,
                digit: engine.current_digit(),
                position: engine.display_position(),
                response: session.response_field(),
                progress: engine.progress().fraction(),
                condition_intro: engine.is_condition_intro(),
            })
        }
        Stage::Results => match session.results() {
            Some(results) => Scene::Results {
                results,
                span_scale: session.engine().config.max_length,
            },
            None => Scene::ThankYou,
        },
        Stage::ThankYou => Scene::ThankYou,
    }
}

/// Enter and Space advance; Space is ordinary text on the welcome form.
pub fn map_key(stage: Stage, key: &Key, text: Option<&str>) -> Vec<Command> {
    match key {
        Key::Named(NamedKey::Escape) => vec![Command::Exit],
        Key::Named(NamedKey::Enter) => vec![Command::Advance],
        Key::Named(NamedKey::Backspace) => vec![Command::Backspace],
        Key::Named(NamedKey::Space) if stage == Stage::Welcome => vec![Command::Type(' ')],
        Key::Named(NamedKey::Space) => vec![Command::Advance],
        Key::Character(c) if stage == Stage::Results => match c.as_str() {
            "r" | "R" => vec![Command::Restart],
            "s" | "S" => vec![Command::SaveImage],
            _ => Vec::new(),
        },
        _ => text
            .map(|t| t.chars().filter(|c| !c.is_control()).map(Command::Type).collect())
            .unwrap_or_default(),
    }
}
