//! Screen flow around the trial engine: welcome form, instruction pages,
//! the test itself, results and the closing screen.

use dspan_core::{Phase, SpanError, Stage, TestResults, TrialPhase};
use dspan_timing::Timer;
use tracing::{info, warn};

use crate::engine::{EngineEvent, TrialEngine};
use crate::instructions::{INSTRUCTIONS, Instruction};
use crate::sequences::SequenceProvider;
use crate::store::SessionStore;

pub struct Session<S, T>
where
    S: SequenceProvider,
    T: Timer,
{
    stage: Stage,
    participant_id: String,
    participant_field: String,
    response_field: String,
    instruction_step: usize,
    engine: TrialEngine<S, T>,
    results: Option<TestResults>,
    store: Option<SessionStore>,
}

impl<S, T> Session<S, T>
where
    S: SequenceProvider,
    T: Timer,
{
    pub fn new(engine: TrialEngine<S, T>, store: Option<SessionStore>) -> Self {
        Self {
            stage: Stage::default(),
            participant_id: String::new(),
            participant_field: String::new(),
            response_field: String::new(),
            instruction_step: 0,
            engine,
            results: None,
            store,
        }
    }

    /// Pre-fills the welcome form, e.g. from the command line or the cache.
    pub fn prefill_participant(&mut self, id: &str) {
        if self.stage.is_welcome() {
            self.participant_field = id.trim().to_owned();
        }
    }

    /// Keyboard text. Welcome takes any printable character; the response
    /// field only takes digits, up to the current sequence length.
    pub fn type_char(&mut self, c: char) {
        match self.stage {
            Stage::Welcome if !c.is_control() => self.participant_field.push(c),
            Stage::Test if self.engine.phase() == TrialPhase::Input => {
                if c.is_ascii_digit() && self.response_field.len() < self.engine.length() {
                    self.response_field.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.stage {
            Stage::Welcome => {
                self.participant_field.pop();
            }
            Stage::Test => {
                self.response_field.pop();
            }
            _ => {}
        }
    }

    /// The advance key (Enter or Space). Routes to whatever the current
    /// screen treats as "continue"; it is a no-op while digits are shown.
    pub fn advance(&mut self) -> Result<Vec<EngineEvent>, SpanError> {
        match self.stage {
            Stage::Welcome => {
                let id = self.participant_field.clone();
                self.submit_participant(&id)?;
                Ok(Vec::new())
            }
            Stage::Instructions => {
                self.next_instruction();
                Ok(Vec::new())
            }
            Stage::Test => match self.engine.phase() {
                TrialPhase::Transition => self.start_trial(),
                TrialPhase::Input => self.submit_response(),
                TrialPhase::Showing | TrialPhase::Complete => Ok(Vec::new()),
            },
            Stage::Results => {
                self.finish();
                Ok(Vec::new())
            }
            Stage::ThankYou => Ok(Vec::new()),
        }
    }

    pub fn submit_participant(&mut self, id: &str) -> Result<(), SpanError> {
        if !self.stage.is_welcome() {
            return Err(SpanError::InvalidState {
                operation: "submit a participant",
                phase: self.engine.phase(),
            });
        }
        let id = id.trim();
        if id.is_empty() {
            return Err(SpanError::EmptyParticipantId);
        }
        self.participant_id = id.to_owned();
        self.participant_field = self.participant_id.clone();
        self.engine.set_participant_id(id);
        if let Some(store) = &self.store {
            if let Err(e) = store.save_participant(id) {
                warn!(error = %e, "could not cache participant id");
            }
        }
        info!(participant = id, "participant registered");
        self.enter_next_stage();
        Ok(())
    }

    pub fn next_instruction(&mut self) {
        if self.stage != Stage::Instructions {
            return;
        }
        if self.instruction_step + 1 < INSTRUCTIONS.len() {
            self.instruction_step += 1;
        } else {
            self.enter_next_stage();
        }
    }

    pub fn start_trial(&mut self) -> Result<Vec<EngineEvent>, SpanError> {
        self.ensure_test("start a trial")?;
        let events = self.engine.start_trial()?;
        self.handle_engine_events(&events);
        Ok(events)
    }

    pub fn submit_response(&mut self) -> Result<Vec<EngineEvent>, SpanError> {
        self.ensure_test("submit a response")?;
        let events = self.engine.submit_response(&self.response_field)?;
        self.response_field.clear();
        self.handle_engine_events(&events);
        Ok(events)
    }

    /// Timer-driven presentation ticks.
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        if !self.stage.is_test() {
            return Vec::new();
        }
        let events = self.engine.poll();
        self.handle_engine_events(&events);
        events
    }

    /// Results → ThankYou.
    pub fn finish(&mut self) {
        if self.stage.is_results() {
            self.enter_next_stage();
        }
    }

    /// Back to the welcome form with nothing retained.
    pub fn restart(&mut self) {
        self.engine.restart();
        self.engine.set_participant_id("");
        self.stage = Stage::default();
        self.participant_id.clear();
        self.participant_field.clear();
        self.response_field.clear();
        self.instruction_step = 0;
        self.results = None;
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "could not clear cached session");
            }
        }
        info!("session restarted");
    }

    /// Presenter shutdown: no presentation tick may outlive it.
    pub fn teardown(&mut self) {
        self.engine.interrupt();
    }

    fn handle_engine_events(&mut self, events: &[EngineEvent]) {
        for event in events {
            match event {
                EngineEvent::PhaseChanged {
                    to: TrialPhase::Input,
                    ..
                } => self.response_field.clear(),
                EngineEvent::Completed(results) => {
                    if let Some(store) = &self.store {
                        if let Err(e) = store.save_results(results) {
                            warn!(error = %e, "could not cache results");
                        }
                    }
                    self.results = Some(results.as_ref().clone());
                    self.enter_next_stage();
                }
                _ => {}
            }
        }
    }

    fn enter_next_stage(&mut self) {
        if let Some(next) = self.stage.next() {
            info!(from = ?self.stage, to = ?next, "stage change");
            self.stage = next;
        }
    }

    fn ensure_test(&self, operation: &'static str) -> Result<(), SpanError> {
        if self.stage.is_test() {
            Ok(())
        } else {
            Err(SpanError::InvalidState {
                operation,
                phase: self.engine.phase(),
            })
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn engine(&self) -> &TrialEngine<S, T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TrialEngine<S, T> {
        &mut self.engine
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn participant_field(&self) -> &str {
        &self.participant_field
    }

    pub fn response_field(&self) -> &str {
        &self.response_field
    }

    pub fn instruction(&self) -> (usize, &'static Instruction) {
        let step = self.instruction_step.min(INSTRUCTIONS.len() - 1);
        (step, &INSTRUCTIONS[step])
    }

    pub fn results(&self) -> Option<&TestResults> {
        self.results.as_ref()
    }

    pub fn store(&self) -> Option<&SessionStore> {
        self.store.as_ref()
    }
}
