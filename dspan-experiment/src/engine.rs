use chrono::Utc;
use dspan_core::{Condition, Sequence, SpanError, TestResults, Trial, TrialPhase};
use dspan_timing::{TickScheduler, TickTicket, Timer};
use tracing::{debug, info};

use crate::config::SpanConfig;
use crate::scoring::score_response;
use crate::sequences::SequenceProvider;

/// Notifications produced by the engine for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PhaseChanged { from: TrialPhase, to: TrialPhase },
    DigitShown { index: usize, digit: u8 },
    TrialRecorded(Trial),
    ConditionChanged(Condition),
    Completed(Box<TestResults>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Drives a participant through both conditions, every length and every
/// trial, in a fixed order. Correctness never shortens the run.
///
/// The engine reacts to three stimuli: [`start_trial`](Self::start_trial),
/// a tick of the presentation interval ([`poll`](Self::poll) or
/// [`on_tick`](Self::on_tick)), and [`submit_response`](Self::submit_response).
pub struct TrialEngine<S, T>
where
    S: SequenceProvider,
    T: Timer,
{
    pub config: SpanConfig,
    pub timer: T,
    provider: S,
    participant_id: String,
    condition: Condition,
    phase: TrialPhase,
    length: usize,
    trial_number: usize,
    sequence: Option<Sequence>,
    display_index: usize,
    digit_shown_at: u64,
    scheduler: TickScheduler,
    forward_trials: Vec<Trial>,
    backward_trials: Vec<Trial>,
    results: Option<TestResults>,
}

impl<S, T> TrialEngine<S, T>
where
    S: SequenceProvider,
    T: Timer,
{
    /// Fails if the configuration is invalid or the provider cannot serve
    /// every `(length, trial)` pair the run will ask for.
    pub fn new(
        participant_id: impl Into<String>,
        config: SpanConfig,
        provider: S,
        timer: T,
    ) -> Result<Self, SpanError> {
        config.validate()?;
        for length in config.lengths() {
            for trial in 1..=config.trials_per_length {
                provider.sequence(length, trial)?;
            }
        }

        Ok(Self {
            participant_id: participant_id.into(),
            condition: Condition::Forward,
            phase: TrialPhase::Transition,
            length: config.min_length,
            trial_number: 1,
            sequence: None,
            display_index: 0,
            digit_shown_at: 0,
            scheduler: TickScheduler::new(),
            forward_trials: Vec::new(),
            backward_trials: Vec::new(),
            results: None,
            config,
            provider,
            timer,
        })
    }

    pub fn set_participant_id(&mut self, id: impl Into<String>) {
        self.participant_id = id.into();
    }

    /// Transition → Showing. Fetches the sequence for the current position
    /// and reveals its first digit.
    pub fn start_trial(&mut self) -> Result<Vec<EngineEvent>, SpanError> {
        self.expect_phase(TrialPhase::Transition, "start a trial")?;

        let sequence = self.provider.sequence(self.length, self.trial_number)?;
        let Some(first) = sequence.get(0) else {
            return Err(SpanError::InvalidRequest {
                length: self.length,
                trial: self.trial_number,
            });
        };

        let mut events = Vec::new();
        self.sequence = Some(sequence);
        self.display_index = 0;
        self.enter(TrialPhase::Showing, &mut events);

        self.digit_shown_at = self.timer.now();
        self.scheduler.arm(self.digit_shown_at, self.interval_ns());
        events.push(EngineEvent::DigitShown {
            index: 0,
            digit: first,
        });
        Ok(events)
    }

    /// Fires every presentation tick that is due on the engine's timer.
    pub fn poll(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while self.scheduler.poll(self.timer.now()).is_some() {
            self.advance_display(&mut events);
        }
        events
    }

    /// Delivers a tick from an external timer. Tickets from a cancelled or
    /// superseded schedule are ignored.
    pub fn on_tick(&mut self, ticket: TickTicket) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.scheduler.claim(ticket) {
            self.advance_display(&mut events);
        } else {
            debug!(?ticket, "ignoring stale presentation tick");
        }
        events
    }

    /// Input → scoring → Transition, or run completion after the last trial.
    /// The caller filters `text` to digits; the engine scores it as given.
    pub fn submit_response(&mut self, text: &str) -> Result<Vec<EngineEvent>, SpanError> {
        self.expect_phase(TrialPhase::Input, "submit a response")?;
        let Some(sequence) = self.sequence.take() else {
            return Err(SpanError::InvalidState {
                operation: "submit a response",
                phase: self.phase,
            });
        };

        let score = score_response(&sequence, text, self.condition);
        let trial = Trial {
            sequence,
            response: text.to_owned(),
            correct_digits: score.correct_digits,
            fully_correct: score.fully_correct,
            length: self.length,
            trial_number: self.trial_number,
            condition: self.condition,
            completed_at: Utc::now(),
        };
        info!(
            condition = ?trial.condition,
            length = trial.length,
            trial = trial.trial_number,
            correct_digits = trial.correct_digits,
            fully_correct = trial.fully_correct,
            "trial recorded"
        );

        let mut events = vec![EngineEvent::TrialRecorded(trial.clone())];
        self.trials_mut(self.condition).push(trial);
        self.advance_position(&mut events);
        Ok(events)
    }

    /// Leaves Showing early, e.g. when the presenter is torn down. The
    /// pending tick is cancelled and nothing is recorded.
    pub fn interrupt(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.phase == TrialPhase::Showing {
            self.sequence = None;
            self.display_index = 0;
            self.enter(TrialPhase::Transition, &mut events);
        }
        events
    }

    /// Discards every recorded trial and returns to the first trial of the
    /// Forward condition.
    pub fn restart(&mut self) {
        self.scheduler.cancel();
        self.forward_trials.clear();
        self.backward_trials.clear();
        self.results = None;
        self.sequence = None;
        self.display_index = 0;
        self.condition = Condition::Forward;
        self.length = self.config.min_length;
        self.trial_number = 1;
        self.phase = TrialPhase::Transition;
        info!("engine restarted");
    }

    fn advance_display(&mut self, events: &mut Vec<EngineEvent>) {
        if self.phase != TrialPhase::Showing {
            return;
        }
        let Some(len) = self.sequence.as_ref().map(Sequence::len) else {
            return;
        };

        self.display_index += 1;
        let next = (self.display_index < len)
            .then(|| self.sequence.as_ref().and_then(|s| s.get(self.display_index)))
            .flatten();
        match next {
            Some(digit) => {
                events.push(EngineEvent::DigitShown {
                    index: self.display_index,
                    digit,
                });
                self.digit_shown_at = self.digit_shown_at.saturating_add(self.interval_ns());
                self.scheduler.arm(self.digit_shown_at, self.interval_ns());
            }
            None => self.enter(TrialPhase::Input, events),
        }
    }

    fn advance_position(&mut self, events: &mut Vec<EngineEvent>) {
        let at_length = self
            .trials(self.condition)
            .iter()
            .filter(|t| t.length == self.length)
            .count();

        if at_length < self.config.trials_per_length {
            self.trial_number += 1;
        } else if self.length < self.config.max_length {
            self.length += 1;
            self.trial_number = 1;
        } else if let Some(next) = self.condition.next() {
            info!(from = ?self.condition, to = ?next, "switching condition");
            self.condition = next;
            self.length = self.config.min_length;
            self.trial_number = 1;
            events.push(EngineEvent::ConditionChanged(next));
        } else {
            self.enter(TrialPhase::Complete, events);
            let results = TestResults::compile(
                self.participant_id.clone(),
                self.forward_trials.clone(),
                self.backward_trials.clone(),
                Utc::now(),
            );
            info!(
                forward_max_span = results.forward.max_span,
                backward_max_span = results.backward.max_span,
                "run complete"
            );
            self.results = Some(results.clone());
            events.push(EngineEvent::Completed(Box::new(results)));
            return;
        }
        self.enter(TrialPhase::Transition, events);
    }

    /// Every phase change goes through here so leaving Showing always
    /// cancels the pending tick.
    fn enter(&mut self, to: TrialPhase, events: &mut Vec<EngineEvent>) {
        let from = self.phase;
        if from == TrialPhase::Showing {
            self.scheduler.cancel();
        }
        self.phase = to;
        debug!(?from, ?to, length = self.length, trial = self.trial_number, "phase change");
        events.push(EngineEvent::PhaseChanged { from, to });
    }

    fn expect_phase(&self, expected: TrialPhase, operation: &'static str) -> Result<(), SpanError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SpanError::InvalidState {
                operation,
                phase: self.phase,
            })
        }
    }

    fn interval_ns(&self) -> u64 {
        u64::try_from(self.config.digit_interval().as_nanos()).unwrap_or(u64::MAX)
    }

    fn trials_mut(&mut self, condition: Condition) -> &mut Vec<Trial> {
        match condition {
            Condition::Forward => &mut self.forward_trials,
            Condition::Backward => &mut self.backward_trials,
        }
    }

    pub fn trials(&self, condition: Condition) -> &[Trial] {
        match condition {
            Condition::Forward => &self.forward_trials,
            Condition::Backward => &self.backward_trials,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn trial_number(&self) -> usize {
        self.trial_number
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Digit currently on screen, only while Showing.
    pub fn current_digit(&self) -> Option<u8> {
        match (&self.phase, &self.sequence) {
            (TrialPhase::Showing, Some(seq)) => seq.get(self.display_index),
            _ => None,
        }
    }

    /// 1-based position of the displayed digit and the sequence length.
    pub fn display_position(&self) -> Option<(usize, usize)> {
        match (&self.phase, &self.sequence) {
            (TrialPhase::Showing, Some(seq)) => {
                Some(((self.display_index + 1).min(seq.len()), seq.len()))
            }
            _ => None,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.forward_trials.len() + self.backward_trials.len(),
            total: self.config.total_trials(),
        }
    }

    /// True while waiting to start the very first trial of a condition.
    pub fn is_condition_intro(&self) -> bool {
        self.phase == TrialPhase::Transition && self.trials(self.condition).is_empty()
    }

    /// Timer reading at which the next presentation tick is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.deadline()
    }

    pub fn pending_tick(&self) -> Option<TickTicket> {
        self.scheduler.current()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TrialPhase::Complete
    }

    pub fn results(&self) -> Option<&TestResults> {
        self.results.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequences::FixedSequences;
    use dspan_timing::ManualTimer;
    use std::time::Duration;

    fn engine() -> TrialEngine<FixedSequences, ManualTimer> {
        TrialEngine::new("p1", SpanConfig::default(), FixedSequences, ManualTimer::new()).unwrap()
    }

    #[test]
    fn starts_in_transition_at_minimum_forward() {
        let e = engine();
        assert_eq!(e.phase(), TrialPhase::Transition);
        assert_eq!(e.condition(), Condition::Forward);
        assert_eq!(e.length(), 2);
        assert_eq!(e.trial_number(), 1);
        assert!(e.is_condition_intro());
        assert_eq!(e.progress().completed, 0);
        assert_eq!(e.progress().total, 36);
    }

    #[test]
    fn start_trial_reveals_first_digit() {
        let mut e = engine();
        let events = e.start_trial().unwrap();
        assert_eq!(
            events,
            vec![
                EngineEvent::PhaseChanged {
                    from: TrialPhase::Transition,
                    to: TrialPhase::Showing
                },
                EngineEvent::DigitShown { index: 0, digit: 3 },
            ]
        );
        assert_eq!(e.current_digit(), Some(3));
        assert_eq!(e.display_position(), Some((1, 2)));
        assert_eq!(e.next_deadline(), Some(1_000_000_000));
    }

    #[test]
    fn digits_advance_once_per_interval_then_input_opens() {
        let mut e = engine();
        e.start_trial().unwrap();

        e.timer.advance(Duration::from_millis(999));
        assert!(e.poll().is_empty());

        e.timer.advance(Duration::from_millis(1));
        assert_eq!(e.poll(), vec![EngineEvent::DigitShown { index: 1, digit: 7 }]);
        assert_eq!(e.phase(), TrialPhase::Showing);

        e.timer.advance(Duration::from_millis(1000));
        let events = e.poll();
        assert_eq!(
            events,
            vec![EngineEvent::PhaseChanged {
                from: TrialPhase::Showing,
                to: TrialPhase::Input
            }]
        );
        assert_eq!(e.current_digit(), None);
        assert_eq!(e.next_deadline(), None);
    }

    #[test]
    fn late_poll_catches_up_without_drift() {
        let mut e = engine();
        e.start_trial().unwrap();
        e.timer.advance(Duration::from_millis(2500));
        let events = e.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(e.phase(), TrialPhase::Input);
    }

    #[test]
    fn input_is_refused_outside_input_phase() {
        let mut e = engine();
        assert_eq!(
            e.submit_response("37"),
            Err(SpanError::InvalidState {
                operation: "submit a response",
                phase: TrialPhase::Transition
            })
        );
        e.start_trial().unwrap();
        assert!(e.submit_response("37").is_err());
        assert!(matches!(
            e.start_trial(),
            Err(SpanError::InvalidState {
                phase: TrialPhase::Showing,
                ..
            })
        ));
        assert!(e.trials(Condition::Forward).is_empty());
    }

    #[test]
    fn external_ticks_must_match_the_pending_ticket() {
        let mut e = engine();
        e.start_trial().unwrap();
        let first = e.pending_tick().unwrap();
        assert_eq!(e.on_tick(first).len(), 1);
        assert!(e.on_tick(first).is_empty());
        let second = e.pending_tick().unwrap();
        assert_eq!(e.on_tick(second).len(), 1);
        assert_eq!(e.phase(), TrialPhase::Input);
    }

    #[test]
    fn interrupt_cancels_the_pending_tick() {
        let mut e = engine();
        e.start_trial().unwrap();
        let ticket = e.pending_tick().unwrap();
        e.interrupt();
        assert_eq!(e.phase(), TrialPhase::Transition);
        assert_eq!(e.next_deadline(), None);

        e.timer.advance(Duration::from_secs(10));
        assert!(e.poll().is_empty());
        assert!(e.on_tick(ticket).is_empty());
        assert_eq!(e.phase(), TrialPhase::Transition);
        assert_eq!((e.length(), e.trial_number()), (2, 1));
    }

    #[test]
    fn interrupted_tick_does_not_leak_into_next_trial() {
        let mut e = engine();
        e.start_trial().unwrap();
        let stale = e.pending_tick().unwrap();
        e.interrupt();
        e.start_trial().unwrap();
        assert!(e.on_tick(stale).is_empty());
        assert_eq!(e.current_digit(), Some(3));
    }

    #[test]
    fn rejects_provider_that_cannot_cover_the_configuration() {
        let config = SpanConfig {
            trials_per_length: 3,
            ..SpanConfig::default()
        };
        let result = TrialEngine::new("p", config, FixedSequences, ManualTimer::new());
        assert!(matches!(
            result,
            Err(SpanError::InvalidRequest { length: 2, trial: 3 })
        ));
    }

    #[test]
    fn restart_clears_everything() {
        let mut e = engine();
        e.start_trial().unwrap();
        e.timer.advance(Duration::from_secs(2));
        e.poll();
        e.submit_response("37").unwrap();
        assert_eq!(e.trials(Condition::Forward).len(), 1);

        e.start_trial().unwrap();
        e.restart();
        assert_eq!(e.phase(), TrialPhase::Transition);
        assert_eq!(e.condition(), Condition::Forward);
        assert_eq!((e.length(), e.trial_number()), (2, 1));
        assert!(e.trials(Condition::Forward).is_empty());
        assert_eq!(e.next_deadline(), None);
    }
}
