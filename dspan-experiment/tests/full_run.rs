use std::time::Duration;

use dspan_core::{Condition, Stage, TrialPhase};
use dspan_experiment::{
    EngineEvent, FixedSequences, INSTRUCTIONS, RandomSequences, SequenceProvider, Session,
    SessionStore, SpanConfig, TrialEngine, expected_sequence,
};
use dspan_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

fn engine<S: SequenceProvider>(provider: S) -> TrialEngine<S, ManualTimer> {
    TrialEngine::new("p-1", SpanConfig::default(), provider, ManualTimer::new()).unwrap()
}

/// Runs one trial through its presentation and answers with `answer`.
fn play_trial<S: SequenceProvider>(
    e: &mut TrialEngine<S, ManualTimer>,
    answer: &str,
) -> Vec<EngineEvent> {
    e.start_trial().unwrap();
    let shown = e.length() as u64;
    e.timer
        .advance(Duration::from_millis(e.config.digit_display_ms * shown));
    e.poll();
    assert_eq!(e.phase(), TrialPhase::Input);
    e.submit_response(answer).unwrap()
}

#[test]
fn failing_every_trial_still_runs_all_36() {
    let mut e = engine(FixedSequences);
    let mut visited = Vec::new();
    while !e.is_complete() {
        visited.push((e.condition(), e.length(), e.trial_number()));
        play_trial(&mut e, "0");
    }

    assert_eq!(visited.len(), 36);
    assert_eq!(visited[0], (Condition::Forward, 2, 1));
    assert_eq!(visited[1], (Condition::Forward, 2, 2));
    assert_eq!(visited[2], (Condition::Forward, 3, 1));
    assert_eq!(visited[17], (Condition::Forward, 10, 2));
    assert_eq!(visited[18], (Condition::Backward, 2, 1));
    assert_eq!(visited[35], (Condition::Backward, 10, 2));

    let results = e.results().unwrap();
    assert_eq!(results.forward.total_responses, 18);
    assert_eq!(results.backward.total_responses, 18);
    assert_eq!(results.forward.total_correct, 0);
    assert_eq!(results.forward.max_span, 0);
    assert_eq!(results.backward.max_span, 0);
    assert_eq!(results.participant_id, "p-1");
}

#[test]
fn recorded_trials_carry_sequence_response_and_position() {
    let provider = FixedSequences;
    let mut e = engine(provider);
    let mut recorded = Vec::new();
    let mut answers = Vec::new();
    while !e.is_complete() {
        // First trial of each length: the forward answer; second: a fixed miss.
        let answer = if e.trial_number() == 1 {
            provider.sequence(e.length(), 1).unwrap().to_string()
        } else {
            "12".to_owned()
        };
        answers.push(answer.clone());
        for event in play_trial(&mut e, &answer) {
            if let EngineEvent::TrialRecorded(trial) = event {
                recorded.push(trial);
            }
        }
    }

    let positions: Vec<(Condition, usize, usize)> = [Condition::Forward, Condition::Backward]
        .into_iter()
        .flat_map(|c| (2..=10).flat_map(move |l| (1..=2).map(move |t| (c, l, t))))
        .collect();
    assert_eq!(recorded.len(), 36);
    assert_eq!(positions.len(), 36);

    for ((trial, answer), (condition, length, number)) in
        recorded.iter().zip(&answers).zip(positions)
    {
        assert_eq!(trial.condition, condition);
        assert_eq!((trial.length, trial.trial_number), (length, number));
        assert_eq!(&trial.response, answer);
        assert_eq!(trial.sequence, provider.sequence(length, number).unwrap());
        assert_eq!(trial.sequence.len(), length);
        if condition == Condition::Forward && number == 1 {
            assert!(trial.fully_correct, "length {length} forward answer");
            assert_eq!(trial.correct_digits, length);
        }
    }

    let results = e.results().unwrap();
    assert_eq!(results.forward_trials, recorded[..18]);
    assert_eq!(results.backward_trials, recorded[18..]);
}

#[test]
fn perfect_recall_reaches_maximum_span_in_both_conditions() {
    let provider = FixedSequences;
    let mut e = engine(provider);
    let mut completed = None;
    while !e.is_complete() {
        let sequence = provider.sequence(e.length(), e.trial_number()).unwrap();
        let answer = expected_sequence(&sequence, e.condition()).to_string();
        for event in play_trial(&mut e, &answer) {
            if let EngineEvent::Completed(results) = event {
                completed = Some(results);
            }
        }
    }

    let results = completed.expect("completion event");
    assert_eq!(results.forward.max_span, 10);
    assert_eq!(results.backward.max_span, 10);
    assert_eq!(results.forward.total_correct, 18);
    assert_eq!(results.backward.digits_correct, results.backward.digits_shown);
    assert!(results.backward_trials.iter().all(|t| t.condition == Condition::Backward));
    assert_eq!(e.progress().completed, e.progress().total);
    assert!(e.start_trial().is_err());
}

#[test]
fn max_span_tracks_the_longest_fully_correct_length() {
    let provider = FixedSequences;
    let mut e = engine(provider);
    while !e.is_complete() {
        let sequence = provider.sequence(e.length(), e.trial_number()).unwrap();
        // Forward: only length 5, trial 2 is right. Backward: lengths up to 4.
        let right = match e.condition() {
            Condition::Forward => e.length() == 5 && e.trial_number() == 2,
            Condition::Backward => e.length() <= 4,
        };
        let answer = if right {
            expected_sequence(&sequence, e.condition()).to_string()
        } else {
            sequence.to_string().chars().skip(1).collect()
        };
        play_trial(&mut e, &answer);
    }

    let results = e.results().unwrap();
    assert_eq!(results.forward.max_span, 5);
    assert_eq!(results.forward.total_correct, 1);
    assert_eq!(results.backward.max_span, 4);
    assert_eq!(results.backward.total_correct, 6);
}

#[test]
fn condition_switch_is_announced_once() {
    let mut e = engine(FixedSequences);
    let mut switches = Vec::new();
    while !e.is_complete() {
        for event in play_trial(&mut e, "") {
            if let EngineEvent::ConditionChanged(c) = event {
                switches.push(c);
            }
        }
        if e.condition() == Condition::Backward && e.trials(Condition::Backward).is_empty() {
            assert!(e.is_condition_intro());
        }
    }
    assert_eq!(switches, vec![Condition::Backward]);
}

#[test]
fn random_sequences_drive_a_complete_run() {
    let config = SpanConfig::default();
    let provider = RandomSequences::generate(&config, &mut StdRng::seed_from_u64(3));
    let mut e = engine(provider);
    while !e.is_complete() {
        play_trial(&mut e, "1");
    }
    let results = e.results().unwrap();
    assert_eq!(results.forward_trials.len() + results.backward_trials.len(), 36);
}

#[test]
fn session_caches_results_and_reaches_thank_you() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(dir.path());
    let engine = TrialEngine::new(
        "",
        SpanConfig {
            min_length: 2,
            max_length: 3,
            ..SpanConfig::default()
        },
        FixedSequences,
        ManualTimer::new(),
    )
    .unwrap();
    let mut session = Session::new(engine, Some(store.clone()));

    session.submit_participant("u-77").unwrap();
    for _ in 0..INSTRUCTIONS.len() {
        session.advance().unwrap();
    }
    assert_eq!(session.stage(), Stage::Test);

    while session.stage() == Stage::Test {
        session.advance().unwrap();
        let length = session.engine().length() as u64;
        session
            .engine_mut()
            .timer
            .advance(Duration::from_millis(1000 * length));
        session.tick();
        session.type_char('2');
        session.advance().unwrap();
    }

    assert_eq!(session.stage(), Stage::Results);
    let results = session.results().unwrap();
    assert_eq!(results.forward_trials.len(), 4);
    assert_eq!(results.backward_trials.len(), 4);
    assert_eq!(store.load_results().unwrap().as_ref(), Some(results));

    session.advance().unwrap();
    assert_eq!(session.stage(), Stage::ThankYou);
}
