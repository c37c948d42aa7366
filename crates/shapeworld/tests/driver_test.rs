//! Tests for the async pursuit driver with a paused clock.

use shapeworld::{
    MemoryRecorder, PursuitCommand, PursuitDriver, PursuitEvent, PursuitSession, SelectionEvent,
    TrialClock, TrialStatus, TrialType,
};
use shapeworld_core::{
    AttributeDomain, Configuration, FixedRandom, Goal, ObjectState, Pattern, PatternVariant, Shade,
    Shape, SlotId, TransitionRule,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const DELAY: Duration = Duration::from_millis(1000);

fn object(shape: Shape, color: u8, pattern: Pattern) -> ObjectState {
    ObjectState::new(shape, Shade::new(color), pattern)
}

fn start() -> Configuration {
    Configuration::new(
        object(Shape::Circle, 3, Pattern::Dotted),
        object(Shape::Square, 2, Pattern::Dotted),
        object(Shape::Triangle, 1, Pattern::Plain),
    )
}

fn session(goal: Configuration, recorder: &MemoryRecorder) -> PursuitSession {
    PursuitSession::new(
        AttributeDomain::pursuit(PatternVariant::Extended),
        TransitionRule::default(),
        start(),
        Goal::new(goal),
        Box::new(FixedRandom::constant(0.1)),
        Box::new(recorder.clone()),
        TrialClock::start(None),
    )
    .expect("valid session")
}

fn distant_goal() -> Configuration {
    let mut goal = start();
    goal.set(SlotId::C, object(Shape::Square, 5, Pattern::Striped));
    goal
}

fn one_step_goal() -> Configuration {
    let mut goal = start();
    goal.set(SlotId::B, object(Shape::Circle, 3, Pattern::Plain));
    goal
}

async fn collect(mut events: mpsc::UnboundedReceiver<PursuitEvent>) -> Vec<PursuitEvent> {
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        collected.push(event);
    }
    collected
}

#[tokio::test(start_paused = true)]
async fn test_transition_commits_after_delay() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(distant_goal(), &recorder), DELAY, event_tx);
    let started = Instant::now();
    let handle = tokio::spawn(driver.run(command_rx));

    command_tx.send(PursuitCommand::Select("a".into())).expect("driver running");
    command_tx.send(PursuitCommand::Select("b".into())).expect("driver running");

    let mut transition = None;
    while let Some(event) = event_rx.recv().await {
        if let PursuitEvent::Transition(outcome) = event {
            transition = Some(outcome);
            break;
        }
    }
    let outcome = transition.expect("transition committed");
    assert!(started.elapsed() >= DELAY, "committed before the delay");
    assert_eq!(outcome.after.b, object(Shape::Circle, 3, Pattern::Plain));
    assert_eq!(recorder.records().len(), 1);

    drop(command_tx);
    let session = handle.await.expect("joined").expect("driver ok");
    assert_eq!(session.status(), TrialStatus::Active);
    assert!(!session.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_selections_ignored_while_pending() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(distant_goal(), &recorder), DELAY, event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    for label in ["a", "b", "c", "b"] {
        command_tx.send(PursuitCommand::Select(label.into())).expect("driver running");
    }
    drop(command_tx);

    let events = collect(event_rx).await;
    let session = handle.await.expect("joined").expect("driver ok");

    let ignored = events
        .iter()
        .filter(|e| matches!(e, PursuitEvent::Selection(SelectionEvent::Ignored { .. })))
        .count();
    let transitions = events
        .iter()
        .filter(|e| matches!(e, PursuitEvent::Transition(_)))
        .count();
    assert_eq!(ignored, 2);
    assert_eq!(transitions, 1);
    assert_eq!(session.actions(), 1);
    assert_eq!(recorder.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_selection_is_reported_not_fatal() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(distant_goal(), &recorder), DELAY, event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    command_tx.send(PursuitCommand::Select("q".into())).expect("driver running");
    command_tx.send(PursuitCommand::Select("a".into())).expect("driver running");
    drop(command_tx);

    let events = collect(event_rx).await;
    handle.await.expect("joined").expect("driver ok");

    assert_eq!(events[0], PursuitEvent::Rejected("q".to_string()));
    assert!(matches!(
        events[1],
        PursuitEvent::Selection(SelectionEvent::Selected { slot: SlotId::A, .. })
    ));
    assert!(recorder.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abandon_waits_for_pending_commit() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(distant_goal(), &recorder), DELAY, event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    command_tx.send(PursuitCommand::Select("a".into())).expect("driver running");
    command_tx.send(PursuitCommand::Select("b".into())).expect("driver running");
    command_tx.send(PursuitCommand::Abandon).expect("driver running");

    let events = collect(event_rx).await;
    let session = handle.await.expect("joined").expect("driver ok");

    assert_eq!(session.status(), TrialStatus::Abandoned);
    assert!(matches!(events.last(), Some(PursuitEvent::Abandoned { actions: 1 })));

    let records = recorder.records();
    assert_eq!(records.len(), 2);
    assert_eq!(*records[0].trial_type(), TrialType::Action);
    assert_eq!(*records[1].trial_type(), TrialType::Abandon);
    assert_eq!(records[1].state_after(), records[0].state_after());
}

#[tokio::test(start_paused = true)]
async fn test_abandon_dropped_when_commit_reaches_goal() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(one_step_goal(), &recorder), DELAY, event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    command_tx.send(PursuitCommand::Select("a".into())).expect("driver running");
    command_tx.send(PursuitCommand::Select("b".into())).expect("driver running");
    command_tx.send(PursuitCommand::Abandon).expect("driver running");

    let events = collect(event_rx).await;
    let session = handle.await.expect("joined").expect("driver ok");

    assert_eq!(session.status(), TrialStatus::Achieved);
    assert!(matches!(events.last(), Some(PursuitEvent::Achieved { actions: 1 })));
    let records = recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(*records[0].goal_achieved(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_abandon_without_pending() {
    let recorder = MemoryRecorder::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session(distant_goal(), &recorder), DELAY, event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    command_tx.send(PursuitCommand::Select("c".into())).expect("driver running");
    command_tx.send(PursuitCommand::Abandon).expect("driver running");

    let events = collect(event_rx).await;
    let session = handle.await.expect("joined").expect("driver ok");

    assert_eq!(session.status(), TrialStatus::Abandoned);
    assert_eq!(events.last(), Some(&PursuitEvent::Abandoned { actions: 0 }));
    assert_eq!(recorder.records().len(), 1);
}
