//! Tests for the goal-building phase.

use shapeworld::{
    BuilderEvent, ExperimentConfig, GoalBuilder, MemoryRecorder, Phase, PursuitSession,
    SessionError, ShapeworldError, TrialClock, TrialType,
};
use shapeworld_core::{
    AttributeDomain, GoalItem, Pattern, SeededRandom, SlotId, sample_configuration,
};

fn open(recorder: &MemoryRecorder) -> GoalBuilder {
    GoalBuilder::open(
        &AttributeDomain::builder(),
        3,
        9,
        &mut SeededRandom::new(21),
        Box::new(recorder.clone()),
        TrialClock::start(Some("builder-7".to_string())),
    )
    .expect("opens")
}

#[test]
fn test_menu_record_first() {
    let recorder = MemoryRecorder::new();
    let builder = open(&recorder);
    let records = recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(*records[0].trial_type(), TrialType::Menu);
    assert_eq!(*records[0].phase(), Phase::Builder);
    assert_eq!(records[0].menu_layout().as_ref(), Some(builder.layout()));
}

#[test]
fn test_place_records_position_and_slot() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let item = builder.layout().rows()[1][3].clone();

    let event = builder.place(&item.id, "b").expect("placed");
    assert_eq!(
        event,
        BuilderEvent::Placed {
            slot: SlotId::B,
            item: item.clone()
        }
    );

    let records = recorder.records();
    let record = &records[1];
    assert_eq!(*record.trial_type(), TrialType::Action);
    assert_eq!(*record.action_number(), 1);
    assert_eq!(*record.slot_filled(), Some(2));
    assert_eq!(*record.shape_removed(), Some(false));
    let position = record.menu_position().expect("position recorded");
    assert_eq!((position.row, position.column), (1, 3));
    assert_eq!(record.shape_selected().as_ref(), Some(&item));
}

#[test]
fn test_drop_on_occupied_slot_ignored() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let first = builder.layout().rows()[0][0].id.clone();
    let second = builder.layout().rows()[0][1].id.clone();

    builder.place(&first, "a").expect("placed");
    let event = builder.place(&second, "a").expect("handled");

    assert_eq!(event, BuilderEvent::Ignored { slot: SlotId::A });
    assert_eq!(builder.slot(SlotId::A).map(|item| item.id.as_str()), Some(first.as_str()));
    assert_eq!(recorder.records().len(), 2);
}

#[test]
fn test_remove_records_removal() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let id = builder.layout().rows()[2][8].id.clone();

    builder.place(&id, "c").expect("placed");
    let event = builder.remove("c").expect("removed");
    assert!(matches!(event, BuilderEvent::Removed { slot: SlotId::C, .. }));
    assert_eq!(builder.filled(), 0);

    let records = recorder.records();
    assert_eq!(*records[2].shape_removed(), Some(true));
    assert_eq!(*records[2].slot_filled(), Some(3));
    assert_eq!(*records[2].action_number(), 2);
    assert_eq!(*records[2].menu_position(), None);

    assert_eq!(builder.remove("c").expect("handled"), BuilderEvent::Ignored { slot: SlotId::C });
    assert_eq!(recorder.records().len(), 3);
}

#[test]
fn test_submit_requires_all_slots() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let id = builder.layout().rows()[0][0].id.clone();
    builder.place(&id, "a").expect("placed");

    assert!(matches!(
        builder.submit(),
        Err(ShapeworldError::Session(SessionError::Incomplete(1)))
    ));
}

#[test]
fn test_submit_maps_slots_in_order() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let items: Vec<_> = builder.layout().rows()[0][..3].to_vec();

    builder.place(&items[2].id, "c").expect("placed");
    builder.place(&items[0].id, "a").expect("placed");
    builder.place(&items[1].id, "b").expect("placed");
    let goal = builder.submit().expect("submitted");

    assert_eq!(*goal.get(SlotId::A), items[0].object());
    assert_eq!(*goal.get(SlotId::B), items[1].object());
    assert_eq!(*goal.get(SlotId::C), items[2].object());

    let records = recorder.records();
    let submit = records.last().expect("submit recorded");
    assert_eq!(*submit.trial_type(), TrialType::Submit);
    assert_eq!(*submit.action_number(), 4);
    let expected: Vec<GoalItem> = items.iter().map(GoalItem::from).collect();
    assert_eq!(submit.final_goal().as_ref(), Some(&expected));
    assert_eq!(submit.validate(), Ok(()));

    assert!(matches!(
        builder.place(&items[0].id, "a"),
        Err(ShapeworldError::Session(SessionError::TrialEnded))
    ));
}

#[test]
fn test_unknown_item_and_slot() {
    let recorder = MemoryRecorder::new();
    let mut builder = open(&recorder);
    let id = builder.layout().rows()[0][0].id.clone();

    assert!(matches!(
        builder.place("shape-99", "a"),
        Err(ShapeworldError::Session(SessionError::UnknownMenuItem(_)))
    ));
    assert!(matches!(
        builder.place(&id, "d"),
        Err(ShapeworldError::InvalidSelection(_))
    ));
    assert_eq!(recorder.records().len(), 1);
}

#[test]
fn test_simple_variant_goal_is_pursuable() {
    let config = ExperimentConfig::from_toml("pattern_variant = \"simple\"\nseed = 5").expect("parses");
    let builder_domain = config.builder_domain().expect("builder domain");
    let pursuit_domain = config.pursuit_domain().expect("pursuit domain");
    let recorder = MemoryRecorder::new();
    let mut builder = GoalBuilder::open(
        &builder_domain,
        *config.menu_rows(),
        config.menu_columns(),
        &mut SeededRandom::new(5),
        Box::new(recorder.clone()),
        TrialClock::start(None),
    )
    .expect("opens");

    assert_eq!(builder.layout().len(), 18);
    assert!(builder.layout().iter().all(|item| item.texture != Pattern::Dotted));
    assert!(builder.layout().iter().all(|item| pursuit_domain.check(&item.object()).is_ok()));

    let items: Vec<_> = builder.layout().iter().cloned().collect();
    let last = &items[items.len() - 3..];
    builder.place(&last[0].id, "a").expect("placed");
    builder.place(&last[1].id, "b").expect("placed");
    builder.place(&last[2].id, "c").expect("placed");
    let goal = builder.submit().expect("submitted");

    let mut rng = SeededRandom::new(6);
    let start = sample_configuration(&pursuit_domain, &mut rng);
    let session = PursuitSession::new(
        pursuit_domain,
        config.transition_rule().expect("rule"),
        start,
        goal,
        config.random_source(),
        Box::new(recorder),
        TrialClock::start(None),
    );
    assert!(session.is_ok());
}
