//! Tests for value iteration and goal scoring.

use shapeworld_core::{
    Action, AttributeDomain, Configuration, Goal, ObjectState, Pattern, PatternVariant,
    PlannerSettings, PlanningError, PlanningModel, Shade, Shape, ShapeSkin, SlotId, TransitionRule,
    aggregate_goal_values, rank_goals, value_iteration,
};

fn object(shape: Shape, color: u8, pattern: Pattern) -> ObjectState {
    ObjectState::new(shape, Shade::new(color), pattern)
}

fn domain() -> AttributeDomain {
    AttributeDomain::new(
        vec![Shape::Circle, Shape::Square],
        2,
        PatternVariant::Simple.patterns().to_vec(),
        ShapeSkin::Triangle,
    )
    .expect("valid domain")
}

fn rule() -> TransitionRule {
    TransitionRule::new(0.8, PatternVariant::Simple).expect("valid rule")
}

fn goal() -> Goal {
    Goal::new(Configuration::new(
        object(Shape::Circle, 1, Pattern::Plain),
        object(Shape::Circle, 1, Pattern::Striped),
        object(Shape::Square, 2, Pattern::Plain),
    ))
}

fn model() -> PlanningModel {
    PlanningModel::build(&domain(), &rule()).expect("model")
}

#[test]
fn test_goal_state_has_zero_value() {
    let model = model();
    let values = model
        .value_iteration(&goal(), &PlannerSettings::default())
        .expect("solved");
    assert_eq!(values.value(&model, goal().configuration()), Some(0.0));
    assert_eq!(model.best_action(&values, goal().configuration()), None);
}

#[test]
fn test_certain_step_to_goal_costs_one() {
    let model = model();
    let values = model
        .value_iteration(&goal(), &PlannerSettings::default())
        .expect("solved");

    // a acting on b: same shape and shade, plain toggles to striped.
    let mut start = *goal().configuration();
    start.set(SlotId::B, object(Shape::Circle, 1, Pattern::Plain));

    let value = values.value(&model, &start).expect("in model");
    assert!((value + 1.0).abs() < 1e-9, "value was {}", value);
    assert_eq!(
        model.best_action(&values, &start),
        Some(Action::new(SlotId::A, SlotId::B).expect("distinct"))
    );
}

#[test]
fn test_shape_bias_step_costs_more_than_one() {
    let model = model();
    let values = model
        .value_iteration(&goal(), &PlannerSettings::default())
        .expect("solved");

    // Reaching the goal needs the agent's shape, adopted with probability 0.8.
    let mut start = *goal().configuration();
    start.set(SlotId::B, object(Shape::Square, 1, Pattern::Plain));

    let value = values.value(&model, &start).expect("in model");
    let floor = -1.0 - 0.2 * 0.95 / (1.0 - 0.95);
    assert!(value < -1.0 && value > floor, "value was {}", value);
}

#[test]
fn test_iteration_converges_to_fixed_point() {
    let settings = PlannerSettings::default();
    let model = model();
    let values = model.value_iteration(&goal(), &settings).expect("solved");

    assert!(*values.converged());
    assert!(*values.delta() <= *settings.threshold());
    assert!(*values.iterations() < *settings.max_iterations());

    let floor = -1.0 / (1.0 - settings.discount());
    for configuration in model.configurations() {
        let value = values.value(&model, &configuration).expect("in model");
        assert!(value <= 0.0 && value >= floor - 1e-9);
        if configuration == *goal().configuration() {
            continue;
        }
        let q = model.q_values(&values, &configuration).expect("in model");
        let backup = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((backup - value).abs() <= *settings.threshold());
    }
}

#[test]
fn test_iteration_limit_reported() {
    let settings = PlannerSettings::new(0.95, 1e-6, 1).expect("settings");
    let values = value_iteration(&domain(), &rule(), &goal(), &settings).expect("solved");
    assert_eq!(*values.iterations(), 1);
    assert!(!*values.converged());
}

#[test]
fn test_out_of_domain_goal_rejected() {
    let goal = Goal::new(Configuration::new(
        object(Shape::Triangle, 1, Pattern::Plain),
        object(Shape::Circle, 1, Pattern::Plain),
        object(Shape::Circle, 1, Pattern::Plain),
    ));
    let result = model().value_iteration(&goal, &PlannerSettings::default());
    assert!(matches!(result, Err(PlanningError::Configuration(_))));
}

#[test]
fn test_goals_ranked_easiest_first() {
    let model = model();
    let settings = PlannerSettings::default();
    let goals: Vec<Goal> = model.configurations().step_by(97).map(Goal::new).collect();

    let ranked = rank_goals(&model, &goals, &settings).expect("ranked");
    assert_eq!(ranked.len(), goals.len());
    assert!(ranked.windows(2).all(|pair| pair[0].value >= pair[1].value));
    assert!(ranked.iter().all(|score| score.converged && score.value < 0.0));

    let solved: Vec<_> = goals
        .iter()
        .map(|goal| model.value_iteration(goal, &settings).expect("solved"))
        .collect();
    assert_eq!(aggregate_goal_values(&solved), ranked);
}
