//! Optimal planning over the full configuration space.
//!
//! Each goal defines an MDP over every configuration of the domain: the six
//! [`Action`]s are the moves, every step costs [`STEP_COST`], and the goal
//! is absorbing with value zero. Value iteration solves it; the mean
//! optimal value over all start states scores how hard the goal is to reach.

use crate::domain::AttributeDomain;
use crate::error::{PlanningError, ValidationError};
use crate::goal::Goal;
use crate::object::{Configuration, ObjectState};
use crate::transition::{Action, TransitionRule};
use derive_getters::Getters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace, warn};

/// Reward of every step, goal-reaching or not.
pub const STEP_COST: f64 = -1.0;
/// Extra reward for landing on the goal.
pub const GOAL_REWARD: f64 = 0.0;
/// Default discount factor.
pub const DEFAULT_DISCOUNT: f64 = 0.95;
/// Default convergence threshold on the largest value change.
pub const DEFAULT_THRESHOLD: f64 = 1e-6;
/// Default cap on sweeps.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10_000;

/// Solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Getters)]
pub struct PlannerSettings {
    /// Discount factor in `[0, 1)`.
    discount: f64,
    /// Sweeps stop once no value moves by more than this.
    threshold: f64,
    /// Sweeps stop here even without convergence.
    max_iterations: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PlannerSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanningError`] for a discount outside `[0, 1)`, a
    /// non-positive threshold, or a zero iteration limit.
    pub fn new(discount: f64, threshold: f64, max_iterations: u32) -> Result<Self, PlanningError> {
        if !(0.0..1.0).contains(&discount) {
            return Err(PlanningError::InvalidDiscount(discount));
        }
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(PlanningError::InvalidThreshold(threshold));
        }
        if max_iterations == 0 {
            return Err(PlanningError::ZeroIterationLimit);
        }
        Ok(Self {
            discount,
            threshold,
            max_iterations,
        })
    }
}

/// Transition table of one domain and rule, shared by every goal.
///
/// States are indexed `a·n² + b·n + c` over the `n` objects of the domain,
/// enumerated shape, then shade, then pattern.
#[derive(Debug, Clone)]
pub struct PlanningModel {
    domain: AttributeDomain,
    objects: Vec<ObjectState>,
    lookup: HashMap<ObjectState, usize>,
    // Row `state * 6 + action` spans `offsets[row]..offsets[row + 1]`.
    offsets: Vec<usize>,
    entries: Vec<(usize, f64)>,
}

impl PlanningModel {
    /// Enumerates the state space and tabulates every transition.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::Configuration`] if the rule produces
    /// patterns the domain lacks.
    #[instrument(skip_all)]
    pub fn build(domain: &AttributeDomain, rule: &TransitionRule) -> Result<Self, PlanningError> {
        rule.check_domain(domain)?;

        let objects: Vec<ObjectState> = domain
            .shapes()
            .iter()
            .flat_map(|&shape| {
                domain.shades().flat_map(move |color| {
                    domain
                        .patterns()
                        .iter()
                        .map(move |&pattern| ObjectState::new(shape, color, pattern))
                })
            })
            .collect();
        let lookup = objects
            .iter()
            .enumerate()
            .map(|(index, object)| (*object, index))
            .collect();

        let mut model = Self {
            domain: domain.clone(),
            objects,
            lookup,
            offsets: vec![0],
            entries: Vec::new(),
        };

        for state in 0..model.state_count() {
            let slots = model.split(state);
            for action in Action::ALL {
                let agent = &model.objects[slots[action.agent.index()]];
                let recipient = &model.objects[slots[action.recipient.index()]];
                for outcome in rule.outcomes(domain, agent, recipient)? {
                    let mut next = slots;
                    next[action.recipient.index()] = model.object_index(&outcome.state)?;
                    let next = model.join(next);
                    model.entries.push((next, outcome.probability));
                }
                model.offsets.push(model.entries.len());
            }
        }

        info!(
            objects = model.objects.len(),
            states = model.state_count(),
            transitions = model.entries.len(),
            "Planning model built"
        );
        Ok(model)
    }

    /// Domain the model was built for.
    pub fn domain(&self) -> &AttributeDomain {
        &self.domain
    }

    /// Number of configurations, `n³`.
    pub fn state_count(&self) -> usize {
        self.objects.len().pow(3)
    }

    /// Index of `configuration`, if every slot lies in the domain.
    pub fn index_of(&self, configuration: &Configuration) -> Option<usize> {
        let mut slots = [0; 3];
        for (slot, object) in configuration.iter() {
            slots[slot.index()] = *self.lookup.get(object)?;
        }
        Some(self.join(slots))
    }

    /// Configuration at `index`, if in range.
    pub fn configuration(&self, index: usize) -> Option<Configuration> {
        (index < self.state_count()).then(|| {
            let [a, b, c] = self.split(index);
            Configuration::new(self.objects[a], self.objects[b], self.objects[c])
        })
    }

    /// Every configuration in index order.
    pub fn configurations(&self) -> impl Iterator<Item = Configuration> + '_ {
        (0..self.state_count()).filter_map(|index| self.configuration(index))
    }

    fn split(&self, index: usize) -> [usize; 3] {
        let n = self.objects.len();
        [index / (n * n), (index / n) % n, index % n]
    }

    fn join(&self, [a, b, c]: [usize; 3]) -> usize {
        let n = self.objects.len();
        a * n * n + b * n + c
    }

    fn object_index(&self, object: &ObjectState) -> Result<usize, ValidationError> {
        self.domain.check(object)?;
        self.lookup.get(object).copied().ok_or_else(|| {
            ValidationError::ContractViolation(format!("{} missing from the state space", object))
        })
    }

    fn transitions(&self, state: usize, action: usize) -> &[(usize, f64)] {
        let row = state * Action::ALL.len() + action;
        &self.entries[self.offsets[row]..self.offsets[row + 1]]
    }

    fn q_value(
        &self,
        values: &[f64],
        state: usize,
        action: usize,
        goal: usize,
        discount: f64,
    ) -> f64 {
        self.transitions(state, action)
            .iter()
            .map(|&(next, probability)| {
                let reward = if next == goal {
                    STEP_COST + GOAL_REWARD
                } else {
                    STEP_COST
                };
                probability * (reward + discount * values[next])
            })
            .sum()
    }

    /// Solves the MDP for `goal`.
    ///
    /// Sweeps synchronously from all-zero values until the largest change
    /// drops to the threshold or the iteration limit is hit.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::Configuration`] if the goal is outside the domain.
    #[instrument(skip(self, goal, settings), fields(goal = %goal))]
    pub fn value_iteration(
        &self,
        goal: &Goal,
        settings: &PlannerSettings,
    ) -> Result<ValueFunction, PlanningError> {
        goal.configuration().check_domain(&self.domain)?;
        let goal_index = self.index_of(goal.configuration()).ok_or_else(|| {
            ValidationError::ContractViolation(format!("goal {} missing from the state space", goal))
        })?;

        let states = self.state_count();
        let mut values = vec![0.0; states];
        let mut next = vec![0.0; states];
        let mut delta = f64::INFINITY;
        let mut iterations = 0;

        while delta > settings.threshold && iterations < settings.max_iterations {
            for (state, value) in next.iter_mut().enumerate() {
                *value = if state == goal_index {
                    0.0
                } else {
                    (0..Action::ALL.len())
                        .map(|action| self.q_value(&values, state, action, goal_index, settings.discount))
                        .fold(f64::NEG_INFINITY, f64::max)
                };
            }
            delta = next
                .iter()
                .zip(&values)
                .map(|(new, old)| (new - old).abs())
                .fold(0.0, f64::max);
            std::mem::swap(&mut values, &mut next);
            iterations += 1;
            trace!(iterations, delta, "Sweep finished");
        }

        let converged = delta <= settings.threshold;
        if converged {
            debug!(iterations, delta, "Value iteration converged");
        } else {
            warn!(iterations, delta, "Value iteration hit the iteration limit");
        }

        Ok(ValueFunction {
            goal: *goal,
            goal_index,
            discount: settings.discount,
            values,
            iterations,
            delta,
            converged,
        })
    }

    /// Expected discounted return of each action from `configuration`, in
    /// [`Action::ALL`] order.
    pub fn q_values(
        &self,
        values: &ValueFunction,
        configuration: &Configuration,
    ) -> Option<[f64; 6]> {
        let state = self.index_of(configuration)?;
        if values.values.len() != self.state_count() {
            return None;
        }
        Some(std::array::from_fn(|action| {
            self.q_value(&values.values, state, action, values.goal_index, values.discount)
        }))
    }

    /// Greedy action under `values`; `None` at the goal or off the model.
    pub fn best_action(
        &self,
        values: &ValueFunction,
        configuration: &Configuration,
    ) -> Option<Action> {
        if configuration == values.goal.configuration() {
            return None;
        }
        let q = self.q_values(values, configuration)?;
        let (best, _) = q
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.total_cmp(y))?;
        Action::ALL.get(best).copied()
    }
}

/// Optimal state values for one goal.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ValueFunction {
    /// Goal solved for.
    goal: Goal,
    #[getter(skip)]
    goal_index: usize,
    /// Discount the values were computed with.
    discount: f64,
    /// Value per state index.
    values: Vec<f64>,
    /// Sweeps performed.
    iterations: u32,
    /// Largest change in the final sweep.
    delta: f64,
    /// Whether the threshold was reached.
    converged: bool,
}

impl ValueFunction {
    /// Value of `configuration` under `model`.
    pub fn value(&self, model: &PlanningModel, configuration: &Configuration) -> Option<f64> {
        model
            .index_of(configuration)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Mean value over every state, the goal included.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Difficulty score of a goal: its mean optimal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalValue {
    /// Goal scored.
    pub goal: Goal,
    /// Mean optimal value; closer to zero is easier.
    pub value: f64,
    /// Sweeps the solve took.
    pub iterations: u32,
    /// Whether the solve converged.
    pub converged: bool,
}

impl From<&ValueFunction> for GoalValue {
    fn from(values: &ValueFunction) -> Self {
        Self {
            goal: values.goal,
            value: values.mean(),
            iterations: values.iterations,
            converged: values.converged,
        }
    }
}

/// Builds the model and solves for a single goal.
///
/// # Errors
///
/// Returns a [`PlanningError`] if the rule does not fit the domain or the
/// goal lies outside it.
pub fn value_iteration(
    domain: &AttributeDomain,
    rule: &TransitionRule,
    goal: &Goal,
    settings: &PlannerSettings,
) -> Result<ValueFunction, PlanningError> {
    PlanningModel::build(domain, rule)?.value_iteration(goal, settings)
}

/// Scores value functions, easiest goal first.
pub fn aggregate_goal_values<'a>(
    values: impl IntoIterator<Item = &'a ValueFunction>,
) -> Vec<GoalValue> {
    let mut scores: Vec<GoalValue> = values.into_iter().map(GoalValue::from).collect();
    scores.sort_by(|x, y| y.value.total_cmp(&x.value));
    scores
}

/// Solves every goal on one model and returns their scores, easiest first.
///
/// # Errors
///
/// Returns the first [`PlanningError`] raised by a goal.
#[instrument(skip_all, fields(goals = goals.len()))]
pub fn rank_goals(
    model: &PlanningModel,
    goals: &[Goal],
    settings: &PlannerSettings,
) -> Result<Vec<GoalValue>, PlanningError> {
    let solved = goals
        .iter()
        .map(|goal| model.value_iteration(goal, settings))
        .collect::<Result<Vec<_>, _>>()?;
    let scores = aggregate_goal_values(&solved);
    info!(goals = scores.len(), "Goals ranked");
    Ok(scores)
}
