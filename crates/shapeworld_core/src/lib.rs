//! Shapeworld core: the interaction rules of a two-phase shape experiment.
//!
//! Three objects sit in slots `a`, `b` and `c`. A participant picks an
//! agent and a recipient; the recipient is transformed toward the agent
//! by a stochastic rule until the configuration matches a goal.
//!
//! # Architecture
//!
//! - **Domain**: legal shapes, shades and patterns per phase
//! - **Transition**: the color/shape/pattern update rule and its contract
//! - **Goal**: exact-match evaluation
//! - **Menu**: builder menu enumeration, shuffling and layout
//! - **Random**: injectable randomness for replay and scripted tests
//! - **Planning**: value iteration per goal and goal difficulty scores
//!
//! # Example
//!
//! ```
//! use shapeworld_core::{
//!     Action, AttributeDomain, PatternVariant, SeededRandom, SlotId, TransitionRule,
//!     sample_configuration,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let domain = AttributeDomain::pursuit(PatternVariant::Extended);
//! let mut rng = SeededRandom::new(7);
//! let config = sample_configuration(&domain, &mut rng);
//! let action = Action::new(SlotId::A, SlotId::B)?;
//! let next = TransitionRule::default().apply(&domain, &config, action, &mut rng)?;
//! assert_eq!(next.a, config.a);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod contracts;
mod domain;
mod error;
mod goal;
mod menu;
mod object;
mod planning;
mod random;
mod transition;
mod verification;

// Crate-level exports - Domain
pub use domain::{AttributeDomain, Pattern, PatternVariant, Shade, Shape, ShapeSkin};

// Crate-level exports - Objects
pub use object::{Configuration, ObjectState, RawObjectState, SlotId};

// Crate-level exports - Transitions
pub use transition::{Action, DEFAULT_SHAPE_BIAS, Outcome, TransitionRule, next_shade};

// Crate-level exports - Contracts
pub use contracts::{DistinctSlots, OnlyRecipientChanges, TransitionContract, WithinDomain};

// Crate-level exports - Goals
pub use goal::{Goal, GoalItem, evaluate, is_fulfilled, mismatches};

// Crate-level exports - Menu
pub use menu::{
    MenuItem, MenuLayout, MenuPosition, enumerate_combinations, layout, sample_configuration,
    sample_object, shuffle,
};

// Crate-level exports - Planning
pub use planning::{
    DEFAULT_DISCOUNT, DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD, GOAL_REWARD, GoalValue,
    PlannerSettings, PlanningModel, STEP_COST, ValueFunction, aggregate_goal_values, rank_goals,
    value_iteration,
};

// Crate-level exports - Randomness
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};

// Crate-level exports - Errors
pub use error::{ConfigurationError, DomainViolation, PlanningError, ValidationError};
