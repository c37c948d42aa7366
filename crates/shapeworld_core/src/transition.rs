//! Transition rule: how an agent object transforms a recipient.
//!
//! Each attribute of the recipient is updated independently:
//!
//! - **color** steps one shade toward the agent's shade, wrapping at the
//!   domain bounds, and stays put when the shades are equal;
//! - **shape** adopts the agent's shape with probability `shape_bias`;
//! - **pattern** toggles according to the [`PatternVariant`].
//!
//! Random draws happen in a fixed order (shape, then pattern) so a seeded
//! source replays a trial exactly.

use crate::contracts::TransitionContract;
use crate::domain::{AttributeDomain, Pattern, PatternVariant, Shade};
use crate::error::{ConfigurationError, ValidationError};
use crate::object::{Configuration, ObjectState, SlotId};
use crate::random::RandomSource;
use derive_getters::Getters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument, trace};

/// Default probability that a recipient adopts the agent's shape.
pub const DEFAULT_SHAPE_BIAS: f64 = 0.8;

/// Probability of `striped` (versus `dotted`) when an extended toggle leaves `plain`.
const STRIPED_PROBABILITY: f64 = 0.5;

/// A pairwise interaction: `agent` acts on `recipient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    /// First-picked slot.
    pub agent: SlotId,
    /// Second-picked slot; its object is transformed.
    pub recipient: SlotId,
}

impl Action {
    /// All six ordered pairs of distinct slots.
    pub const ALL: [Action; 6] = [
        Action::pair(SlotId::A, SlotId::B),
        Action::pair(SlotId::A, SlotId::C),
        Action::pair(SlotId::B, SlotId::A),
        Action::pair(SlotId::B, SlotId::C),
        Action::pair(SlotId::C, SlotId::A),
        Action::pair(SlotId::C, SlotId::B),
    ];

    const fn pair(agent: SlotId, recipient: SlotId) -> Self {
        Self { agent, recipient }
    }

    /// Creates an action, rejecting a slot acting on itself.
    pub fn new(agent: SlotId, recipient: SlotId) -> Result<Self, ValidationError> {
        if agent == recipient {
            return Err(ValidationError::SelfInteraction(agent));
        }
        Ok(Self { agent, recipient })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.agent, self.recipient)
    }
}

/// One possible next state of a recipient with its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Resulting recipient state.
    pub state: ObjectState,
    /// Probability of this result.
    pub probability: f64,
}

/// Parameters of the transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Getters)]
#[serde(try_from = "RawTransitionRule")]
pub struct TransitionRule {
    /// Probability that the recipient adopts the agent's shape.
    shape_bias: f64,
    /// Pattern toggle behaviour.
    pattern_variant: PatternVariant,
}

#[derive(Deserialize, JsonSchema)]
struct RawTransitionRule {
    shape_bias: f64,
    pattern_variant: PatternVariant,
}

impl TryFrom<RawTransitionRule> for TransitionRule {
    type Error = ConfigurationError;

    fn try_from(raw: RawTransitionRule) -> Result<Self, Self::Error> {
        Self::new(raw.shape_bias, raw.pattern_variant)
    }
}

impl Default for TransitionRule {
    fn default() -> Self {
        Self {
            shape_bias: DEFAULT_SHAPE_BIAS,
            pattern_variant: PatternVariant::default(),
        }
    }
}

impl TransitionRule {
    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidBias`] unless `shape_bias` is in `[0, 1]`.
    #[instrument]
    pub fn new(shape_bias: f64, pattern_variant: PatternVariant) -> Result<Self, ConfigurationError> {
        if !(0.0..=1.0).contains(&shape_bias) {
            return Err(ConfigurationError::InvalidBias(shape_bias));
        }
        Ok(Self {
            shape_bias,
            pattern_variant,
        })
    }

    /// Checks that every pattern this rule can produce is legal in `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::VariantOutsideDomain`] naming the first
    /// pattern the domain lacks.
    #[instrument(skip(domain))]
    pub fn check_domain(&self, domain: &AttributeDomain) -> Result<(), ConfigurationError> {
        match self
            .pattern_variant
            .patterns()
            .iter()
            .find(|pattern| !domain.patterns().contains(pattern))
        {
            Some(pattern) => Err(ConfigurationError::VariantOutsideDomain(*pattern)),
            None => Ok(()),
        }
    }

    /// Computes the recipient's next state.
    ///
    /// Never mutates its inputs. Draws one sample for the shape and, under
    /// the extended variant, one for the pattern when the recipient is plain.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfDomain`] if either object is outside `domain`.
    #[instrument(skip(self, domain, agent, recipient, rng), fields(agent = %agent, recipient = %recipient))]
    pub fn transform(
        &self,
        domain: &AttributeDomain,
        agent: &ObjectState,
        recipient: &ObjectState,
        rng: &mut dyn RandomSource,
    ) -> Result<ObjectState, ValidationError> {
        domain.check(agent)?;
        domain.check(recipient)?;

        let color = next_shade(domain, agent.color, recipient.color);

        let draw = rng.next_f64();
        let shape = if draw < self.shape_bias {
            agent.shape
        } else {
            recipient.shape
        };
        trace!(draw, adopted = draw < self.shape_bias, "Shape draw");

        let pattern = match (recipient.pattern, self.pattern_variant) {
            (Pattern::Plain, PatternVariant::Simple) => Pattern::Striped,
            (Pattern::Plain, PatternVariant::Extended) => {
                if rng.next_f64() < STRIPED_PROBABILITY {
                    Pattern::Striped
                } else {
                    Pattern::Dotted
                }
            }
            _ => Pattern::Plain,
        };

        let next = ObjectState::new(shape, color, pattern);
        debug!(next = %next, "Computed recipient transition");
        Ok(next)
    }

    /// Applies `action` to a whole configuration, returning the next configuration.
    ///
    /// Only the recipient slot changes. Preconditions are always checked;
    /// postconditions in debug builds.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the action is a self-interaction or
    /// the configuration is out of domain.
    #[instrument(skip(self, domain, configuration, action, rng), fields(action = %action))]
    pub fn apply(
        &self,
        domain: &AttributeDomain,
        configuration: &Configuration,
        action: Action,
        rng: &mut dyn RandomSource,
    ) -> Result<Configuration, ValidationError> {
        TransitionContract::pre(domain, configuration, &action)?;

        let next_recipient = self.transform(
            domain,
            configuration.get(action.agent),
            configuration.get(action.recipient),
            rng,
        )?;
        let mut next = *configuration;
        next.set(action.recipient, next_recipient);

        #[cfg(debug_assertions)]
        TransitionContract::post(domain, configuration, &next, &action)?;

        Ok(next)
    }

    /// Exact distribution over the recipient's next state.
    ///
    /// Outcomes with zero probability are omitted; the rest sum to one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfDomain`] if either object is outside `domain`.
    #[instrument(skip(self, domain))]
    pub fn outcomes(
        &self,
        domain: &AttributeDomain,
        agent: &ObjectState,
        recipient: &ObjectState,
    ) -> Result<Vec<Outcome>, ValidationError> {
        domain.check(agent)?;
        domain.check(recipient)?;

        let color = next_shade(domain, agent.color, recipient.color);

        let shapes = if agent.shape == recipient.shape {
            vec![(agent.shape, 1.0)]
        } else {
            vec![
                (agent.shape, self.shape_bias),
                (recipient.shape, 1.0 - self.shape_bias),
            ]
        };

        let patterns = match (recipient.pattern, self.pattern_variant) {
            (Pattern::Plain, PatternVariant::Simple) => vec![(Pattern::Striped, 1.0)],
            (Pattern::Plain, PatternVariant::Extended) => vec![
                (Pattern::Striped, STRIPED_PROBABILITY),
                (Pattern::Dotted, 1.0 - STRIPED_PROBABILITY),
            ],
            _ => vec![(Pattern::Plain, 1.0)],
        };

        let outcomes = shapes
            .iter()
            .flat_map(|&(shape, p_shape)| {
                patterns.iter().map(move |&(pattern, p_pattern)| Outcome {
                    state: ObjectState::new(shape, color, pattern),
                    probability: p_shape * p_pattern,
                })
            })
            .filter(|outcome| outcome.probability > 0.0)
            .collect();

        Ok(outcomes)
    }
}

/// Steps `recipient` one shade toward `agent`, wrapping at the domain bounds.
///
/// The direction is decided by comparing the raw ordinals, not by the
/// shorter way around the cycle.
pub fn next_shade(domain: &AttributeDomain, agent: Shade, recipient: Shade) -> Shade {
    match agent.cmp(&recipient) {
        Ordering::Greater => domain.wrap_increment(recipient),
        Ordering::Less => domain.wrap_decrement(recipient),
        Ordering::Equal => recipient,
    }
}
