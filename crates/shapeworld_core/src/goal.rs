//! Goals and goal evaluation.

use crate::domain::{AttributeDomain, Pattern, Shade, Shape};
use crate::error::{ConfigurationError, ValidationError};
use crate::menu::MenuItem;
use crate::object::{Configuration, ObjectState, SlotId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One entry of a submitted goal, as produced by the builder menu.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, derive_new::new,
)]
pub struct GoalItem {
    /// Outline.
    pub shape: Shape,
    /// Shade ordinal.
    pub shade: Shade,
    /// Surface pattern.
    pub texture: Pattern,
}

impl From<&MenuItem> for GoalItem {
    fn from(item: &MenuItem) -> Self {
        Self {
            shape: item.shape,
            shade: item.shade,
            texture: item.texture,
        }
    }
}

impl From<GoalItem> for ObjectState {
    fn from(item: GoalItem) -> Self {
        ObjectState::new(item.shape, item.shade, item.texture)
    }
}

/// Target configuration of a trial. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Goal(Configuration);

impl Goal {
    /// Wraps a configuration as a goal.
    pub fn new(configuration: Configuration) -> Self {
        Self(configuration)
    }

    /// Maps a three-entry submission onto slots `a`, `b`, `c` by position.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::GoalLength`] unless exactly three entries are given.
    #[instrument]
    pub fn from_items(items: &[GoalItem]) -> Result<Self, ConfigurationError> {
        match items {
            [a, b, c] => Ok(Self(Configuration::new((*a).into(), (*b).into(), (*c).into()))),
            _ => Err(ConfigurationError::GoalLength(items.len())),
        }
    }

    /// The goal as a configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.0
    }

    /// Goal object for `slot`.
    pub fn get(&self, slot: SlotId) -> &ObjectState {
        self.0.get(slot)
    }

    /// The goal as a submission array.
    pub fn items(&self) -> [GoalItem; 3] {
        SlotId::ALL.map(|slot| {
            let object = self.0.get(slot);
            GoalItem::new(object.shape, object.color, object.pattern)
        })
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether `configuration` matches `goal` exactly.
///
/// Strict conjunction over all three slots and all three attributes;
/// there is no partial credit.
#[instrument(skip_all)]
pub fn is_fulfilled(configuration: &Configuration, goal: &Goal) -> bool {
    let fulfilled = SlotId::ALL
        .iter()
        .all(|&slot| configuration.get(slot) == goal.get(slot));
    debug!(fulfilled, "Evaluated goal");
    fulfilled
}

/// Slots whose object differs from the goal.
pub fn mismatches(configuration: &Configuration, goal: &Goal) -> Vec<SlotId> {
    SlotId::ALL
        .into_iter()
        .filter(|&slot| configuration.get(slot) != goal.get(slot))
        .collect()
}

/// Validates both sides against `domain`, then evaluates.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfDomain`] if either configuration holds
/// an object outside `domain`.
#[instrument(skip_all)]
pub fn evaluate(
    domain: &AttributeDomain,
    configuration: &Configuration,
    goal: &Goal,
) -> Result<bool, ValidationError> {
    for (_, object) in configuration.iter().chain(goal.configuration().iter()) {
        domain.check(object)?;
    }
    Ok(is_fulfilled(configuration, goal))
}
