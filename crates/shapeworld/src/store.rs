//! Live configuration and goal of one trial.

use shapeworld_core::{
    AttributeDomain, Configuration, ConfigurationError, Goal, ObjectState, SlotId, is_fulfilled,
};
use tracing::{debug, instrument};

/// Owns the trial's configuration and goal.
///
/// Only the session writes to it, and only with the result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationStore {
    configuration: Configuration,
    goal: Goal,
}

impl ConfigurationStore {
    /// Creates a store after checking both configurations against `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OutOfDomain`] if either holds an illegal object.
    #[instrument(skip(domain, configuration, goal), fields(configuration = %configuration, goal = %goal))]
    pub fn new(
        domain: &AttributeDomain,
        configuration: Configuration,
        goal: Goal,
    ) -> Result<Self, ConfigurationError> {
        configuration.check_domain(domain)?;
        goal.configuration().check_domain(domain)?;
        debug!("Configuration store ready");
        Ok(Self { configuration, goal })
    }

    /// Object currently in `slot`.
    pub fn get(&self, slot: SlotId) -> &ObjectState {
        self.configuration.get(slot)
    }

    pub(crate) fn set(&mut self, slot: SlotId, object: ObjectState) {
        debug!(%slot, %object, "Slot updated");
        self.configuration.set(slot, object);
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> Configuration {
        self.configuration
    }

    /// The trial's goal.
    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    /// Whether the current configuration matches the goal.
    pub fn is_fulfilled(&self) -> bool {
        is_fulfilled(&self.configuration, &self.goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeworld_core::{Pattern, PatternVariant, Shade, Shape};

    fn config(shade: u8) -> Configuration {
        Configuration::new(
            ObjectState::new(Shape::Square, Shade::new(shade), Pattern::Plain),
            ObjectState::new(Shape::Circle, Shade::new(2), Pattern::Striped),
            ObjectState::new(Shape::Triangle, Shade::new(3), Pattern::Plain),
        )
    }

    #[test]
    fn test_rejects_out_of_domain_goal() {
        let domain = AttributeDomain::pursuit(PatternVariant::Extended);
        let result = ConfigurationStore::new(&domain, config(1), Goal::new(config(9)));
        assert!(matches!(result, Err(ConfigurationError::OutOfDomain { slot: SlotId::A, .. })));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let domain = AttributeDomain::pursuit(PatternVariant::Extended);
        let mut store = ConfigurationStore::new(&domain, config(1), Goal::new(config(1))).expect("valid");
        let before = store.snapshot();
        assert!(store.is_fulfilled());

        store.set(SlotId::A, ObjectState::new(Shape::Circle, Shade::new(4), Pattern::Dotted));
        assert_eq!(before, config(1));
        assert_eq!(store.get(SlotId::A).shape, Shape::Circle);
        assert!(!store.is_fulfilled());
    }
}
