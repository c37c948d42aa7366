//! Contract-based validation for transitions.
//!
//! Preconditions guard what may be handed to the transition rule;
//! postconditions state what a transition is allowed to change.

use crate::domain::AttributeDomain;
use crate::error::ValidationError;
use crate::object::Configuration;
use crate::transition::Action;
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: agent and recipient are different slots.
pub struct DistinctSlots;

impl DistinctSlots {
    /// Checks the action.
    #[instrument]
    pub fn check(action: &Action) -> Result<(), ValidationError> {
        if action.agent == action.recipient {
            Err(ValidationError::SelfInteraction(action.agent))
        } else {
            Ok(())
        }
    }
}

/// Precondition: every slot lies within the attribute domain.
pub struct WithinDomain;

impl WithinDomain {
    /// Checks all three slots.
    #[instrument(skip(domain, configuration))]
    pub fn check(domain: &AttributeDomain, configuration: &Configuration) -> Result<(), ValidationError> {
        for (_, object) in configuration.iter() {
            domain.check(object)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Postconditions
// ─────────────────────────────────────────────────────────────

/// Postcondition: slots other than the recipient are untouched.
pub struct OnlyRecipientChanges;

impl OnlyRecipientChanges {
    /// Returns whether the transition left bystander slots alone.
    #[instrument(skip(before, after))]
    pub fn holds(before: &Configuration, after: &Configuration, action: &Action) -> bool {
        let valid = before
            .iter()
            .filter(|(slot, _)| *slot != action.recipient)
            .all(|(slot, object)| after.get(slot) == object);
        if !valid {
            warn!(%action, "Transition modified a bystander slot");
        }
        valid
    }
}

// ─────────────────────────────────────────────────────────────
//  Transition Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for applying an [`Action`] to a configuration.
///
/// Preconditions:
/// - agent and recipient differ
/// - configuration is within the domain
///
/// Postconditions:
/// - only the recipient changed
/// - configuration is still within the domain
pub struct TransitionContract;

impl TransitionContract {
    /// Checks preconditions.
    pub fn pre(
        domain: &AttributeDomain,
        configuration: &Configuration,
        action: &Action,
    ) -> Result<(), ValidationError> {
        DistinctSlots::check(action)?;
        WithinDomain::check(domain, configuration)
    }

    /// Checks postconditions.
    pub fn post(
        domain: &AttributeDomain,
        before: &Configuration,
        after: &Configuration,
        action: &Action,
    ) -> Result<(), ValidationError> {
        if !OnlyRecipientChanges::holds(before, after, action) {
            return Err(ValidationError::ContractViolation(format!(
                "bystanders of {} changed",
                action
            )));
        }
        WithinDomain::check(domain, after).map_err(|e| {
            ValidationError::ContractViolation(format!("result left the domain: {}", e))
        })
    }
}
