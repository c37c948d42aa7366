//! Two-pick selection state machine.
//!
//! ```text
//! Empty ──select(x)──▶ OneSelected(x) ──select(y≠x)──▶ Pending(x → y)
//!   ▲                        │                               │
//!   └──────select(x)─────────┘◀──────────complete()──────────┘
//! ```
//!
//! Selections while a transition is pending are ignored.

use crate::error::InvalidSelectionError;
use serde::{Deserialize, Serialize};
use shapeworld_core::{Action, SlotId};
use tracing::{debug, instrument, warn};

/// Current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    /// Nothing picked.
    #[default]
    Empty,
    /// Agent picked.
    OneSelected {
        /// The primary-selected slot.
        agent: SlotId,
    },
    /// Both picked; a transition is scheduled.
    Pending {
        /// The scheduled interaction.
        action: Action,
    },
}

/// Visual marker a slot carries while selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Marker {
    /// First pick (agent).
    Primary,
    /// Second pick (recipient).
    Secondary,
}

/// What a call to [`SelectionController::select`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// Slot marked.
    Selected {
        /// Marked slot.
        slot: SlotId,
        /// Marker applied.
        marker: Marker,
    },
    /// The agent was picked again and the selection cleared.
    Deselected {
        /// Slot that was unmarked.
        slot: SlotId,
    },
    /// Second distinct pick; one transition scheduled.
    TransitionScheduled {
        /// The scheduled interaction.
        action: Action,
    },
    /// Pick arrived while a transition was pending and was dropped.
    Ignored {
        /// Slot that was picked.
        slot: SlotId,
    },
}

/// Tracks agent/recipient picks and guards against overlapping transitions.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    /// Creates an empty controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Scheduled action, if a transition is pending.
    pub fn pending(&self) -> Option<Action> {
        match self.state {
            SelectionState::Pending { action } => Some(action),
            _ => None,
        }
    }

    /// Marker currently on `slot`.
    pub fn marker(&self, slot: SlotId) -> Option<Marker> {
        match self.state {
            SelectionState::OneSelected { agent } if agent == slot => Some(Marker::Primary),
            SelectionState::Pending { action } if action.agent == slot => Some(Marker::Primary),
            SelectionState::Pending { action } if action.recipient == slot => Some(Marker::Secondary),
            _ => None,
        }
    }

    /// Selects a slot by label.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSelectionError`] for labels other than `a`, `b`,
    /// `c`; the state is left unchanged.
    #[instrument(skip(self), fields(state = ?self.state))]
    pub fn select_label(&mut self, label: &str) -> Result<SelectionEvent, InvalidSelectionError> {
        match SlotId::parse(label) {
            Ok(slot) => Ok(self.select(slot)),
            Err(_) => {
                warn!(label, "Selection of unknown slot rejected");
                Err(InvalidSelectionError::new(label))
            }
        }
    }

    /// Selects a slot.
    #[instrument(skip(self), fields(state = ?self.state))]
    pub fn select(&mut self, slot: SlotId) -> SelectionEvent {
        let (next, event) = match self.state {
            SelectionState::Empty => (
                SelectionState::OneSelected { agent: slot },
                SelectionEvent::Selected {
                    slot,
                    marker: Marker::Primary,
                },
            ),
            SelectionState::OneSelected { agent } if agent == slot => {
                (SelectionState::Empty, SelectionEvent::Deselected { slot })
            }
            SelectionState::OneSelected { agent } => {
                let action = Action {
                    agent,
                    recipient: slot,
                };
                (
                    SelectionState::Pending { action },
                    SelectionEvent::TransitionScheduled { action },
                )
            }
            SelectionState::Pending { .. } => (self.state, SelectionEvent::Ignored { slot }),
        };
        debug!(?event, "Selection handled");
        self.state = next;
        event
    }

    /// Clears the selection after the pending transition committed.
    ///
    /// Returns the action that was pending.
    pub fn complete(&mut self) -> Option<Action> {
        let action = self.pending();
        self.reset();
        action
    }

    /// Clears the selection unconditionally.
    pub fn reset(&mut self) {
        self.state = SelectionState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_slot_twice_deselects() {
        let mut controller = SelectionController::new();
        controller.select(SlotId::B);
        assert_eq!(controller.select(SlotId::B), SelectionEvent::Deselected { slot: SlotId::B });
        assert_eq!(controller.state(), SelectionState::Empty);
        assert_eq!(controller.pending(), None);
    }

    #[test]
    fn test_two_slots_schedule_transition() {
        let mut controller = SelectionController::new();
        controller.select(SlotId::C);
        let event = controller.select(SlotId::A);
        let action = Action {
            agent: SlotId::C,
            recipient: SlotId::A,
        };
        assert_eq!(event, SelectionEvent::TransitionScheduled { action });
        assert_eq!(controller.marker(SlotId::C), Some(Marker::Primary));
        assert_eq!(controller.marker(SlotId::A), Some(Marker::Secondary));
        assert_eq!(controller.marker(SlotId::B), None);
    }

    #[test]
    fn test_pending_ignores_selection() {
        let mut controller = SelectionController::new();
        controller.select(SlotId::A);
        controller.select(SlotId::B);
        let before = controller.state();
        assert_eq!(controller.select(SlotId::B), SelectionEvent::Ignored { slot: SlotId::B });
        assert_eq!(controller.select(SlotId::C), SelectionEvent::Ignored { slot: SlotId::C });
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn test_complete_returns_to_empty() {
        let mut controller = SelectionController::new();
        controller.select(SlotId::A);
        controller.select(SlotId::B);
        assert!(controller.complete().is_some());
        assert_eq!(controller.state(), SelectionState::Empty);
        assert_eq!(controller.complete(), None);
    }

    #[test]
    fn test_invalid_label_keeps_state() {
        let mut controller = SelectionController::new();
        controller.select(SlotId::A);
        let err = controller.select_label("d").expect_err("d is not a slot");
        assert_eq!(err.label, "d");
        assert_eq!(controller.state(), SelectionState::OneSelected { agent: SlotId::A });
    }
}
