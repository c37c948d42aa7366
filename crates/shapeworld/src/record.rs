//! Trial records: one per menu view, action, submission or abandonment.
//!
//! Records are append-only. Each constructor fills exactly the fields its
//! record type needs; [`TrialRecord::validate`] checks that contract for
//! records coming from elsewhere.

use crate::error::RecordError;
use derive_getters::Getters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shapeworld_core::{
    Configuration, Goal, GoalItem, MenuItem, MenuLayout, MenuPosition, SlotId,
};
use tokio::time::Instant;
use tracing::{instrument, warn};

/// Kind of record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrialType {
    /// Builder menu shown.
    Menu,
    /// Builder placement/removal or pursuit transition.
    Action,
    /// Builder goal submitted.
    Submit,
    /// Pursuit trial abandoned.
    Abandon,
}

/// Experiment phase a record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Goal construction from the menu.
    Builder,
    /// Goal pursuit by pairwise interactions.
    Pursuit,
}

/// Wall-clock and trial-relative time source for records.
#[derive(Debug, Clone)]
pub struct TrialClock {
    started: Instant,
    participant_id: Option<String>,
}

impl TrialClock {
    /// Starts the clock now.
    pub fn start(participant_id: Option<String>) -> Self {
        Self {
            started: Instant::now(),
            participant_id,
        }
    }

    /// Milliseconds since the trial started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Participant written into every record.
    pub fn participant_id(&self) -> Option<&str> {
        self.participant_id.as_deref()
    }
}

/// One logged event of a trial.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize, JsonSchema)]
pub struct TrialRecord {
    /// Record kind.
    trial_type: TrialType,
    /// Phase the record belongs to.
    phase: Phase,
    /// Monotonic action counter within the trial.
    action_number: u32,
    /// Menu grid as shown.
    #[serde(default)]
    menu_layout: Option<MenuLayout>,
    /// Menu item placed or removed.
    #[serde(default)]
    shape_selected: Option<MenuItem>,
    /// Menu position of the selected item.
    #[serde(default)]
    menu_position: Option<MenuPosition>,
    /// One-based slot index filled or emptied.
    #[serde(default)]
    slot_filled: Option<u8>,
    /// Whether the action removed an item.
    #[serde(default)]
    shape_removed: Option<bool>,
    /// Submitted goal, in slot order.
    #[serde(default)]
    final_goal: Option<Vec<GoalItem>>,
    /// Agent slot of a transition.
    #[serde(default)]
    agent: Option<SlotId>,
    /// Recipient slot of a transition.
    #[serde(default)]
    recipient: Option<SlotId>,
    /// Configuration before the transition.
    #[serde(default)]
    state_before: Option<Configuration>,
    /// Configuration after the transition.
    #[serde(default)]
    state_after: Option<Configuration>,
    /// Goal being pursued.
    #[serde(default)]
    goal_state: Option<Goal>,
    /// Whether the configuration now matches the goal.
    #[serde(default)]
    goal_achieved: Option<bool>,
    /// Whether the trial was abandoned.
    #[serde(default)]
    abandoned: bool,
    /// Milliseconds since trial start.
    completion_time: u64,
    /// RFC 3339 wall-clock time.
    timestamp: String,
    /// Participant identifier.
    #[serde(default)]
    participant_id: Option<String>,
}

impl TrialRecord {
    fn base(trial_type: TrialType, phase: Phase, action_number: u32, clock: &TrialClock) -> Self {
        Self {
            trial_type,
            phase,
            action_number,
            menu_layout: None,
            shape_selected: None,
            menu_position: None,
            slot_filled: None,
            shape_removed: None,
            final_goal: None,
            agent: None,
            recipient: None,
            state_before: None,
            state_after: None,
            goal_state: None,
            goal_achieved: None,
            abandoned: false,
            completion_time: clock.elapsed_ms(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            participant_id: clock.participant_id().map(str::to_string),
        }
    }

    /// Builder menu shown to the participant.
    pub fn menu(layout: &MenuLayout, clock: &TrialClock) -> Self {
        Self {
            menu_layout: Some(layout.clone()),
            ..Self::base(TrialType::Menu, Phase::Builder, 0, clock)
        }
    }

    /// Builder placement or removal.
    pub fn builder_action(
        action_number: u32,
        item: &MenuItem,
        position: Option<MenuPosition>,
        slot: SlotId,
        removed: bool,
        clock: &TrialClock,
    ) -> Self {
        Self {
            shape_selected: Some(item.clone()),
            menu_position: position,
            slot_filled: Some(slot_number(slot)),
            shape_removed: Some(removed),
            ..Self::base(TrialType::Action, Phase::Builder, action_number, clock)
        }
    }

    /// Builder goal submission.
    pub fn submit(
        action_number: u32,
        layout: &MenuLayout,
        final_goal: Vec<GoalItem>,
        clock: &TrialClock,
    ) -> Self {
        Self {
            menu_layout: Some(layout.clone()),
            final_goal: Some(final_goal),
            ..Self::base(TrialType::Submit, Phase::Builder, action_number, clock)
        }
    }

    /// Pursuit transition.
    #[allow(clippy::too_many_arguments)]
    pub fn pursuit_action(
        action_number: u32,
        agent: SlotId,
        recipient: SlotId,
        before: Configuration,
        after: Configuration,
        goal: Goal,
        goal_achieved: bool,
        clock: &TrialClock,
    ) -> Self {
        Self {
            agent: Some(agent),
            recipient: Some(recipient),
            state_before: Some(before),
            state_after: Some(after),
            goal_state: Some(goal),
            goal_achieved: Some(goal_achieved),
            ..Self::base(TrialType::Action, Phase::Pursuit, action_number, clock)
        }
    }

    /// Pursuit trial abandoned.
    pub fn abandon(action_number: u32, state: Configuration, goal: Goal, clock: &TrialClock) -> Self {
        Self {
            state_after: Some(state),
            goal_state: Some(goal),
            goal_achieved: Some(false),
            abandoned: true,
            ..Self::base(TrialType::Abandon, Phase::Pursuit, action_number, clock)
        }
    }

    /// Checks that the fields required for this record type are present.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordError`] found.
    #[instrument(skip(self), fields(trial_type = %self.trial_type, phase = %self.phase))]
    pub fn validate(&self) -> Result<(), RecordError> {
        let missing = |field: &'static str| RecordError::MissingField {
            trial_type: self.trial_type,
            field,
        };
        let require = |present: bool, field: &'static str| if present { Ok(()) } else { Err(missing(field)) };

        let result = match (self.trial_type, self.phase) {
            (TrialType::Menu, _) => require(self.menu_layout.is_some(), "menu_layout"),
            (TrialType::Action, Phase::Builder) => {
                require(self.shape_selected.is_some(), "shape_selected")?;
                require(self.slot_filled.is_some(), "slot_filled")
            }
            (TrialType::Action, Phase::Pursuit) => {
                require(self.agent.is_some(), "agent")?;
                require(self.recipient.is_some(), "recipient")?;
                require(self.state_before.is_some(), "state_before")?;
                require(self.state_after.is_some(), "state_after")?;
                require(self.goal_state.is_some(), "goal_state")
            }
            (TrialType::Submit, _) => {
                require(self.menu_layout.is_some(), "menu_layout")?;
                match &self.final_goal {
                    None => Err(missing("final_goal")),
                    Some(goal) if goal.len() != 3 => Err(RecordError::FinalGoalLength(goal.len())),
                    Some(_) => Ok(()),
                }
            }
            (TrialType::Abandon, _) => {
                require(self.state_after.is_some(), "state_after")?;
                require(self.goal_state.is_some(), "goal_state")?;
                if self.abandoned {
                    Ok(())
                } else {
                    Err(RecordError::NotAbandoned)
                }
            }
        };

        if let Err(e) = &result {
            warn!(error = %e, "Record failed validation");
        }
        result
    }
}

/// One-based slot number as written to records.
pub fn slot_number(slot: SlotId) -> u8 {
    match slot {
        SlotId::A => 1,
        SlotId::B => 2,
        SlotId::C => 3,
    }
}
