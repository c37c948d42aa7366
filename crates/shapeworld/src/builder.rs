//! Goal-building phase: fill three slots from a shuffled menu, then submit.

use crate::error::{InvalidSelectionError, SessionError, ShapeworldError};
use crate::record::{TrialClock, TrialRecord, slot_number};
use crate::recorder::EventRecorder;
use serde::{Deserialize, Serialize};
use shapeworld_core::{AttributeDomain, Goal, GoalItem, MenuItem, MenuLayout, RandomSource, SlotId};
use tracing::{debug, info, instrument, warn};

/// What a placement or removal did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BuilderEvent {
    /// Item dropped into an empty slot.
    Placed {
        /// Slot filled.
        slot: SlotId,
        /// Item placed.
        item: MenuItem,
    },
    /// Item taken out of a slot.
    Removed {
        /// Slot emptied.
        slot: SlotId,
        /// Item removed.
        item: MenuItem,
    },
    /// Drop on an occupied slot, or removal from an empty one.
    Ignored {
        /// Slot targeted.
        slot: SlotId,
    },
}

/// One goal-building trial.
pub struct GoalBuilder {
    layout: MenuLayout,
    slots: [Option<MenuItem>; 3],
    recorder: Box<dyn EventRecorder + Send>,
    clock: TrialClock,
    actions: u32,
    submitted: bool,
}

impl std::fmt::Debug for GoalBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoalBuilder")
            .field("slots", &self.slots)
            .field("actions", &self.actions)
            .field("submitted", &self.submitted)
            .finish()
    }
}

impl GoalBuilder {
    /// Generates a shuffled menu, records it, and opens the builder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](shapeworld_core::ConfigurationError)
    /// if the domain does not fill `rows × cols`, or a
    /// [`RecordError`](crate::RecordError) if the menu record cannot be written.
    #[instrument(skip(domain, rng, recorder, clock))]
    pub fn open(
        domain: &AttributeDomain,
        rows: usize,
        cols: usize,
        rng: &mut dyn RandomSource,
        recorder: Box<dyn EventRecorder + Send>,
        clock: TrialClock,
    ) -> Result<Self, ShapeworldError> {
        let layout = MenuLayout::generate(domain, rows, cols, rng)?;
        let mut builder = Self {
            layout,
            slots: [None, None, None],
            recorder,
            clock,
            actions: 0,
            submitted: false,
        };
        builder.emit(TrialRecord::menu(&builder.layout, &builder.clock))?;
        info!(items = builder.layout.len(), "Builder opened");
        Ok(builder)
    }

    /// Menu shown to the participant.
    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    /// Item in `slot`, if filled.
    pub fn slot(&self, slot: SlotId) -> Option<&MenuItem> {
        self.slots[slot.index()].as_ref()
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Recorded placements and removals so far.
    pub fn actions(&self) -> u32 {
        self.actions
    }

    fn emit(&mut self, record: TrialRecord) -> Result<(), ShapeworldError> {
        record.validate()?;
        self.recorder.record(&record)?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.submitted {
            warn!("Builder already submitted");
            Err(SessionError::TrialEnded)
        } else {
            Ok(())
        }
    }

    fn parse_slot(label: &str) -> Result<SlotId, InvalidSelectionError> {
        SlotId::parse(label).map_err(|_| InvalidSelectionError::new(label))
    }

    /// Drops menu item `item_id` into `slot`.
    ///
    /// A drop on an occupied slot is ignored and not recorded.
    ///
    /// # Errors
    ///
    /// - [`InvalidSelectionError`] for a nonexistent slot
    /// - [`SessionError::UnknownMenuItem`] for an id not on the menu
    /// - [`SessionError::TrialEnded`] after submission
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn place(&mut self, item_id: &str, slot: &str) -> Result<BuilderEvent, ShapeworldError> {
        self.ensure_open()?;
        let slot = Self::parse_slot(slot)?;
        let item = self
            .layout
            .find(item_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownMenuItem(item_id.to_string()))?;

        if self.slots[slot.index()].is_some() {
            debug!(%slot, "Drop on occupied slot ignored");
            return Ok(BuilderEvent::Ignored { slot });
        }

        let position = self.layout.position_of(item_id);
        self.emit(TrialRecord::builder_action(
            self.actions + 1,
            &item,
            position,
            slot,
            false,
            &self.clock,
        ))?;
        self.actions += 1;
        self.slots[slot.index()] = Some(item.clone());
        debug!(%slot, slot_number = slot_number(slot), item = %item.id, "Item placed");
        Ok(BuilderEvent::Placed { slot, item })
    }

    /// Takes the item out of `slot`.
    ///
    /// Removing from an empty slot is ignored and not recorded. A failed
    /// record leaves the slot and the action count unchanged.
    ///
    /// # Errors
    ///
    /// - [`InvalidSelectionError`] for a nonexistent slot
    /// - [`SessionError::TrialEnded`] after submission
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn remove(&mut self, slot: &str) -> Result<BuilderEvent, ShapeworldError> {
        self.ensure_open()?;
        let slot = Self::parse_slot(slot)?;
        let Some(item) = self.slots[slot.index()].clone() else {
            debug!(%slot, "Removal from empty slot ignored");
            return Ok(BuilderEvent::Ignored { slot });
        };

        // Removals carry no menu position.
        self.emit(TrialRecord::builder_action(
            self.actions + 1,
            &item,
            None,
            slot,
            true,
            &self.clock,
        ))?;
        self.actions += 1;
        self.slots[slot.index()] = None;
        debug!(%slot, item = %item.id, "Item removed");
        Ok(BuilderEvent::Removed { slot, item })
    }

    /// Submits the three filled slots as the goal.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Incomplete`] unless all three slots are filled
    /// - [`SessionError::TrialEnded`] after a previous submission
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn submit(&mut self) -> Result<Goal, ShapeworldError> {
        self.ensure_open()?;
        let items: Vec<GoalItem> = self.slots.iter().flatten().map(GoalItem::from).collect();
        if items.len() != 3 {
            warn!(filled = items.len(), "Submit with empty slots");
            return Err(SessionError::Incomplete(items.len()).into());
        }

        let goal = Goal::from_items(&items)?;
        self.emit(TrialRecord::submit(
            self.actions + 1,
            &self.layout,
            items,
            &self.clock,
        ))?;
        self.submitted = true;
        info!(%goal, actions = self.actions, "Goal submitted");
        Ok(goal)
    }
}
