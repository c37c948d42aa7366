//! Goal-pursuit trial session.
//!
//! A session owns everything a single trial mutates: the configuration
//! store, the selection, the random source and the recorder. Nothing is
//! shared between trials.

use crate::error::{SessionError, ShapeworldError};
use crate::record::{TrialClock, TrialRecord};
use crate::recorder::EventRecorder;
use crate::selection::{SelectionController, SelectionEvent};
use crate::store::ConfigurationStore;
use serde::{Deserialize, Serialize};
use shapeworld_core::{Action, AttributeDomain, Configuration, Goal, RandomSource, TransitionRule};
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a pursuit trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrialStatus {
    /// Accepting selections.
    Active,
    /// Configuration matched the goal.
    Achieved,
    /// Participant gave up.
    Abandoned,
}

/// Result of one committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    /// Interaction applied.
    pub action: Action,
    /// Configuration before.
    pub before: Configuration,
    /// Configuration after.
    pub after: Configuration,
    /// Whether `after` matches the goal.
    pub goal_achieved: bool,
    /// Action counter after this transition.
    pub action_number: u32,
}

/// One goal-pursuit trial.
pub struct PursuitSession {
    domain: AttributeDomain,
    rule: TransitionRule,
    store: ConfigurationStore,
    selection: SelectionController,
    rng: Box<dyn RandomSource + Send>,
    recorder: Box<dyn EventRecorder + Send>,
    clock: TrialClock,
    actions: u32,
    status: TrialStatus,
}

impl std::fmt::Debug for PursuitSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PursuitSession")
            .field("configuration", &self.store.snapshot())
            .field("goal", self.store.goal())
            .field("selection", &self.selection.state())
            .field("actions", &self.actions)
            .field("status", &self.status)
            .finish()
    }
}

impl PursuitSession {
    /// Starts a trial.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](shapeworld_core::ConfigurationError)
    /// if the start or goal configuration is out of domain, or the rule can
    /// produce patterns the domain lacks.
    #[instrument(skip_all, fields(start = %configuration, goal = %goal))]
    pub fn new(
        domain: AttributeDomain,
        rule: TransitionRule,
        configuration: Configuration,
        goal: Goal,
        rng: Box<dyn RandomSource + Send>,
        recorder: Box<dyn EventRecorder + Send>,
        clock: TrialClock,
    ) -> Result<Self, ShapeworldError> {
        rule.check_domain(&domain)?;
        let store = ConfigurationStore::new(&domain, configuration, goal)?;
        let status = if store.is_fulfilled() {
            info!("Start configuration already matches goal");
            TrialStatus::Achieved
        } else {
            TrialStatus::Active
        };
        info!(%status, "Pursuit session created");
        Ok(Self {
            domain,
            rule,
            store,
            selection: SelectionController::new(),
            rng,
            recorder,
            clock,
            actions: 0,
            status,
        })
    }

    /// Trial status.
    pub fn status(&self) -> TrialStatus {
        self.status
    }

    /// Current configuration.
    pub fn configuration(&self) -> Configuration {
        self.store.snapshot()
    }

    /// The trial's goal.
    pub fn goal(&self) -> &Goal {
        self.store.goal()
    }

    /// Committed transitions so far.
    pub fn actions(&self) -> u32 {
        self.actions
    }

    /// Selection state.
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Whether a transition is scheduled and not yet committed.
    pub fn is_pending(&self) -> bool {
        self.selection.pending().is_some()
    }

    /// Attribute domain of the trial.
    pub fn domain(&self) -> &AttributeDomain {
        &self.domain
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.status == TrialStatus::Active {
            Ok(())
        } else {
            warn!(status = %self.status, "Operation on ended trial");
            Err(SessionError::TrialEnded)
        }
    }

    /// Selects a slot by label.
    ///
    /// # Errors
    ///
    /// - [`InvalidSelectionError`](crate::InvalidSelectionError) for a
    ///   nonexistent slot (selection unchanged)
    /// - [`SessionError::TrialEnded`] once the trial is over
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn select(&mut self, label: &str) -> Result<SelectionEvent, ShapeworldError> {
        self.ensure_active()?;
        let event = self.selection.select_label(label)?;
        if let SelectionEvent::TransitionScheduled { action } = event {
            info!(%action, "Transition scheduled");
        }
        Ok(event)
    }

    /// Commits the pending transition: update, goal check, record, reset.
    ///
    /// The selection is cleared after the record has been handed to the
    /// recorder; a recorder error is returned after that reset.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NothingPending`] if no transition is scheduled
    /// - [`ValidationError`](shapeworld_core::ValidationError) if the rule rejects the state
    /// - [`RecordError`](crate::RecordError) if the recorder fails
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn commit_pending(&mut self) -> Result<TransitionOutcome, ShapeworldError> {
        self.ensure_active()?;
        let action = self.selection.pending().ok_or(SessionError::NothingPending)?;

        let before = self.store.snapshot();
        let after = match self.rule.apply(&self.domain, &before, action, self.rng.as_mut()) {
            Ok(after) => after,
            Err(e) => {
                self.selection.reset();
                return Err(e.into());
            }
        };
        self.store.set(action.recipient, *after.get(action.recipient));
        let goal_achieved = self.store.is_fulfilled();
        self.actions += 1;

        let record = TrialRecord::pursuit_action(
            self.actions,
            action.agent,
            action.recipient,
            before,
            after,
            *self.store.goal(),
            goal_achieved,
            &self.clock,
        );
        let recorded = record
            .validate()
            .and_then(|()| self.recorder.record(&record));
        self.selection.complete();

        if goal_achieved {
            self.status = TrialStatus::Achieved;
            info!(actions = self.actions, "Goal achieved");
        } else {
            debug!(%after, "Transition committed");
        }
        recorded?;

        Ok(TransitionOutcome {
            action,
            before,
            after,
            goal_achieved,
            action_number: self.actions,
        })
    }

    /// Ends the trial unsuccessfully and records it.
    ///
    /// # Errors
    ///
    /// - [`SessionError::TransitionPending`] while a transition is scheduled;
    ///   commit it first
    /// - [`SessionError::TrialEnded`] if the trial is already over
    /// - [`RecordError`](crate::RecordError) if the recorder fails
    #[instrument(skip(self), fields(actions = self.actions))]
    pub fn abandon(&mut self) -> Result<TrialRecord, ShapeworldError> {
        self.ensure_active()?;
        if self.is_pending() {
            return Err(SessionError::TransitionPending.into());
        }
        let record = TrialRecord::abandon(
            self.actions + 1,
            self.store.snapshot(),
            *self.store.goal(),
            &self.clock,
        );
        self.status = TrialStatus::Abandoned;
        self.selection.reset();
        info!(actions = self.actions, "Trial abandoned");
        record.validate()?;
        self.recorder.record(&record)?;
        Ok(record)
    }
}
