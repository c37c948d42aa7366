//! Async driver for a pursuit trial.
//!
//! Commands arrive over a channel; a second distinct selection arms a
//! single timer, and the transition commits when it fires. While armed,
//! further selections are ignored and an abandon request is held until
//! the commit lands.

use crate::error::ShapeworldError;
use crate::selection::SelectionEvent;
use crate::session::{PursuitSession, TransitionOutcome, TrialStatus};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, warn};

/// Input from the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PursuitCommand {
    /// Pick a slot by label.
    Select(String),
    /// Give up on the trial.
    Abandon,
}

/// Messages sent from the driver to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PursuitEvent {
    /// A selection was handled.
    Selection(SelectionEvent),
    /// A selection named a nonexistent slot.
    Rejected(String),
    /// A transition committed.
    Transition(TransitionOutcome),
    /// The goal was reached.
    Achieved {
        /// Transitions taken.
        actions: u32,
    },
    /// The trial was abandoned.
    Abandoned {
        /// Transitions taken.
        actions: u32,
    },
}

/// Runs one [`PursuitSession`] against a command stream.
#[derive(Debug)]
pub struct PursuitDriver {
    session: PursuitSession,
    delay: Duration,
    event_tx: mpsc::UnboundedSender<PursuitEvent>,
}

impl PursuitDriver {
    /// Creates a driver.
    pub fn new(
        session: PursuitSession,
        delay: Duration,
        event_tx: mpsc::UnboundedSender<PursuitEvent>,
    ) -> Self {
        Self {
            session,
            delay,
            event_tx,
        }
    }

    fn emit(&self, event: PursuitEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    /// Processes commands until the trial ends or the command channel
    /// closes with nothing pending. Returns the finished session.
    ///
    /// # Errors
    ///
    /// Returns the first fatal session error; invalid selections are
    /// reported as [`PursuitEvent::Rejected`] and do not stop the driver.
    #[instrument(skip_all, fields(delay_ms = self.delay.as_millis() as u64))]
    pub async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<PursuitCommand>,
    ) -> Result<PursuitSession, ShapeworldError> {
        let mut driver = self;
        if driver.session.status() == TrialStatus::Achieved {
            driver.emit(PursuitEvent::Achieved { actions: 0 });
            return Ok(driver.session);
        }

        let mut deadline: Option<Instant> = None;
        let mut abandon_requested = false;
        let mut closed = false;

        loop {
            tokio::select! {
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    let outcome = driver.session.commit_pending()?;
                    driver.emit(PursuitEvent::Transition(outcome));

                    if outcome.goal_achieved {
                        if abandon_requested {
                            warn!("Abandon dropped; pending transition reached the goal");
                        }
                        driver.emit(PursuitEvent::Achieved { actions: outcome.action_number });
                        break;
                    }
                    if abandon_requested {
                        driver.session.abandon()?;
                        driver.emit(PursuitEvent::Abandoned { actions: driver.session.actions() });
                        break;
                    }
                }
                command = commands.recv(), if !closed && !abandon_requested => {
                    match command {
                        None => {
                            debug!("Command channel closed");
                            closed = true;
                        }
                        Some(PursuitCommand::Select(label)) => match driver.session.select(&label) {
                            Ok(event) => {
                                if let SelectionEvent::TransitionScheduled { .. } = event {
                                    deadline = Some(Instant::now() + driver.delay);
                                }
                                driver.emit(PursuitEvent::Selection(event));
                            }
                            Err(ShapeworldError::InvalidSelection(e)) => {
                                driver.emit(PursuitEvent::Rejected(e.label));
                            }
                            Err(e) => return Err(e),
                        },
                        Some(PursuitCommand::Abandon) => {
                            if driver.session.is_pending() {
                                info!("Abandon requested; waiting for pending transition");
                                abandon_requested = true;
                            } else {
                                driver.session.abandon()?;
                                driver.emit(PursuitEvent::Abandoned { actions: driver.session.actions() });
                                break;
                            }
                        }
                    }
                }
                else => break,
            }
        }

        info!(status = %driver.session.status(), actions = driver.session.actions(), "Driver finished");
        Ok(driver.session)
    }
}
