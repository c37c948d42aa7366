//! Random-selector simulation of pursuit trials.

use crate::config::ExperimentConfig;
use crate::error::ShapeworldError;
use crate::record::TrialClock;
use crate::recorder::EventRecorder;
use crate::session::{PursuitSession, TrialStatus};
use serde::{Deserialize, Serialize};
use shapeworld_core::{Action, Goal, RandomSource, sample_configuration};
use tracing::{info, instrument};

/// Result of one simulated trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Transitions taken.
    pub actions: u32,
    /// Whether the goal was reached within the step limit.
    pub achieved: bool,
}

/// Plays one trial with uniformly random actions.
///
/// The goal and start configuration are sampled from the pursuit domain
/// using `rng`; the session draws transitions from its own seeded source
/// derived from the same stream. The trial is abandoned after `max_steps`
/// transitions without success.
///
/// # Errors
///
/// Returns any configuration, validation or recording error.
#[instrument(skip(config, rng, recorder))]
pub fn simulate_trial(
    config: &ExperimentConfig,
    max_steps: u32,
    rng: &mut dyn RandomSource,
    recorder: Box<dyn EventRecorder + Send>,
) -> Result<SimulationSummary, ShapeworldError> {
    let domain = config.pursuit_domain()?;
    let goal = Goal::new(sample_configuration(&domain, rng));
    let start = sample_configuration(&domain, rng);
    let session_seed = (rng.next_f64() * u64::MAX as f64) as u64;

    let mut session = PursuitSession::new(
        domain,
        config.transition_rule()?,
        start,
        goal,
        Box::new(shapeworld_core::SeededRandom::new(session_seed)),
        recorder,
        TrialClock::start(config.participant_id().clone()),
    )?;

    while session.status() == TrialStatus::Active && session.actions() < max_steps {
        let action = Action::ALL[rng.next_index(Action::ALL.len())];
        session.select(&action.agent.to_string())?;
        session.select(&action.recipient.to_string())?;
        session.commit_pending()?;
    }

    if session.status() == TrialStatus::Active {
        session.abandon()?;
    }

    let summary = SimulationSummary {
        actions: session.actions(),
        achieved: session.status() == TrialStatus::Achieved,
    };
    info!(actions = summary.actions, achieved = summary.achieved, "Simulation finished");
    Ok(summary)
}
