//! Shapeworld trial sessions.
//!
//! Runs the two phases of a shapeworld trial on top of
//! [`shapeworld_core`]: building a goal from a shuffled menu, then pursuing
//! it by picking agent/recipient pairs.
//!
//! # Architecture
//!
//! - **Builder**: menu presentation, placements, goal submission
//! - **Session**: selection, transitions, goal checks for the pursuit phase
//! - **Driver**: async command loop with the deferred-transition timer
//! - **Records**: one [`TrialRecord`] per event, handed to an [`EventRecorder`]
//!
//! # Example
//!
//! ```
//! use shapeworld::{ExperimentConfig, MemoryRecorder, PursuitSession, TrialClock};
//! use shapeworld_core::{Goal, SeededRandom, sample_configuration};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExperimentConfig::default().with_seed(Some(3));
//! let domain = config.pursuit_domain()?;
//! let mut rng = SeededRandom::new(3);
//! let goal = Goal::new(sample_configuration(&domain, &mut rng));
//! let start = sample_configuration(&domain, &mut rng);
//!
//! let recorder = MemoryRecorder::new();
//! let mut session = PursuitSession::new(
//!     domain,
//!     config.transition_rule()?,
//!     start,
//!     goal,
//!     config.random_source(),
//!     Box::new(recorder.clone()),
//!     TrialClock::start(None),
//! )?;
//! if session.status() == shapeworld::TrialStatus::Active {
//!     session.select("a")?;
//!     session.select("b")?;
//!     session.commit_pending()?;
//!     assert_eq!(recorder.records().len(), 1);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod builder;
mod config;
mod driver;
mod error;
mod record;
mod recorder;
mod render;
mod selection;
mod session;
mod simulate;
mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, ExperimentConfig, PARTICIPANT_ENV, SEED_ENV};

// Crate-level exports - Errors
pub use error::{InvalidSelectionError, RecordError, SessionError, ShapeworldError};

// Crate-level exports - Records
pub use record::{Phase, TrialClock, TrialRecord, TrialType, slot_number};
pub use recorder::{EventRecorder, JsonLinesRecorder, MemoryRecorder};

// Crate-level exports - Phases
pub use builder::{BuilderEvent, GoalBuilder};
pub use selection::{Marker, SelectionController, SelectionEvent, SelectionState};
pub use session::{PursuitSession, TransitionOutcome, TrialStatus};
pub use store::ConfigurationStore;

// Crate-level exports - Driver
pub use driver::{PursuitCommand, PursuitDriver, PursuitEvent};

// Crate-level exports - Rendering
pub use render::{Renderer, TextRenderer, render_configuration};

// Crate-level exports - Simulation
pub use simulate::{SimulationSummary, simulate_trial};
