//! Error types for trial sessions.

use crate::config::ConfigError;
use crate::record::TrialType;
use derive_more::{Display, Error, From};
use shapeworld_core::{ConfigurationError, ValidationError};
use tracing::instrument;

/// A selection naming a slot that does not exist.
///
/// Leaves the selection state untouched.
#[derive(Debug, Clone, Display, Error)]
#[display("Invalid selection {:?} at {}:{}", label, file, line)]
pub struct InvalidSelectionError {
    /// The rejected slot label.
    pub label: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InvalidSelectionError {
    /// Creates a new selection error with caller location tracking.
    #[track_caller]
    #[instrument(skip(label))]
    pub fn new(label: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            label: label.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Operations that are not valid in the session's current state.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The trial already ended (goal achieved, abandoned or submitted).
    #[display("Trial has already ended")]
    TrialEnded,

    /// Commit requested with no transition scheduled.
    #[display("No transition is pending")]
    NothingPending,

    /// Abandon requested while a transition is still pending.
    #[display("A transition is pending; wait for it to commit")]
    TransitionPending,

    /// A menu item id not present in the layout.
    #[display("Unknown menu item {:?}", _0)]
    UnknownMenuItem(String),

    /// Submit with fewer than three slots filled.
    #[display("Goal has {} of 3 slots filled", _0)]
    Incomplete(usize),
}

impl std::error::Error for SessionError {}

/// Failures producing or delivering a [`TrialRecord`](crate::TrialRecord).
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RecordError {
    /// A field required for this record type is null.
    #[display("{} record is missing {}", trial_type, field)]
    MissingField {
        /// Record type.
        trial_type: TrialType,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A submit record whose goal does not have three entries.
    #[display("submit record has {} goal entries, expected 3", _0)]
    FinalGoalLength(usize),

    /// An abandon record without `abandoned == true`.
    #[display("abandon record is not marked abandoned")]
    NotAbandoned,

    /// Serialization failed.
    #[display("Failed to encode record: {}", _0)]
    Encode(String),

    /// The sink could not be written.
    #[display("Failed to write record: {}", _0)]
    Sink(String),
}

impl std::error::Error for RecordError {}

/// Any error surfaced by a shapeworld trial.
#[derive(Debug, Display, From)]
pub enum ShapeworldError {
    /// Invalid configuration, goal or layout.
    #[display("{}", _0)]
    Configuration(ConfigurationError),
    /// Malformed object reached the rules.
    #[display("{}", _0)]
    Validation(ValidationError),
    /// Nonexistent slot selected.
    #[display("{}", _0)]
    InvalidSelection(InvalidSelectionError),
    /// Operation not valid in the current session state.
    #[display("{}", _0)]
    Session(SessionError),
    /// Record could not be produced or delivered.
    #[display("{}", _0)]
    Record(RecordError),
    /// Experiment settings could not be loaded.
    #[display("{}", _0)]
    Config(ConfigError),
}

impl std::error::Error for ShapeworldError {}
