//! Error types for the interaction rules.

use crate::domain::{Pattern, Shape};
use crate::object::SlotId;

/// An attribute value that falls outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DomainViolation {
    /// Shape is not part of the domain's shape set.
    #[display("shape {} is not in the domain", _0)]
    ShapeNotAllowed(Shape),

    /// Shade is outside `[1, max]`.
    #[display("shade {} is outside [1, {}]", shade, max)]
    ShadeOutOfRange {
        /// Offending shade.
        shade: u8,
        /// Domain maximum.
        max: u8,
    },

    /// Pattern is not part of the domain's pattern set.
    #[display("pattern {} is not in the domain", _0)]
    PatternNotAllowed(Pattern),
}

/// A configuration, goal or layout that cannot be used for a trial.
///
/// Fatal for the trial; never retried.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ConfigurationError {
    /// One of the three slots has no object.
    #[display("Configuration is missing slot {}", _0)]
    MissingSlot(SlotId),

    /// A slot key other than `a`, `b` or `c`.
    #[display("Configuration has unknown slot {:?}", _0)]
    UnknownSlot(String),

    /// A slot holds an object outside the attribute domain.
    #[display("Slot {} is out of domain: {}", slot, violation)]
    OutOfDomain {
        /// Offending slot.
        slot: SlotId,
        /// What is wrong with it.
        violation: DomainViolation,
    },

    /// A goal submission without exactly three entries.
    #[display("Goal needs exactly 3 entries, got {}", _0)]
    GoalLength(usize),

    /// Menu items do not fill the requested grid.
    #[display("Cannot lay out {} items as {}x{}", items, rows, cols)]
    LayoutMismatch {
        /// Number of items.
        items: usize,
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// A domain with no legal values for an attribute.
    #[display("Attribute domain has no {}", _0)]
    EmptyDomain(&'static str),

    /// A shade range with no values.
    #[display("Shade range [1, {}] is empty", _0)]
    InvalidShadeRange(u8),

    /// A shape bias outside `[0, 1]`.
    #[display("Shape bias {} is not a probability", _0)]
    InvalidBias(f64),

    /// A pattern variant producing patterns the domain does not allow.
    #[display("Pattern variant produces {} which the domain does not allow", _0)]
    VariantOutsideDomain(Pattern),
}

impl std::error::Error for ConfigurationError {}

/// Malformed input handed to the transition engine or goal evaluator.
///
/// Fatal and surfaced to the caller; values are never coerced.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ValidationError {
    /// Unknown shape label.
    #[display("Unknown shape {:?}", _0)]
    UnknownShape(String),

    /// Unknown pattern label.
    #[display("Unknown pattern {:?}", _0)]
    UnknownPattern(String),

    /// Shade label that is not a small integer.
    #[display("Malformed shade {:?}", _0)]
    MalformedShade(String),

    /// Slot label other than `a`, `b` or `c`.
    #[display("Unknown slot {:?}", _0)]
    UnknownSlot(String),

    /// Object outside the attribute domain.
    #[display("Object out of domain: {}", _0)]
    OutOfDomain(DomainViolation),

    /// Agent and recipient are the same slot.
    #[display("Slot {} cannot act on itself", _0)]
    SelfInteraction(SlotId),

    /// A transition postcondition failed.
    #[display("Transition contract violated: {}", _0)]
    ContractViolation(String),
}

impl std::error::Error for ValidationError {}

/// A value-iteration request that cannot be solved.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum PlanningError {
    /// Discount outside `[0, 1)`.
    #[display("Discount {} is not in [0, 1)", _0)]
    InvalidDiscount(f64),

    /// Non-positive or non-finite convergence threshold.
    #[display("Convergence threshold {} must be positive", _0)]
    InvalidThreshold(f64),

    /// An iteration limit of zero.
    #[display("Iteration limit must be positive")]
    ZeroIterationLimit,

    /// Domain, rule or goal unusable for planning.
    #[display("{}", _0)]
    Configuration(ConfigurationError),

    /// A state the transition rule rejected.
    #[display("{}", _0)]
    Validation(ValidationError),
}

impl std::error::Error for PlanningError {}

impl From<ConfigurationError> for PlanningError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<ValidationError> for PlanningError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}
