//! Objects, slots and three-slot configurations.

use crate::domain::{AttributeDomain, Pattern, Shade, Shape};
use crate::error::{ConfigurationError, ValidationError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{instrument, warn};

/// One of the three fixed object positions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SlotId {
    /// Top slot.
    A,
    /// Bottom-left slot.
    B,
    /// Bottom-right slot.
    C,
}

impl SlotId {
    /// All slots in order.
    pub const ALL: [SlotId; 3] = [SlotId::A, SlotId::B, SlotId::C];

    /// Zero-based index of the slot.
    pub fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
            SlotId::C => 2,
        }
    }

    /// Slot at a zero-based index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parses `a`, `b` or `c` (case-insensitive).
    #[instrument]
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        Self::from_str(label.trim()).map_err(|_| ValidationError::UnknownSlot(label.to_string()))
    }
}

/// Attributes of a single object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, derive_new::new,
)]
pub struct ObjectState {
    /// Outline.
    pub shape: Shape,
    /// Shade ordinal.
    pub color: Shade,
    /// Surface pattern.
    pub pattern: Pattern,
}

impl std::fmt::Display for ObjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.shape, self.color, self.pattern)
    }
}

/// Object attributes as loose labels, before validation.
///
/// This is the shape of data handed over by collaborators that store
/// attributes as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObjectState {
    /// Shape label.
    pub shape: String,
    /// Shade label.
    pub color: String,
    /// Pattern label.
    pub pattern: String,
}

impl TryFrom<RawObjectState> for ObjectState {
    type Error = ValidationError;

    fn try_from(raw: RawObjectState) -> Result<Self, Self::Error> {
        Ok(ObjectState {
            shape: Shape::parse(&raw.shape)?,
            color: Shade::parse(&raw.color)?,
            pattern: Pattern::parse(&raw.pattern)?,
        })
    }
}

/// Objects in all three slots.
///
/// The struct shape itself guarantees exactly three slots; domain
/// membership is checked with [`Configuration::check_domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Configuration {
    /// Object in slot `a`.
    pub a: ObjectState,
    /// Object in slot `b`.
    pub b: ObjectState,
    /// Object in slot `c`.
    pub c: ObjectState,
}

impl Configuration {
    /// Creates a configuration from the three slot objects.
    pub fn new(a: ObjectState, b: ObjectState, c: ObjectState) -> Self {
        Self { a, b, c }
    }

    /// Builds a configuration from keyed slots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownSlot`] for keys other than
    /// `a`/`b`/`c` and [`ConfigurationError::MissingSlot`] if any slot is absent.
    #[instrument(skip(slots))]
    pub fn from_slots(slots: BTreeMap<String, ObjectState>) -> Result<Self, ConfigurationError> {
        let mut found: [Option<ObjectState>; 3] = [None; 3];
        for (key, object) in slots {
            let slot = SlotId::parse(&key).map_err(|_| {
                warn!(key = %key, "Unknown slot key in configuration");
                ConfigurationError::UnknownSlot(key.clone())
            })?;
            found[slot.index()] = Some(object);
        }

        let take = |slot: SlotId| found[slot.index()].ok_or(ConfigurationError::MissingSlot(slot));
        Ok(Self {
            a: take(SlotId::A)?,
            b: take(SlotId::B)?,
            c: take(SlotId::C)?,
        })
    }

    /// Returns the object in `slot`.
    pub fn get(&self, slot: SlotId) -> &ObjectState {
        match slot {
            SlotId::A => &self.a,
            SlotId::B => &self.b,
            SlotId::C => &self.c,
        }
    }

    /// Replaces the object in `slot`.
    pub fn set(&mut self, slot: SlotId, object: ObjectState) {
        match slot {
            SlotId::A => self.a = object,
            SlotId::B => self.b = object,
            SlotId::C => self.c = object,
        }
    }

    /// Iterates over slots in `a`, `b`, `c` order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &ObjectState)> {
        SlotId::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    /// Checks every slot against `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OutOfDomain`] for the first offending slot.
    #[instrument(skip(self, domain))]
    pub fn check_domain(&self, domain: &AttributeDomain) -> Result<(), ConfigurationError> {
        for (slot, object) in self.iter() {
            if let Some(violation) = domain.violation(object) {
                warn!(%slot, %violation, "Configuration slot out of domain");
                return Err(ConfigurationError::OutOfDomain { slot, violation });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a={} b={} c={}", self.a, self.b, self.c)
    }
}
