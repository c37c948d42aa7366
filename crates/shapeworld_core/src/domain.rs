//! Attribute domains for shapeworld objects.
//!
//! A domain fixes which shapes, shades and patterns are legal for a phase
//! of the experiment. The pursuit phase uses five shades, the builder menu
//! uses three; both share the same shape set and wrap rules.

use crate::error::{ConfigurationError, DomainViolation, ValidationError};
use crate::object::ObjectState;
use derive_getters::Getters;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument};

// ─────────────────────────────────────────────────────────────
//  Shape
// ─────────────────────────────────────────────────────────────

/// Object outline.
///
/// `star` is accepted wherever `triangle` is; the two names come from
/// different display skins of the same attribute value.
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
pub enum Shape {
    /// Square outline.
    Square,
    /// Circle outline.
    Circle,
    /// Triangle outline (rendered as a star by the star skin).
    #[serde(alias = "star")]
    #[strum(to_string = "triangle", serialize = "star")]
    Triangle,
}

impl Shape {
    /// All shapes in enumeration order.
    pub const ALL: [Shape; 3] = [Shape::Square, Shape::Circle, Shape::Triangle];

    /// Parses a shape label, rejecting anything outside the known set.
    #[instrument]
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        Self::from_str(label.trim()).map_err(|_| ValidationError::UnknownShape(label.to_string()))
    }
}

/// Display skin for shape labels.
///
/// The skin only changes what a renderer calls the third shape;
/// evaluation and transitions are identical under both skins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShapeSkin {
    /// Third shape is labelled "triangle".
    #[default]
    Triangle,
    /// Third shape is labelled "star".
    Star,
}

impl ShapeSkin {
    /// Returns the label a renderer should use for `shape`.
    pub fn label(self, shape: Shape) -> &'static str {
        match (self, shape) {
            (_, Shape::Square) => "square",
            (_, Shape::Circle) => "circle",
            (ShapeSkin::Triangle, Shape::Triangle) => "triangle",
            (ShapeSkin::Star, Shape::Triangle) => "star",
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Pattern
// ─────────────────────────────────────────────────────────────

/// Surface pattern (called "texture" on the builder menu).
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
pub enum Pattern {
    /// No pattern.
    #[serde(alias = "none")]
    #[strum(to_string = "plain", serialize = "none")]
    Plain,
    /// Diagonal stripes.
    #[serde(alias = "stripe")]
    #[strum(to_string = "striped", serialize = "stripe")]
    Striped,
    /// Dots.
    Dotted,
}

impl Pattern {
    /// All patterns in enumeration order.
    pub const ALL: [Pattern; 3] = [Pattern::Plain, Pattern::Striped, Pattern::Dotted];

    /// Parses a pattern label, rejecting anything outside the known set.
    #[instrument]
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        Self::from_str(label.trim()).map_err(|_| ValidationError::UnknownPattern(label.to_string()))
    }
}

/// How the pattern of a recipient toggles on a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatternVariant {
    /// `plain → striped`, anything else `→ plain`.
    Simple,
    /// `plain →` striped or dotted (uniform), anything else `→ plain`.
    #[default]
    Extended,
}

impl PatternVariant {
    /// Patterns this variant can produce or consume.
    pub fn patterns(self) -> &'static [Pattern] {
        match self {
            PatternVariant::Simple => &[Pattern::Plain, Pattern::Striped],
            PatternVariant::Extended => &Pattern::ALL,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Shade
// ─────────────────────────────────────────────────────────────

/// Ordinal color intensity, `1` being the lightest.
///
/// A bare shade carries no upper bound; the [`AttributeDomain`] it is used
/// with decides which values are legal and where wrapping happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Shade(u8);

impl Shade {
    /// Lowest shade in every domain.
    pub const MIN: u8 = 1;

    /// Wraps a raw shade value.
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw ordinal.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Parses a shade from its decimal label (e.g. `"3"`).
    #[instrument]
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        label
            .trim()
            .parse::<u8>()
            .map(Self)
            .map_err(|_| ValidationError::MalformedShade(label.to_string()))
    }

    /// Next darker shade; past `max` wraps to [`Shade::MIN`].
    pub const fn wrap_increment(self, max: u8) -> Self {
        if self.0 >= max {
            Self(Self::MIN)
        } else {
            Self(self.0 + 1)
        }
    }

    /// Next lighter shade; below [`Shade::MIN`] wraps to `max`.
    pub const fn wrap_decrement(self, max: u8) -> Self {
        if self.0 <= Self::MIN {
            Self(max)
        } else {
            Self(self.0 - 1)
        }
    }
}

impl std::fmt::Display for Shade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Recorded data carries shades as strings ("3"), newer callers as numbers.
impl<'de> Deserialize<'de> for Shade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u8),
            Label(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Shade(value)),
            Repr::Label(label) => Shade::parse(&label).map_err(serde::de::Error::custom),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  AttributeDomain
// ─────────────────────────────────────────────────────────────

/// Legal attribute values for one phase of the experiment.
///
/// Deserialization goes through [`AttributeDomain::new`], so a loaded
/// domain is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Getters)]
#[serde(try_from = "RawAttributeDomain")]
pub struct AttributeDomain {
    /// Allowed shapes.
    shapes: Vec<Shape>,
    /// Highest shade `K`; shades range over `[1, K]`.
    max_shade: u8,
    /// Allowed patterns.
    patterns: Vec<Pattern>,
    /// Label skin for renderers.
    #[serde(default)]
    skin: ShapeSkin,
}

#[derive(Deserialize, JsonSchema)]
struct RawAttributeDomain {
    shapes: Vec<Shape>,
    max_shade: u8,
    patterns: Vec<Pattern>,
    #[serde(default)]
    skin: ShapeSkin,
}

impl TryFrom<RawAttributeDomain> for AttributeDomain {
    type Error = ConfigurationError;

    fn try_from(raw: RawAttributeDomain) -> Result<Self, Self::Error> {
        Self::new(raw.shapes, raw.max_shade, raw.patterns, raw.skin)
    }
}

impl AttributeDomain {
    /// Shade count of the pursuit phase.
    pub const PURSUIT_SHADES: u8 = 5;
    /// Shade count of the builder menu.
    pub const BUILDER_SHADES: u8 = 3;

    /// Creates a domain, rejecting empty attribute sets and a zero shade range.
    #[instrument]
    pub fn new(
        shapes: Vec<Shape>,
        max_shade: u8,
        patterns: Vec<Pattern>,
        skin: ShapeSkin,
    ) -> Result<Self, ConfigurationError> {
        if shapes.is_empty() {
            return Err(ConfigurationError::EmptyDomain("shapes"));
        }
        if patterns.is_empty() {
            return Err(ConfigurationError::EmptyDomain("patterns"));
        }
        if max_shade < Shade::MIN {
            return Err(ConfigurationError::InvalidShadeRange(max_shade));
        }
        debug!(shapes = shapes.len(), max_shade, patterns = patterns.len(), "Created attribute domain");
        Ok(Self {
            shapes,
            max_shade,
            patterns,
            skin,
        })
    }

    /// Pursuit-phase domain: all shapes, five shades, patterns of `variant`.
    pub fn pursuit(variant: PatternVariant) -> Self {
        Self::with_shades(Self::PURSUIT_SHADES, variant.patterns().to_vec())
    }

    /// Builder-menu domain: all shapes, three shades, all patterns.
    pub fn builder() -> Self {
        Self::with_shades(Self::BUILDER_SHADES, Pattern::ALL.to_vec())
    }

    fn with_shades(max_shade: u8, patterns: Vec<Pattern>) -> Self {
        Self {
            shapes: Shape::ALL.to_vec(),
            max_shade,
            patterns,
            skin: ShapeSkin::default(),
        }
    }

    /// Replaces the label skin.
    pub fn with_skin(mut self, skin: ShapeSkin) -> Self {
        self.skin = skin;
        self
    }

    /// All legal shades, lightest first.
    pub fn shades(&self) -> impl Iterator<Item = Shade> + '_ {
        (Shade::MIN..=self.max_shade).map(Shade::new)
    }

    /// Increments `shade`, wrapping past `K` to `1`.
    pub fn wrap_increment(&self, shade: Shade) -> Shade {
        shade.wrap_increment(self.max_shade)
    }

    /// Decrements `shade`, wrapping below `1` to `K`.
    pub fn wrap_decrement(&self, shade: Shade) -> Shade {
        shade.wrap_decrement(self.max_shade)
    }

    /// Checks whether `shade` lies in `[1, K]`.
    pub fn contains_shade(&self, shade: Shade) -> bool {
        (Shade::MIN..=self.max_shade).contains(&shade.value())
    }

    /// Returns the first attribute of `object` that falls outside this domain.
    #[instrument(skip(self))]
    pub fn violation(&self, object: &ObjectState) -> Option<DomainViolation> {
        if !self.shapes.contains(&object.shape) {
            return Some(DomainViolation::ShapeNotAllowed(object.shape));
        }
        if !self.contains_shade(object.color) {
            return Some(DomainViolation::ShadeOutOfRange {
                shade: object.color.value(),
                max: self.max_shade,
            });
        }
        if !self.patterns.contains(&object.pattern) {
            return Some(DomainViolation::PatternNotAllowed(object.pattern));
        }
        None
    }

    /// Validates a single object against the domain.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfDomain`] naming the offending attribute.
    pub fn check(&self, object: &ObjectState) -> Result<(), ValidationError> {
        match self.violation(object) {
            Some(violation) => Err(ValidationError::OutOfDomain(violation)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_increment_no_wrap() {
        let domain = AttributeDomain::pursuit(PatternVariant::Extended);
        assert_eq!(domain.wrap_increment(Shade::new(1)), Shade::new(2));
    }

    #[test]
    fn test_wrap_increment_at_max() {
        let domain = AttributeDomain::pursuit(PatternVariant::Extended);
        assert_eq!(domain.wrap_increment(Shade::new(5)), Shade::new(1));
    }

    #[test]
    fn test_wrap_decrement_at_min() {
        let domain = AttributeDomain::pursuit(PatternVariant::Extended);
        assert_eq!(domain.wrap_decrement(Shade::new(1)), Shade::new(5));
    }

    #[test]
    fn test_wrap_stays_in_range_for_all_domains() {
        for max in 1..=9u8 {
            let domain =
                AttributeDomain::new(Shape::ALL.to_vec(), max, Pattern::ALL.to_vec(), ShapeSkin::Star)
                    .expect("valid domain");
            for shade in domain.shades() {
                assert!(domain.contains_shade(domain.wrap_increment(shade)));
                assert!(domain.contains_shade(domain.wrap_decrement(shade)));
            }
        }
    }

    #[test]
    fn test_star_is_triangle() {
        assert_eq!(Shape::parse("star"), Ok(Shape::Triangle));
        assert_eq!(Shape::parse("Triangle"), Ok(Shape::Triangle));
        assert_eq!(Shape::Triangle.to_string(), "triangle");
        assert_eq!(ShapeSkin::Star.label(Shape::Triangle), "star");
    }

    #[test]
    fn test_pattern_aliases() {
        assert_eq!(Pattern::parse("stripe"), Ok(Pattern::Striped));
        assert_eq!(Pattern::parse("none"), Ok(Pattern::Plain));
        assert!(matches!(Pattern::parse("checkered"), Err(ValidationError::UnknownPattern(_))));
    }

    #[test]
    fn test_shade_accepts_string_and_number() {
        let from_label: Shade = serde_json::from_str("\"4\"").expect("label");
        let from_number: Shade = serde_json::from_str("4").expect("number");
        assert_eq!(from_label, from_number);
        assert!(serde_json::from_str::<Shade>("\"dark\"").is_err());
    }

    #[test]
    fn test_simple_domain_rejects_dotted() {
        let domain = AttributeDomain::pursuit(PatternVariant::Simple);
        let object = ObjectState::new(Shape::Circle, Shade::new(2), Pattern::Dotted);
        assert_eq!(
            domain.violation(&object),
            Some(DomainViolation::PatternNotAllowed(Pattern::Dotted))
        );
    }

    #[test]
    fn test_deserialize_validates_domain() {
        let json = r#"{"shapes":["circle"],"max_shade":0,"patterns":["plain"]}"#;
        assert!(serde_json::from_str::<AttributeDomain>(json).is_err());

        let json = r#"{"shapes":["circle","square"],"max_shade":2,"patterns":["plain"]}"#;
        let domain: AttributeDomain = serde_json::from_str(json).expect("valid domain");
        assert_eq!(*domain.max_shade(), 2);
        assert_eq!(*domain.skin(), ShapeSkin::default());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let result = AttributeDomain::new(vec![], 3, Pattern::ALL.to_vec(), ShapeSkin::Triangle);
        assert_eq!(result, Err(ConfigurationError::EmptyDomain("shapes")));
    }
}
