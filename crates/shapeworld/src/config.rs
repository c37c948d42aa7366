//! Experiment settings.
//!
//! Loaded from TOML; every key is optional and falls back to the standard
//! experiment values. `SHAPEWORLD_SEED` and `SHAPEWORLD_PARTICIPANT_ID`
//! in the environment (or a `.env` file) override the file.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use shapeworld_core::{
    AttributeDomain, ConfigurationError, DEFAULT_SHAPE_BIAS, PatternVariant, RandomSource,
    SeededRandom, Shape, ShapeSkin, ThreadRandom, TransitionRule,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding the random seed.
pub const SEED_ENV: &str = "SHAPEWORLD_SEED";
/// Environment variable overriding the participant id.
pub const PARTICIPANT_ENV: &str = "SHAPEWORLD_PARTICIPANT_ID";

/// Settings for one run of the experiment.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Delay between the second selection and the committed transition.
    transition_delay_ms: u64,

    /// Probability that a recipient adopts the agent's shape.
    shape_bias: f64,

    /// Pattern toggle behaviour.
    pattern_variant: PatternVariant,

    /// Label skin for the third shape.
    shape_skin: ShapeSkin,

    /// Shade count of the pursuit phase.
    pursuit_max_shade: u8,

    /// Shade count of the builder menu.
    builder_max_shade: u8,

    /// Builder menu rows.
    menu_rows: usize,

    /// Builder menu columns; derived from the menu size when absent.
    menu_cols: Option<usize>,

    /// Seed for reproducible trials; unseeded when absent.
    seed: Option<u64>,

    /// Identifier written into every record.
    participant_id: Option<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            transition_delay_ms: 1000,
            shape_bias: DEFAULT_SHAPE_BIAS,
            pattern_variant: PatternVariant::Extended,
            shape_skin: ShapeSkin::Triangle,
            pursuit_max_shade: AttributeDomain::PURSUIT_SHADES,
            builder_max_shade: AttributeDomain::BUILDER_SHADES,
            menu_rows: 3,
            menu_cols: None,
            seed: None,
            participant_id: None,
        }
    }
}

impl ExperimentConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            delay_ms = config.transition_delay_ms,
            variant = ?config.pattern_variant,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `path` if given, otherwise defaults, then applies environment overrides.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(
            std::env::var(SEED_ENV).ok().as_deref(),
            std::env::var(PARTICIPANT_ENV).ok().as_deref(),
        )
    }

    /// Checks that every goal the builder can produce is legal in the pursuit phase.
    ///
    /// The builder menu shares the pursuit pattern set, so only the shade
    /// ranges can disagree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.builder_max_shade > self.pursuit_max_shade {
            return Err(ConfigError::new(format!(
                "builder_max_shade {} exceeds pursuit_max_shade {}",
                self.builder_max_shade, self.pursuit_max_shade
            )));
        }
        Ok(())
    }

    /// Applies seed and participant overrides given as raw strings.
    pub fn with_overrides(
        mut self,
        seed: Option<&str>,
        participant_id: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(seed) = seed {
            let parsed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::new(format!("{} is not a u64 ({}): {:?}", SEED_ENV, e, seed)))?;
            debug!(seed = parsed, "Seed overridden from environment");
            self.seed = Some(parsed);
        }
        if let Some(id) = participant_id.filter(|id| !id.trim().is_empty()) {
            self.participant_id = Some(id.trim().to_string());
        }
        Ok(self)
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Replaces the transition delay.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.transition_delay_ms = delay_ms;
        self
    }

    /// Delay between the second selection and the commit.
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// Domain of the pursuit phase.
    pub fn pursuit_domain(&self) -> Result<AttributeDomain, ConfigurationError> {
        AttributeDomain::new(
            Shape::ALL.to_vec(),
            self.pursuit_max_shade,
            self.pattern_variant.patterns().to_vec(),
            self.shape_skin,
        )
    }

    /// Domain of the builder menu.
    ///
    /// Patterns follow `pattern_variant`, so a built goal always lies in the
    /// pursuit domain.
    pub fn builder_domain(&self) -> Result<AttributeDomain, ConfigurationError> {
        AttributeDomain::new(
            Shape::ALL.to_vec(),
            self.builder_max_shade,
            self.pattern_variant.patterns().to_vec(),
            self.shape_skin,
        )
    }

    /// Builder menu columns: the configured count, or enough to hold every
    /// combination in `menu_rows` rows.
    pub fn menu_columns(&self) -> usize {
        self.menu_cols.unwrap_or_else(|| {
            let items = Shape::ALL.len()
                * self.pattern_variant.patterns().len()
                * usize::from(self.builder_max_shade);
            items.checked_div(self.menu_rows).unwrap_or(items)
        })
    }

    /// Transition rule with the configured bias and variant.
    pub fn transition_rule(&self) -> Result<TransitionRule, ConfigurationError> {
        TransitionRule::new(self.shape_bias, self.pattern_variant)
    }

    /// Random source: seeded when a seed is configured.
    pub fn random_source(&self) -> Box<dyn RandomSource + Send> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
