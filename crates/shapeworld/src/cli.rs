//! Command-line interface for shapeworld.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shapeworld - goal-building and goal-pursuit trials
#[derive(Parser, Debug)]
#[command(name = "shapeworld")]
#[command(about = "Run and simulate shapeworld experiment trials", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to experiment config (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a shuffled builder menu as JSON
    Menu,

    /// Print a randomly sampled pursuit configuration as JSON
    Sample,

    /// Play a trial interactively on stdin; records go to stdout as NDJSON
    Play {
        /// Build the goal from the menu first instead of sampling it
        #[arg(long)]
        build: bool,

        /// Goal file: JSON array of three {shape, shade, texture} entries
        #[arg(long, conflicts_with = "build")]
        goal: Option<PathBuf>,
    },

    /// Simulate trials with a random selector; records go to stdout as NDJSON
    Simulate {
        /// Number of trials
        #[arg(short, long, default_value = "1")]
        trials: u32,

        /// Transitions before a trial is abandoned
        #[arg(long, default_value = "200")]
        max_steps: u32,
    },

    /// Score goals by value iteration; one JSON line per goal, easiest first
    Plan {
        /// Number of randomly sampled goals
        #[arg(short = 'n', long, default_value = "10")]
        goals: usize,

        /// Score every configuration of the pursuit domain instead of sampling
        #[arg(long, conflicts_with = "goal")]
        all: bool,

        /// Score a single goal file: JSON array of three {shape, shade, texture} entries
        #[arg(long)]
        goal: Option<PathBuf>,

        /// Discount factor
        #[arg(long, default_value_t = shapeworld_core::DEFAULT_DISCOUNT)]
        discount: f64,

        /// Convergence threshold on the largest value change
        #[arg(long, default_value_t = shapeworld_core::DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Sweep limit per goal
        #[arg(long, default_value_t = shapeworld_core::DEFAULT_MAX_ITERATIONS)]
        max_iterations: u32,
    },

    /// Print the JSON Schema of trial records
    Schema,
}
