//! Shapeworld - unified CLI.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use shapeworld::{
    BuilderEvent, ExperimentConfig, GoalBuilder, JsonLinesRecorder, PursuitCommand, PursuitDriver,
    PursuitEvent, PursuitSession, SelectionEvent, TextRenderer, TrialClock, TrialRecord,
    simulate_trial,
};
use shapeworld_core::{
    Configuration, Goal, GoalItem, MenuLayout, PlannerSettings, PlanningModel, rank_goals,
    sample_configuration,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries records.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ExperimentConfig::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config = config.with_seed(cli.seed);
    }
    debug!(?config, "Experiment config");

    match cli.command {
        Command::Menu => print_menu(&config),
        Command::Sample => print_sample(&config),
        Command::Play { build, goal } => play(&config, build, goal).await,
        Command::Simulate { trials, max_steps } => simulate(&config, trials, max_steps),
        Command::Plan {
            goals,
            all,
            goal,
            discount,
            threshold,
            max_iterations,
        } => {
            let settings = PlannerSettings::new(discount, threshold, max_iterations)?;
            plan(&config, goals, all, goal.as_deref(), &settings)
        }
        Command::Schema => print_schema(),
    }
}

/// Print a shuffled menu
fn print_menu(config: &ExperimentConfig) -> Result<()> {
    let domain = config.builder_domain()?;
    let mut rng = config.random_source();
    let layout = MenuLayout::generate(&domain, *config.menu_rows(), config.menu_columns(), rng.as_mut())?;
    eprintln!("{}", TextRenderer::new(*config.shape_skin()).menu(&layout));
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

/// Print a sampled configuration
fn print_sample(config: &ExperimentConfig) -> Result<()> {
    let domain = config.pursuit_domain()?;
    let mut rng = config.random_source();
    let configuration = sample_configuration(&domain, rng.as_mut());
    println!("{}", serde_json::to_string_pretty(&configuration)?);
    Ok(())
}

/// Print the trial record schema
fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(TrialRecord);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Run random-selector trials
fn simulate(config: &ExperimentConfig, trials: u32, max_steps: u32) -> Result<()> {
    let mut rng = config.random_source();
    let mut achieved = 0;
    for trial in 0..trials {
        let recorder = Box::new(JsonLinesRecorder::new(std::io::stdout()));
        let summary = simulate_trial(config, max_steps, rng.as_mut(), recorder)?;
        info!(trial, actions = summary.actions, achieved = summary.achieved, "Trial simulated");
        if summary.achieved {
            achieved += 1;
        }
    }
    info!(trials, achieved, "Simulation complete");
    Ok(())
}

/// Score goals by their mean optimal value
#[instrument(skip(config, settings))]
fn plan(
    config: &ExperimentConfig,
    count: usize,
    all: bool,
    goal_path: Option<&std::path::Path>,
    settings: &PlannerSettings,
) -> Result<()> {
    let domain = config.pursuit_domain()?;
    let model = PlanningModel::build(&domain, &config.transition_rule()?)?;

    let goals: Vec<Goal> = match (all, goal_path) {
        (true, _) => model.configurations().map(Goal::new).collect(),
        (false, Some(path)) => vec![load_goal(path)?],
        (false, None) => {
            let mut rng = config.random_source();
            (0..count)
                .map(|_| Goal::new(sample_configuration(&domain, rng.as_mut())))
                .collect()
        }
    };
    info!(goals = goals.len(), states = model.state_count(), "Planning");

    for score in rank_goals(&model, &goals, settings)? {
        println!("{}", serde_json::to_string(&score)?);
    }
    Ok(())
}

/// Forward stdin lines from a dedicated thread.
fn spawn_stdin() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Builder phase on stdin: `place <item> <slot>`, `remove <slot>`, `submit`.
#[instrument(skip_all)]
async fn build_goal(config: &ExperimentConfig, lines: &mut mpsc::UnboundedReceiver<String>) -> Result<Goal> {
    let domain = config.builder_domain()?;
    let mut rng = config.random_source();
    let clock = TrialClock::start(config.participant_id().clone());
    let recorder = Box::new(JsonLinesRecorder::new(std::io::stdout()));
    let mut builder = GoalBuilder::open(
        &domain,
        *config.menu_rows(),
        config.menu_columns(),
        rng.as_mut(),
        recorder,
        clock,
    )?;

    let renderer = TextRenderer::new(*config.shape_skin());
    eprintln!("{}", renderer.menu(builder.layout()));
    eprintln!("place <item> <slot> | remove <slot> | submit");

    while let Some(line) = lines.recv().await {
        let words: Vec<&str> = line.split_whitespace().collect();
        let result = match words.as_slice() {
            ["place", item, slot] => builder.place(item, slot).map(Some),
            ["remove", slot] => builder.remove(slot).map(Some),
            ["submit"] => match builder.submit() {
                Ok(goal) => return Ok(goal),
                Err(e) => Err(e),
            },
            [] => continue,
            _ => {
                eprintln!("unrecognised: {}", line);
                continue;
            }
        };
        match result {
            Ok(Some(BuilderEvent::Placed { slot, item })) => eprintln!("{} <- {}", slot, item.id),
            Ok(Some(BuilderEvent::Removed { slot, item })) => eprintln!("{} -> {}", slot, item.id),
            Ok(Some(BuilderEvent::Ignored { slot })) => eprintln!("{} unchanged", slot),
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }
    bail!("input ended before the goal was submitted")
}

/// Load a goal submission from a JSON file.
fn load_goal(path: &std::path::Path) -> Result<Goal> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read goal file {}", path.display()))?;
    let items: Vec<GoalItem> = serde_json::from_str(&content).context("Failed to parse goal file")?;
    Ok(Goal::from_items(&items)?)
}

/// Interactive trial: optional builder phase, then pursuit.
async fn play(config: &ExperimentConfig, build: bool, goal_path: Option<std::path::PathBuf>) -> Result<()> {
    let mut lines = spawn_stdin();
    let domain = config.pursuit_domain()?;
    let mut rng = config.random_source();

    let goal = match (build, goal_path) {
        (true, _) => build_goal(config, &mut lines).await?,
        (false, Some(path)) => load_goal(&path)?,
        (false, None) => Goal::new(sample_configuration(&domain, rng.as_mut())),
    };
    let start = sample_configuration(&domain, rng.as_mut());

    let session = PursuitSession::new(
        domain,
        config.transition_rule()?,
        start,
        goal,
        rng,
        Box::new(JsonLinesRecorder::new(std::io::stdout())),
        TrialClock::start(config.participant_id().clone()),
    )?;

    let mut renderer = TextRenderer::new(*config.shape_skin());
    eprintln!("goal:\n{}", config_lines(&mut renderer, goal.configuration()));
    eprintln!("now:\n{}", renderer.board(&session.configuration(), session.selection()));
    eprintln!("pick a, b or c; 'abandon' to give up");

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let driver = PursuitDriver::new(session, config.transition_delay(), event_tx);
    let handle = tokio::spawn(driver.run(command_rx));

    tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            let command = match line.as_str() {
                "" => continue,
                "abandon" => PursuitCommand::Abandon,
                label => PursuitCommand::Select(label.to_string()),
            };
            if command_tx.send(command).is_err() {
                break;
            }
        }
    });

    while let Some(event) = event_rx.recv().await {
        match event {
            PursuitEvent::Selection(SelectionEvent::Ignored { slot }) => {
                eprintln!("{} ignored: transition pending", slot)
            }
            PursuitEvent::Selection(event) => debug!(?event, "Selection"),
            PursuitEvent::Rejected(label) => eprintln!("no slot {:?}", label),
            PursuitEvent::Transition(outcome) => {
                eprintln!("{}:\n{}", outcome.action, config_lines(&mut renderer, &outcome.after))
            }
            PursuitEvent::Achieved { actions } => eprintln!("goal reached in {} actions", actions),
            PursuitEvent::Abandoned { actions } => eprintln!("abandoned after {} actions", actions),
        }
    }

    let session = handle.await??;
    info!(status = %session.status(), actions = session.actions(), "Trial finished");
    Ok(())
}

fn config_lines(renderer: &mut TextRenderer, configuration: &Configuration) -> String {
    shapeworld::render_configuration(renderer, configuration).join("\n")
}
