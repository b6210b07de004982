use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use dog_world_core::{
    agent::{Agent, PathFollowingAgent, RandomAgent},
    config::{AgentKind, DogWorldConfig},
    environment::DogEnvironment,
    runner::run_many_episodes,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Run the dog grid world", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Number of episodes to run
    #[arg(short = 'c', long)]
    episode_count: Option<usize>,

    /// Maximum number of steps per episode (0 means no limit)
    #[arg(short = 's', long)]
    max_episode_steps: Option<usize>,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short = 'l', long, value_enum, default_value_t = LogLevel::Warn)]
    logging_level: LogLevel,

    /// Seed for the environment's RNG (0 means unseeded)
    #[arg(long)]
    seed: Option<u64>,

    /// Agent function
    #[arg(short, long, value_enum)]
    agent: Option<AgentChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AgentChoice {
    Random,
    Path,
}

impl From<AgentChoice> for AgentKind {
    fn from(choice: AgentChoice) -> Self {
        match choice {
            AgentChoice::Random => AgentKind::Random,
            AgentChoice::Path => AgentKind::Path,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.logging_level.directive())),
        )
        .init();

    let config = resolve_config(&args)?;
    tracing::info!(?config, "configuration loaded");

    let mut environment = match config.seed {
        Some(seed) => DogEnvironment::seeded(&config.environment, seed),
        None => DogEnvironment::new(&config.environment),
    }
    .context("Failed to create environment")?;

    let mut agent = select_agent(&config);
    let summary = run_many_episodes(&mut environment, &mut agent, config.episode_count)
        .context("Episode run failed")?;

    tracing::info!(
        successes = summary.success_count(),
        episodes = summary.episodes.len(),
        "run complete"
    );
    println!("Average Reward: {}", summary.average_reward);
    Ok(())
}

/// Starts from the config file (or defaults) and applies command line overrides.
fn resolve_config(args: &Args) -> Result<DogWorldConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("Config file does not exist: {}", path.display());
            }
            DogWorldConfig::load(path)?
        }
        None => DogWorldConfig::default(),
    };

    if let Some(count) = args.episode_count {
        config.episode_count = count;
    }
    if let Some(steps) = args.max_episode_steps {
        config.environment.max_episode_steps = (steps > 0).then_some(steps);
    }
    if let Some(seed) = args.seed {
        config.seed = (seed > 0).then_some(seed);
    }
    if let Some(agent) = args.agent {
        config.agent = agent.into();
    }
    Ok(config)
}

fn select_agent(config: &DogWorldConfig) -> Box<dyn Agent> {
    match config.agent {
        AgentKind::Random => match config.seed {
            Some(seed) => Box::new(RandomAgent::new(seed)),
            None => Box::new(RandomAgent::from_entropy()),
        },
        AgentKind::Path => Box::new(PathFollowingAgent::new(config.environment.grid_size)),
    }
}
