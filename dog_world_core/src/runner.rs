//! Drives an [`Agent`] through episodes of a [`DogEnvironment`].

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    agent::Agent,
    environment::{DogEnvironment, EnvironmentError},
};

/// Errors that stop a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("At least one episode must be run")]
    NoEpisodes,
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

/// Result of a single episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeOutcome {
    pub total_reward: f64,
    pub steps: usize,
    pub reached_target: bool,
    pub truncated: bool,
}

/// Aggregate over a batch of episodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub episodes: Vec<EpisodeOutcome>,
    pub average_reward: f64,
}

impl RunSummary {
    pub fn success_count(&self) -> usize {
        self.episodes.iter().filter(|e| e.reached_target).count()
    }
}

/// Step cap used when the environment itself has no limit. Keeps a policy
/// that can never reach an enclosed target from running forever.
pub fn default_step_cap(env: &DogEnvironment) -> usize {
    env.size() * env.size() * 4
}

/// Runs one episode: reset both sides, then observe, act and step until the
/// episode terminates or is truncated.
pub fn run_one_episode<A: Agent + ?Sized>(
    env: &mut DogEnvironment,
    agent: &mut A,
) -> Result<EpisodeOutcome, RunError> {
    let (mut observation, _info) = env.reset(None);
    agent.reset();

    let cap = env
        .max_episode_steps()
        .unwrap_or_else(|| default_step_cap(env));
    let mut total_reward = 0.0;
    let mut steps = 0;

    loop {
        let action = agent.act(&observation);
        let step = env.step(action)?;
        steps += 1;
        total_reward += step.reward;
        observation = step.observation;

        if step.terminated {
            return Ok(EpisodeOutcome {
                total_reward,
                steps,
                reached_target: true,
                truncated: false,
            });
        }
        if step.truncated || steps >= cap {
            debug!(steps, "episode truncated");
            return Ok(EpisodeOutcome {
                total_reward,
                steps,
                reached_target: false,
                truncated: true,
            });
        }
    }
}

/// Runs `episode_count` episodes and averages their rewards.
pub fn run_many_episodes<A: Agent + ?Sized>(
    env: &mut DogEnvironment,
    agent: &mut A,
    episode_count: usize,
) -> Result<RunSummary, RunError> {
    if episode_count == 0 {
        return Err(RunError::NoEpisodes);
    }

    let mut episodes = Vec::with_capacity(episode_count);
    for episode in 0..episode_count {
        let outcome = run_one_episode(env, agent)?;
        info!(
            episode,
            agent = agent.name(),
            reward = outcome.total_reward,
            steps = outcome.steps,
            reached_target = outcome.reached_target,
            "episode finished"
        );
        episodes.push(outcome);
    }

    let average_reward =
        episodes.iter().map(|e| e.total_reward).sum::<f64>() / episode_count as f64;
    Ok(RunSummary {
        episodes,
        average_reward,
    })
}
