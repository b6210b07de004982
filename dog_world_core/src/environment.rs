use std::collections::BTreeSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Action, Observation, Position, config::EnvironmentConfig};

/// Represents errors that can occur while building or driving the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Grid size must be at least 2, got {0}")]
    GridTooSmall(usize),
    #[error(
        "{obstacles} obstacles do not fit on a {size}x{size} grid next to the dog and the target"
    )]
    TooManyObstacles { obstacles: usize, size: usize },
    #[error("The environment must be reset before it can be stepped")]
    NotReset,
}

/// Mirror of the environment's private state, returned alongside observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub agent_location: Position,
    pub target_location: Position,
    pub obstacle_locations: Vec<Position>,
}

/// Outcome of applying one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    /// The dog stands on the target.
    pub terminated: bool,
    /// The step limit was reached first.
    pub truncated: bool,
    pub info: StepInfo,
}

impl Step {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone)]
struct Layout {
    agent: Position,
    target: Position,
    obstacles: BTreeSet<Position>,
}

/// A square grid with one dog, one target and a fixed set of obstacles per
/// episode.
#[derive(Debug)]
pub struct DogEnvironment {
    size: usize,
    num_obstacles: usize,
    max_episode_steps: Option<usize>,
    rng: StdRng,
    layout: Option<Layout>,
    elapsed_steps: usize,
}

impl DogEnvironment {
    /// Creates an environment seeded from the operating system.
    pub fn new(config: &EnvironmentConfig) -> Result<Self, EnvironmentError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an environment whose layouts are reproducible from `seed`.
    pub fn seeded(config: &EnvironmentConfig, seed: u64) -> Result<Self, EnvironmentError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &EnvironmentConfig, rng: StdRng) -> Result<Self, EnvironmentError> {
        let size = config.grid_size;
        if size < 2 {
            return Err(EnvironmentError::GridTooSmall(size));
        }
        let free_cells = size.saturating_mul(size) - 2;
        if config.num_obstacles > free_cells {
            return Err(EnvironmentError::TooManyObstacles {
                obstacles: config.num_obstacles,
                size,
            });
        }
        Ok(DogEnvironment {
            size,
            num_obstacles: config.num_obstacles,
            max_episode_steps: config.max_episode_steps,
            rng,
            layout: None,
            elapsed_steps: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_episode_steps(&self) -> Option<usize> {
        self.max_episode_steps
    }

    /// Steps taken since the last reset.
    pub fn elapsed_steps(&self) -> usize {
        self.elapsed_steps
    }

    pub fn agent_location(&self) -> Option<Position> {
        self.layout.as_ref().map(|l| l.agent)
    }

    pub fn target_location(&self) -> Option<Position> {
        self.layout.as_ref().map(|l| l.target)
    }

    pub fn obstacle_locations(&self) -> Option<&BTreeSet<Position>> {
        self.layout.as_ref().map(|l| &l.obstacles)
    }

    /// Places a fresh dog, target and obstacles. Reseeds first when `seed`
    /// is given.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let agent = self.random_position(&BTreeSet::new());
        let target = self.random_position(&BTreeSet::from([agent]));
        let mut excluded = BTreeSet::from([agent, target]);
        let mut obstacles = BTreeSet::new();
        for _ in 0..self.num_obstacles {
            let obstacle = self.random_position(&excluded);
            excluded.insert(obstacle);
            obstacles.insert(obstacle);
        }

        debug!(?agent, ?target, obstacles = obstacles.len(), "environment reset");
        let layout = Layout {
            agent,
            target,
            obstacles,
        };
        let snapshot = (observe(&layout), info(&layout));
        self.layout = Some(layout);
        self.elapsed_steps = 0;
        snapshot
    }

    /// Installs a hand-built layout instead of a random one.
    pub fn reset_to(
        &mut self,
        agent: Position,
        target: Position,
        obstacles: &[Position],
    ) -> (Observation, StepInfo) {
        let layout = Layout {
            agent,
            target,
            obstacles: obstacles.iter().copied().collect(),
        };
        let snapshot = (observe(&layout), info(&layout));
        self.layout = Some(layout);
        self.elapsed_steps = 0;
        snapshot
    }

    /// Moves the dog one cell, clamped to the grid. A move onto an obstacle
    /// leaves the dog where it is.
    pub fn step(&mut self, action: Action) -> Result<Step, EnvironmentError> {
        let last = self.size - 1;
        let layout = self.layout.as_mut().ok_or(EnvironmentError::NotReset)?;

        let (dx, dy) = action.delta();
        let proposed = Position {
            x: layout.agent.x.saturating_add_signed(dx).min(last),
            y: layout.agent.y.saturating_add_signed(dy).min(last),
        };
        if layout.obstacles.contains(&proposed) {
            trace!(?action, at = ?layout.agent, blocked_by = ?proposed, "move blocked");
        } else {
            layout.agent = proposed;
        }

        self.elapsed_steps += 1;
        let terminated = layout.agent == layout.target;
        let truncated = !terminated
            && self
                .max_episode_steps
                .is_some_and(|limit| self.elapsed_steps >= limit);
        let reward = if terminated { 1.0 } else { 0.0 };

        Ok(Step {
            observation: observe(layout),
            reward,
            terminated,
            truncated,
            info: info(layout),
        })
    }

    fn random_position(&mut self, exclude: &BTreeSet<Position>) -> Position {
        loop {
            let position = Position {
                x: self.rng.random_range(0..self.size),
                y: self.rng.random_range(0..self.size),
            };
            if !exclude.contains(&position) {
                return position;
            }
        }
    }
}

fn observe(layout: &Layout) -> Observation {
    Observation {
        agent: layout.agent,
        target: layout.target,
        obstacles: layout.obstacles.iter().copied().collect(),
    }
}

fn info(layout: &Layout) -> StepInfo {
    StepInfo {
        agent_location: layout.agent,
        target_location: layout.target,
        obstacle_locations: layout.obstacles.iter().copied().collect(),
    }
}
