use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use crate::{
    Action, Observation, Position,
    model::{DEFAULT_GRID_SIZE, GridSearchModel},
};

/// Action taken whenever no usable plan exists.
pub const FALLBACK_ACTION: Action = Action::Right;

/// Trait defining the behavior of an agent.
/// Agents decide which action to take based on the latest observation.
pub trait Agent {
    /// Short name used in logs and on the command line.
    fn name(&self) -> &'static str;

    /// Prepares the agent for a new episode.
    fn reset(&mut self);

    /// Determines the action the agent wants to perform.
    /// `&mut self` allows the agent to maintain internal state for decision making (e.g., pathfinding).
    fn act(&mut self, observation: &Observation) -> Action;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn act(&mut self, observation: &Observation) -> Action {
        (**self).act(observation)
    }
}

/// A baseline agent that moves randomly.
#[derive(Debug)]
pub struct RandomAgent {
    rng: StdRng,
    model: GridSearchModel,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            model: GridSearchModel::new(),
        }
    }

    /// Creates an agent seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            model: GridSearchModel::new(),
        }
    }

    pub fn model(&self) -> &GridSearchModel {
        &self.model
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str {
        "random"
    }

    fn reset(&mut self) {
        self.model.reset();
    }

    fn act(&mut self, _observation: &Observation) -> Action {
        Action::ALL[self.rng.random_range(0..Action::ALL.len())]
    }
}

/// Whether the path-following agent currently holds a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    NoPath,
    FollowingPath,
}

/// An agent that plans a shortest path to the target and walks it one step
/// per decision, replanning whenever the plan runs out.
#[derive(Debug)]
pub struct PathFollowingAgent {
    model: GridSearchModel,
    current_plan: VecDeque<Position>, // Queue of positions to visit
    replans: usize,
}

impl Default for PathFollowingAgent {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl PathFollowingAgent {
    pub fn new(grid_size: usize) -> Self {
        Self {
            model: GridSearchModel::with_grid_size(grid_size),
            current_plan: VecDeque::new(),
            replans: 0,
        }
    }

    pub fn state(&self) -> PlanState {
        if self.current_plan.is_empty() {
            PlanState::NoPath
        } else {
            PlanState::FollowingPath
        }
    }

    /// Number of searches run since the last reset.
    pub fn replan_count(&self) -> usize {
        self.replans
    }

    /// Positions still to be visited, front first.
    pub fn remaining_plan(&self) -> impl Iterator<Item = &Position> {
        self.current_plan.iter()
    }

    pub fn model(&self) -> &GridSearchModel {
        &self.model
    }

    fn replan(&mut self, current: Position) {
        let target = self.model.target_position();
        let path = self.model.search(current, target);
        self.replans += 1;
        debug!(
            from = ?current,
            to = ?target,
            steps = path.len().saturating_sub(1),
            "replanned path"
        );
        // The search starts the path at the current position.
        self.current_plan = path.into_iter().skip_while(|p| *p == current).collect();
    }

    /// Converts a move between two adjacent positions into an Action
    fn position_to_action(src: Position, dst: Position) -> Option<Action> {
        Action::from_delta(src.delta_to(dst))
    }
}

impl Agent for PathFollowingAgent {
    fn name(&self) -> &'static str {
        "path"
    }

    fn reset(&mut self) {
        self.current_plan.clear();
        self.model = GridSearchModel::with_grid_size(self.model.grid_size());
        self.replans = 0;
    }

    fn act(&mut self, observation: &Observation) -> Action {
        self.model.update(observation);
        let current = self.model.agent_position();

        if self.current_plan.is_empty() {
            self.replan(current);
        }

        let Some(next) = self.current_plan.pop_front() else {
            trace!(at = ?current, "no path to target");
            return FALLBACK_ACTION;
        };

        match Self::position_to_action(current, next) {
            Some(action) => action,
            None => {
                debug!(at = ?current, expected = ?next, "plan is stale, discarding it");
                self.current_plan.clear();
                FALLBACK_ACTION
            }
        }
    }
}
