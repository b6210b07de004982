use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet},
};

use crate::{Action, Observation, ObservationError, Position};

/// Grid size used when the model is not told otherwise.
pub const DEFAULT_GRID_SIZE: usize = 15;

const DEFAULT_AGENT: Position = Position::new(0, 0);
const DEFAULT_TARGET: Position = Position::new(4, 4);

/// The dog's belief about the world: where it is, where the target is, and
/// which cells are blocked. Answers shortest-path queries over that belief.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSearchModel {
    agent: Position,
    target: Position,
    obstacles: HashSet<Position>,
    grid_size: usize,
}

impl Default for GridSearchModel {
    fn default() -> Self {
        Self::with_grid_size(DEFAULT_GRID_SIZE)
    }
}

impl GridSearchModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model for a `grid_size` x `grid_size` world.
    pub fn with_grid_size(grid_size: usize) -> Self {
        GridSearchModel {
            agent: DEFAULT_AGENT,
            target: DEFAULT_TARGET,
            obstacles: HashSet::new(),
            grid_size,
        }
    }

    /// Restores the default snapshot. The grid size is kept.
    pub fn reset(&mut self) {
        self.agent = DEFAULT_AGENT;
        self.target = DEFAULT_TARGET;
        self.obstacles = HashSet::new();
    }

    /// Replaces the whole snapshot with the contents of `observation`.
    pub fn update(&mut self, observation: &Observation) {
        self.agent = observation.agent;
        self.target = observation.target;
        self.obstacles = observation.obstacles.iter().copied().collect();
    }

    /// Decodes a raw observation and applies it. A malformed observation
    /// leaves the snapshot untouched.
    pub fn update_from_value(&mut self, value: &serde_json::Value) -> Result<(), ObservationError> {
        let observation = Observation::from_value(value)?;
        self.update(&observation);
        Ok(())
    }

    pub fn agent_position(&self) -> Position {
        self.agent
    }

    pub fn target_position(&self) -> Position {
        self.target
    }

    pub fn obstacles(&self) -> &HashSet<Position> {
        &self.obstacles
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Checks if `position` lies on the grid.
    #[inline]
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x < self.grid_size && position.y < self.grid_size
    }

    /// Neighbours of `position` reachable in one step, in RIGHT, UP, LEFT,
    /// DOWN order.
    pub fn valid_moves(&self, position: Position) -> Vec<Position> {
        Action::ALL
            .iter()
            .filter_map(|action| {
                let (dx, dy) = action.delta();
                position.offset(dx, dy)
            })
            .filter(|next| self.in_bounds(*next) && !self.obstacles.contains(next))
            .collect()
    }

    /// Manhattan distance from `position` to the believed target.
    pub fn heuristic(&self, position: Position) -> usize {
        position.manhattan(self.target)
    }

    /// A* from `start` to `goal` over unit-cost cardinal moves.
    ///
    /// The returned path begins at `start` and ends at `goal`. An empty path
    /// means `goal` cannot be reached.
    pub fn search(&self, start: Position, goal: Position) -> Vec<Position> {
        let mut open = BinaryHeap::new();
        let mut closed: HashSet<Position> = HashSet::new();

        open.push(SearchNode {
            estimate: start.manhattan(goal),
            cost: 0,
            position: start,
            prefix: Vec::new(),
        });

        while let Some(node) = open.pop() {
            if node.position == goal {
                let mut path = node.prefix;
                path.push(node.position);
                return path;
            }

            if !closed.insert(node.position) {
                continue;
            }

            for neighbor in self.valid_moves(node.position) {
                if closed.contains(&neighbor) {
                    continue;
                }
                let cost = node.cost + 1;
                let mut prefix = node.prefix.clone();
                prefix.push(node.position);
                open.push(SearchNode {
                    estimate: cost + neighbor.manhattan(goal),
                    cost,
                    position: neighbor,
                    prefix,
                });
            }
        }

        Vec::new()
    }
}

/// Open-set entry. Lives only for the duration of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchNode {
    estimate: usize,
    cost: usize,
    position: Position,
    prefix: Vec<Position>,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.position.cmp(&self.position))
            .then_with(|| other.prefix.cmp(&self.prefix))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(size: usize, target: Position, obstacles: &[(usize, usize)]) -> GridSearchModel {
        let mut model = GridSearchModel::with_grid_size(size);
        model.update(&Observation {
            agent: Position::new(0, 0),
            target,
            obstacles: obstacles.iter().copied().map(Position::from).collect(),
        });
        model
    }

    fn assert_unit_steps(path: &[Position]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn reset_restores_defaults() {
        let mut model = model(5, Position::new(2, 3), &[(1, 1)]);
        model.reset();
        assert_eq!(model.agent_position(), Position::new(0, 0));
        assert_eq!(model.target_position(), Position::new(4, 4));
        assert!(model.obstacles().is_empty());
        assert_eq!(model.grid_size(), 5);
    }

    #[test]
    fn valid_moves_follow_fixed_order() {
        let model = model(5, Position::new(4, 4), &[]);
        assert_eq!(
            model.valid_moves(Position::new(2, 2)),
            vec![
                Position::new(3, 2),
                Position::new(2, 3),
                Position::new(1, 2),
                Position::new(2, 1),
            ]
        );
    }

    #[test]
    fn valid_moves_respect_bounds_and_obstacles() {
        let model = model(5, Position::new(4, 4), &[(1, 0)]);
        assert_eq!(model.valid_moves(Position::new(0, 0)), vec![Position::new(0, 1)]);
        assert_eq!(
            model.valid_moves(Position::new(4, 4)),
            vec![Position::new(3, 4), Position::new(4, 3)]
        );
    }

    #[test]
    fn heuristic_is_manhattan_distance_to_target() {
        let model = model(15, Position::new(4, 4), &[]);
        assert_eq!(model.heuristic(Position::new(0, 0)), 8);
        assert_eq!(model.heuristic(Position::new(6, 1)), 5);
        assert_eq!(model.heuristic(Position::new(4, 4)), 0);
    }

    #[test]
    fn corner_to_corner_on_empty_grid() {
        let model = model(5, Position::new(4, 4), &[]);
        let path = model.search(Position::new(0, 0), Position::new(4, 4));
        assert_eq!(path.len(), 9);
        assert_eq!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(4, 4)));
        assert_unit_steps(&path);
    }

    #[test]
    fn search_is_deterministic() {
        let model = model(5, Position::new(4, 4), &[]);
        let first = model.search(Position::new(0, 0), Position::new(4, 4));
        for _ in 0..5 {
            assert_eq!(model.search(Position::new(0, 0), Position::new(4, 4)), first);
        }
    }

    #[test]
    fn start_equal_to_goal_yields_single_entry() {
        let model = model(5, Position::new(0, 0), &[]);
        assert_eq!(
            model.search(Position::new(0, 0), Position::new(0, 0)),
            vec![Position::new(0, 0)]
        );
    }

    #[test]
    fn boxed_in_goal_is_unreachable() {
        let model = model(5, Position::new(2, 2), &[(1, 2), (3, 2), (2, 1), (2, 3)]);
        assert!(model.search(Position::new(0, 0), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn search_detours_around_a_wall() {
        // Wall along x = 2 except at the top row.
        let model = model(5, Position::new(4, 0), &[(2, 0), (2, 1), (2, 2), (2, 3)]);
        let path = model.search(Position::new(0, 0), Position::new(4, 0));
        assert_eq!(path.len(), 13);
        assert!(path.contains(&Position::new(2, 4)));
        assert!(path.iter().all(|p| !model.obstacles().contains(p)));
        assert_unit_steps(&path);
    }

    #[test]
    fn goal_that_is_an_obstacle_is_unreachable() {
        let model = model(5, Position::new(3, 3), &[(3, 3)]);
        assert!(model.search(Position::new(0, 0), Position::new(3, 3)).is_empty());
    }

    #[test]
    fn search_towards_a_goal_other_than_target_is_still_shortest() {
        let model = model(10, Position::new(9, 9), &[]);
        let path = model.search(Position::new(5, 5), Position::new(0, 0));
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn repeated_update_gives_identical_search() {
        let obs = Observation {
            agent: Position::new(0, 0),
            target: Position::new(6, 6),
            obstacles: vec![Position::new(1, 1), Position::new(3, 2), Position::new(5, 5)],
        };
        let mut model = GridSearchModel::new();
        model.update(&obs);
        let first = model.search(obs.agent, obs.target);
        model.update(&obs);
        assert_eq!(model.search(obs.agent, obs.target), first);
    }

    #[test]
    fn malformed_observation_keeps_previous_snapshot() {
        let mut model = GridSearchModel::new();
        model
            .update_from_value(&serde_json::json!({
                "agent": [2, 3],
                "target": [7, 7],
                "obstacles": [[1, 1]],
            }))
            .unwrap();
        let before = model.clone();

        let err = model
            .update_from_value(&serde_json::json!({ "agent": [1], "target": [0, 0], "obstacles": [] }))
            .unwrap_err();
        assert!(matches!(err, ObservationError::WrongLength { field: "agent", .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn node_order_prefers_lower_estimate_then_lower_cost() {
        let node = |estimate, cost, x| SearchNode {
            estimate,
            cost,
            position: Position::new(x, 0),
            prefix: Vec::new(),
        };
        let mut heap = BinaryHeap::new();
        heap.push(node(5, 3, 0));
        heap.push(node(4, 4, 1));
        heap.push(node(4, 2, 2));
        heap.push(node(4, 2, 0));
        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|n| (n.estimate, n.cost, n.position.x))
            .collect();
        assert_eq!(order, vec![(4, 2, 0), (4, 2, 2), (4, 4, 1), (5, 3, 0)]);
    }
}
