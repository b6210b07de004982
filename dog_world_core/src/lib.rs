use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod environment;
pub mod model;
pub mod observation;
pub mod runner;

pub use observation::{Observation, ObservationError};

/// Represents a 2D coordinate.
///
/// Ordered by `x` first, then `y`. The search uses this order to break ties
/// between equally promising nodes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the position shifted by `(dx, dy)`, or `None` if either
    /// coordinate would become negative.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Signed step from `self` to `other`.
    pub fn delta_to(self, other: Position) -> (isize, isize) {
        (
            other.x as isize - self.x as isize,
            other.y as isize - self.y as isize,
        )
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

/// Error returned when an integer does not name one of the four actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Action index {0} is outside the action space 0..4")]
pub struct ActionError(pub usize);

/// Represents the discrete moves the dog can make.
///
/// The numeric value is the index used on the environment's action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Right = 0,
    Up = 1,
    Left = 2,
    Down = 3,
}

impl Action {
    /// All actions, in action-space order.
    pub const ALL: [Action; 4] = [Action::Right, Action::Up, Action::Left, Action::Down];

    /// The grid delta applied by this action.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Right => (1, 0),
            Action::Up => (0, 1),
            Action::Left => (-1, 0),
            Action::Down => (0, -1),
        }
    }

    /// Maps a unit step back to its action. Anything that is not a single
    /// cardinal step yields `None`.
    pub fn from_delta(delta: (isize, isize)) -> Option<Action> {
        match delta {
            (1, 0) => Some(Action::Right),
            (0, 1) => Some(Action::Up),
            (-1, 0) => Some(Action::Left),
            (0, -1) => Some(Action::Down),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Action {
    type Error = ActionError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Action::ALL.get(value).copied().ok_or(ActionError(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_indices_follow_action_space() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::try_from(i), Ok(*action));
        }
        assert_eq!(Action::try_from(4), Err(ActionError(4)));
    }

    #[test]
    fn delta_round_trips_through_direction_table() {
        for action in Action::ALL {
            assert_eq!(Action::from_delta(action.delta()), Some(action));
        }
        assert_eq!(Action::from_delta((0, 0)), None);
        assert_eq!(Action::from_delta((1, 1)), None);
        assert_eq!(Action::from_delta((2, 0)), None);
    }

    #[test]
    fn offset_refuses_negative_coordinates() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(0, -1), None);
        assert_eq!(origin.offset(1, 0), Some(Position::new(1, 0)));
    }

    #[test]
    fn positions_order_by_x_then_y() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(1, 0) < Position::new(1, 1));
        assert_eq!(Position::new(3, 1).manhattan(Position::new(0, 5)), 7);
    }
}
