use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Position;

/// Errors raised while coercing raw observation data into an [`Observation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    #[error("Observation is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("Field `{field}` must be a list of {expected} coordinates, found {found}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Field `{field}` must contain non-negative integers, found {found}")]
    NotACoordinate { field: &'static str, found: String },
    #[error("Field `{field}` must be a list, found {found}")]
    NotAList { field: &'static str, found: String },
    #[error("Observation must be a JSON object")]
    NotAnObject,
    #[error("Observation is not valid JSON: {0}")]
    InvalidJson(String),
}

/// What the environment reveals to an agent after a reset or a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub agent: Position,
    pub target: Position,
    pub obstacles: Vec<Position>,
}

impl Observation {
    /// Decodes an observation shaped as
    /// `{"agent": [x, y], "target": [x, y], "obstacles": [[x, y], ...]}`.
    pub fn from_value(value: &Value) -> Result<Self, ObservationError> {
        let object = value.as_object().ok_or(ObservationError::NotAnObject)?;
        let field = |name: &'static str| {
            object
                .get(name)
                .ok_or(ObservationError::MissingField(name))
        };

        let agent = coordinate("agent", field("agent")?)?;
        let target = coordinate("target", field("target")?)?;
        let obstacles = match field("obstacles")? {
            Value::Array(items) => items
                .iter()
                .map(|item| coordinate("obstacles", item))
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(ObservationError::NotAList {
                    field: "obstacles",
                    found: other.to_string(),
                });
            }
        };

        Ok(Observation {
            agent,
            target,
            obstacles,
        })
    }

    /// Parses an observation from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ObservationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| ObservationError::InvalidJson(err.to_string()))?;
        Self::from_value(&value)
    }

    /// Encodes the observation in the `[x, y]` list form accepted by
    /// [`Observation::from_value`].
    pub fn to_value(&self) -> Value {
        let pair = |p: &Position| Value::from(vec![p.x, p.y]);
        serde_json::json!({
            "agent": pair(&self.agent),
            "target": pair(&self.target),
            "obstacles": self.obstacles.iter().map(pair).collect::<Vec<_>>(),
        })
    }
}

fn coordinate(field: &'static str, value: &Value) -> Result<Position, ObservationError> {
    let items = value.as_array().ok_or_else(|| ObservationError::NotAList {
        field,
        found: value.to_string(),
    })?;
    if items.len() != 2 {
        return Err(ObservationError::WrongLength {
            field,
            expected: 2,
            found: items.len(),
        });
    }
    let axis = |v: &Value| {
        v.as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ObservationError::NotACoordinate {
                field,
                found: v.to_string(),
            })
    };
    Ok(Position {
        x: axis(&items[0])?,
        y: axis(&items[1])?,
    })
}
