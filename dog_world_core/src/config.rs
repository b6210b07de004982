use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_GRID_SIZE;

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which decision policy drives the dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    Random,
    Path,
}

/// Layout parameters for the dog environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Width and height of the square grid (default: 15).
    pub grid_size: usize,
    /// Obstacles placed on every reset (default: 35).
    pub num_obstacles: usize,
    /// Steps after which an episode is truncated; `None` means no limit.
    pub max_episode_steps: Option<usize>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            num_obstacles: 35,
            max_episode_steps: None,
        }
    }
}

/// Complete configuration for a batch of episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DogWorldConfig {
    pub environment: EnvironmentConfig,
    /// Seed for the environment and agent RNGs; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Episodes to run (default: 1).
    pub episode_count: usize,
    pub agent: AgentKind,
}

impl Default for DogWorldConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            seed: None,
            episode_count: 1,
            agent: AgentKind::default(),
        }
    }
}

impl DogWorldConfig {
    /// Loads a JSON config. Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
