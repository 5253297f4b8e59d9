use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-lines file of events in commit order.
    pub events_path: PathBuf,
    /// CSV destination for position rows; rows are kept in memory when unset.
    pub output_path: Option<PathBuf>,
    /// Number of single-writer lanes positions are sharded across.
    pub lanes: usize,
    pub channel_capacity: usize,
    /// Drop events whose sequence does not advance past the last one applied to the key.
    pub enforce_sequencing: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let events_path = env_map
            .get("EVENTS_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnv("EVENTS_PATH".to_string()))?;

        let output_path = env_map
            .get("OUTPUT_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let lanes = parse_positive(&env_map, "LANES", 4)?;
        let channel_capacity = parse_positive(&env_map, "CHANNEL_CAPACITY", 1024)?;

        let enforce_sequencing = match env_map
            .get("ENFORCE_SEQUENCING")
            .map(|s| s.as_str())
            .unwrap_or("true")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ENFORCE_SEQUENCING".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        Ok(Config {
            events_path,
            output_path,
            lanes,
            channel_capacity,
            enforce_sequencing,
        })
    }
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive integer".to_string(),
        )),
    }
}
