//! `stepsort.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{CumulativeGrouping, StepSortError, StepSortResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Number of visited steps kept in the history buffer.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Whether prefix-sum updates advance one at a time or as one batch.
    #[serde(default)]
    pub cumulative_grouping: CumulativeGrouping,

    /// Upper bound on counting buckets (`max - min + 1`).
    #[serde(default = "default_max_range")]
    pub max_range: usize,
}

fn default_history_capacity() -> usize {
    crate::DEFAULT_HISTORY_CAPACITY
}

fn default_max_range() -> usize {
    crate::DEFAULT_MAX_RANGE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            cumulative_grouping: CumulativeGrouping::default(),
            max_range: default_max_range(),
        }
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match Self::parse(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to load config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(s: &str) -> StepSortResult<Self> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> StepSortResult<()> {
        if self.history_capacity == 0 {
            return Err(StepSortError::Config("history_capacity must be at least 1".to_string()));
        }
        if self.max_range == 0 {
            return Err(StepSortError::Config("max_range must be at least 1".to_string()));
        }
        Ok(())
    }
}
