use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weights of the priority function. Lower priorities are explored first:
///
/// `base + level * level_weight - (consecutiveness * w + completeness * w + availability * w)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    pub base: i64,
    pub level: i64,
    pub consecutiveness: i64,
    pub completeness: i64,
    pub availability: i64,
}

impl Default for Weights {
    fn default() -> Self {
        //  consecutiveness [0, 48]   6 * c = [0, 288]
        //  completeness    [0, 52]  10 * c = [0, 520]
        //  availability    [0, 12]  20 * a = [0, 240]
        Self {
            base: 480,
            level: 8,
            consecutiveness: 6,
            completeness: 10,
            availability: 20,
        }
    }
}

impl Weights {
    pub fn priority(&self, level: u32, consecutiveness: u32, completeness: u32, availability: u32) -> i64 {
        self.base + self.level * level as i64
            - (self.consecutiveness * consecutiveness as i64
                + self.completeness * completeness as i64
                + self.availability * availability as i64)
    }
}

/// Everything a solve run can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverConfig {
    pub weights: Weights,
    /// Slack subtracted from the lower bound when pruning; 0 keeps the search exact.
    pub relaxation: u32,
    pub max_iterations: u64,
    /// Iterations between two progress reports; 0 reports only when the search ends.
    pub progress_every: u64,
    pub reconstruct_iterations: u64,
    /// When set, the initial bound is the start position's minimum cost plus this many levels.
    pub level_cap: Option<u32>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            relaxation: 0,
            max_iterations: 9_950_000,
            progress_every: 10_000,
            reconstruct_iterations: 100_000,
            level_cap: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWeights {
    base: Option<i64>,
    level: Option<i64>,
    consecutiveness: Option<i64>,
    completeness: Option<i64>,
    availability: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    weights: Option<RawWeights>,
    relaxation: Option<i64>,
    max_iterations: Option<u64>,
    progress_every: Option<u64>,
    reconstruct_iterations: Option<u64>,
    level_cap: Option<u32>,
}

impl SolverConfig {
    /// Parses a YAML config. The four weights and the relaxation are required; everything else
    /// falls back to the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        let defaults = Self::default();

        let weights = raw.weights.ok_or(ConfigError::Missing("weights"))?;
        let weights = Weights {
            base: weights.base.unwrap_or(defaults.weights.base),
            level: weights.level.ok_or(ConfigError::Missing("weights.level"))?,
            consecutiveness: weights
                .consecutiveness
                .ok_or(ConfigError::Missing("weights.consecutiveness"))?,
            completeness: weights
                .completeness
                .ok_or(ConfigError::Missing("weights.completeness"))?,
            availability: weights
                .availability
                .ok_or(ConfigError::Missing("weights.availability"))?,
        };

        let relaxation = raw.relaxation.ok_or(ConfigError::Missing("relaxation"))?;
        let relaxation = u32::try_from(relaxation).map_err(|_| ConfigError::OutOfRange {
            name: "relaxation",
            requirement: "a non-negative integer",
            value: relaxation,
        })?;

        let progress_every = raw.progress_every.unwrap_or(defaults.progress_every);
        if progress_every == 0 {
            return Err(ConfigError::OutOfRange {
                name: "progress_every",
                requirement: "at least 1",
                value: 0,
            });
        }

        Ok(Self {
            weights,
            relaxation,
            max_iterations: raw.max_iterations.unwrap_or(defaults.max_iterations),
            progress_every,
            reconstruct_iterations: raw
                .reconstruct_iterations
                .unwrap_or(defaults.reconstruct_iterations),
            level_cap: raw.level_cap,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }
}
