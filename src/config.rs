//! Search configuration.
//!
//! Settings come from (highest priority first):
//! 1. Environment variables (`SUPERCHESS_<FIELD>`, e.g. `SUPERCHESS_NUM_SIMULATIONS=200`)
//! 2. The `[search]` table of a TOML file
//! 3. Built-in defaults
//!
//! ```toml
//! [search]
//! num_simulations = 400
//! temperature = 0.0
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::action::ActionSpace;
use crate::constants::{N, N_SIMS, NUM_ACTIONS};

/// Reasons a configuration is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board must be 10x10, got {rows}x{cols}")]
    BoardSize { rows: usize, cols: usize },

    #[error(
        "action space has {num_actions} entries but a {rows}x{cols} board needs {expected} \
         (rows * cols * rows * cols)"
    )]
    ActionSpaceMismatch {
        rows: usize,
        cols: usize,
        num_actions: usize,
        expected: usize,
    },

    #[error("num_simulations must be at least 1")]
    NoSimulations,

    #[error("eval_batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("temperature must be a non-negative number, got {0}")]
    BadTemperature(f32),

    #[error("virtual_loss must be a non-negative number, got {0}")]
    BadVirtualLoss(f64),
}

fn d_rows() -> usize {
    N
}
fn d_cols() -> usize {
    N
}
fn d_num_actions() -> usize {
    NUM_ACTIONS
}
fn d_num_simulations() -> u32 {
    N_SIMS
}
fn d_temperature() -> f32 {
    1.0
}
fn d_eval_batch_size() -> usize {
    1
}
fn d_virtual_loss() -> f64 {
    1.0
}
fn d_seed() -> u64 {
    42
}

/// Configuration for one search controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_rows")]
    pub board_rows: usize,

    #[serde(default = "d_cols")]
    pub board_cols: usize,

    /// Length of the evaluator's policy vector.
    #[serde(default = "d_num_actions")]
    pub num_actions: usize,

    /// Simulations per decision.
    #[serde(default = "d_num_simulations")]
    pub num_simulations: u32,

    /// Visit-count temperature for the extracted policy.
    /// 1.0 = proportional to visits, ~0 = argmax.
    #[serde(default = "d_temperature")]
    pub temperature: f32,

    /// Leaves collected per evaluator call. 1 disables batching.
    #[serde(default = "d_eval_batch_size")]
    pub eval_batch_size: usize,

    /// Value subtracted per pending simulation while a batch is in flight.
    #[serde(default = "d_virtual_loss")]
    pub virtual_loss: f64,

    /// Optional wall-clock budget per decision, in milliseconds.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,

    /// Seed for sampling a move from the extracted policy.
    #[serde(default = "d_seed")]
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            board_rows: d_rows(),
            board_cols: d_cols(),
            num_actions: d_num_actions(),
            num_simulations: d_num_simulations(),
            temperature: d_temperature(),
            eval_batch_size: d_eval_batch_size(),
            virtual_loss: d_virtual_loss(),
            time_budget_ms: None,
            seed: d_seed(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    search: SearchConfig,
}

impl SearchConfig {
    /// A small budget for tests and quick experiments.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            temperature: 0.0,
            ..Self::default()
        }
    }

    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.eval_batch_size = size;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(budget.as_millis() as u64);
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.board_rows, self.board_cols)
    }

    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_rows != N || self.board_cols != N {
            return Err(ConfigError::BoardSize {
                rows: self.board_rows,
                cols: self.board_cols,
            });
        }
        let expected = self.action_space().len();
        if self.num_actions != expected {
            return Err(ConfigError::ActionSpaceMismatch {
                rows: self.board_rows,
                cols: self.board_cols,
                num_actions: self.num_actions,
                expected,
            });
        }
        if self.num_simulations == 0 {
            return Err(ConfigError::NoSimulations);
        }
        if self.eval_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(ConfigError::BadTemperature(self.temperature));
        }
        if self.virtual_loss.is_nan() || self.virtual_loss < 0.0 {
            return Err(ConfigError::BadVirtualLoss(self.virtual_loss));
        }
        Ok(())
    }

    /// Parse the `[search]` table of a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("invalid search config")?;
        Ok(file.search)
    }

    /// Load a config file, apply environment overrides, and validate.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)?.apply_env_overrides();
        config.validate()?;
        debug!(?config, "search config loaded");
        Ok(config)
    }

    /// Override fields from `SUPERCHESS_*` environment variables.
    pub fn apply_env_overrides(mut self) -> Self {
        env_override(&mut self.num_simulations, "SUPERCHESS_NUM_SIMULATIONS");
        env_override(&mut self.temperature, "SUPERCHESS_TEMPERATURE");
        env_override(&mut self.eval_batch_size, "SUPERCHESS_EVAL_BATCH_SIZE");
        env_override(&mut self.virtual_loss, "SUPERCHESS_VIRTUAL_LOSS");
        env_override(&mut self.num_actions, "SUPERCHESS_NUM_ACTIONS");
        env_override(&mut self.seed, "SUPERCHESS_SEED");
        if let Ok(v) = std::env::var("SUPERCHESS_TIME_BUDGET_MS") {
            match v.parse() {
                Ok(ms) => self.time_budget_ms = Some(ms),
                Err(_) => warn!("Ignoring SUPERCHESS_TIME_BUDGET_MS={v}: not a number"),
            }
        }
        self
    }
}

fn env_override<T: std::str::FromStr>(field: &mut T, key: &str) {
    if let Ok(v) = std::env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!("Ignoring {key}={v}: failed to parse"),
        }
    }
}
