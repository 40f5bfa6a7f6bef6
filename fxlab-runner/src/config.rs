//! Lab configuration: one TOML file, every section optional.
//!
//! ```toml
//! [account]
//! initial_balance = 10000.0
//!
//! [risk]
//! risk_per_trade_pct = 0.5
//!
//! [optimizer]
//! workers = 4
//! trials = 200
//! sampler = "evolutionary"
//!
//! [search_space]
//! ema_fast = { min = 3, max = 30 }
//! ml_enabled = { fixed = false }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::domain::{Instrument, SearchSpace};
use fxlab_core::engine::EngineConfig;
use fxlab_core::error::ConfigError;
use fxlab_core::features::SignalConfig;
use fxlab_core::risk::RiskConfig;
use fxlab_core::strategy::{ExecutionConfig, ExitConfig};

use crate::sampler::EvolutionConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub initial_balance: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
        }
    }
}

/// Which ask/tell sampler drives the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    Random,
    #[default]
    Evolutionary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Threads in the trial pool.
    pub workers: usize,
    /// Proposals asked per batch. Fixed independently of `workers` so the
    /// sampler sees the same ask/tell sequence on any machine.
    pub batch_size: usize,
    /// Trial budget.
    pub trials: usize,
    /// Wall-clock budget, checked between batches.
    pub deadline_secs: Option<u64>,
    pub seed: u64,
    /// Leading share of the bars used as the training slice.
    pub train_fraction: f64,
    /// Skip the walk-forward slice for trials infeasible on the training slice.
    pub require_train_feasible: bool,
    pub sampler: SamplerKind,
    pub evolution: EvolutionConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 8,
            trials: 200,
            deadline_secs: None,
            seed: 42,
            train_fraction: 0.7,
            require_train_feasible: false,
            sampler: SamplerKind::default(),
            evolution: EvolutionConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::invalid("optimizer.workers", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid(
                "optimizer.batch_size",
                "must be at least 1",
            ));
        }
        if self.trials == 0 {
            return Err(ConfigError::invalid("optimizer.trials", "must be at least 1"));
        }
        if self.deadline_secs == Some(0) {
            return Err(ConfigError::invalid(
                "optimizer.deadline_secs",
                "must be positive when set",
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::invalid(
                "optimizer.train_fraction",
                format!("{} is not inside (0, 1)", self.train_fraction),
            ));
        }
        self.evolution.validate()
    }
}

// ─── Top level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub account: AccountConfig,
    pub instrument: Instrument,
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub signal: SignalConfig,
    pub exits: ExitConfig,
    pub optimizer: OptimizerConfig,
    pub search_space: SearchSpace,
}

impl LabConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config().validate()?;
        self.optimizer.validate()
    }

    /// The single-backtest view of this config. Parameter sets are bounded
    /// by `search_space`.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_balance: self.account.initial_balance,
            instrument: self.instrument.clone(),
            execution: self.execution.clone(),
            risk: self.risk.clone(),
            signal: self.signal.clone(),
            exits: self.exits.clone(),
            bounds: self.search_space.clone(),
        }
    }
}
