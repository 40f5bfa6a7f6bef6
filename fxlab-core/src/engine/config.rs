//! Engine configuration for a single backtest run.

use serde::{Deserialize, Serialize};

use crate::domain::{Instrument, SearchSpace};
use crate::error::ConfigError;
use crate::features::SignalConfig;
use crate::risk::RiskConfig;
use crate::strategy::{ExecutionConfig, ExitConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: f64,
    pub instrument: Instrument,
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub signal: SignalConfig,
    pub exits: ExitConfig,
    /// Bounds a parameter set must satisfy before it is simulated.
    pub bounds: SearchSpace,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            instrument: Instrument::default(),
            execution: ExecutionConfig::default(),
            risk: RiskConfig::default(),
            signal: SignalConfig::default(),
            exits: ExitConfig::default(),
            bounds: SearchSpace::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::invalid(
                "account.initial_balance",
                "must be a positive amount",
            ));
        }
        self.instrument.validate()?;
        self.execution.validate()?;
        self.risk.validate()?;
        if self.signal.atr_period == 0 || self.signal.htf_ema_period == 0 {
            return Err(ConfigError::invalid(
                "signal",
                "atr_period and htf_ema_period must be at least 1",
            ));
        }
        if self.exits.max_bars_held == Some(0) {
            return Err(ConfigError::invalid(
                "exits.max_bars_held",
                "must be at least 1 when set",
            ));
        }
        self.bounds.validate()
    }
}
