use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Contract metadata for the traded currency pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Instrument {
    pub symbol: String,
    pub base_currency: String,
    pub quote_currency: String,
    /// Price increment of one pip (0.0001 for EURUSD).
    pub pip_size: f64,
    /// Units of base currency per standard lot.
    pub contract_size: f64,
    /// Account-currency value of one pip on one lot.
    pub pip_value_per_lot: f64,
    pub min_lot: f64,
    pub lot_step: f64,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".into(),
            base_currency: "EUR".into(),
            quote_currency: "USD".into(),
            pip_size: 0.0001,
            contract_size: 100_000.0,
            pip_value_per_lot: 10.0,
            min_lot: 0.01,
            lot_step: 0.01,
        }
    }
}

impl Instrument {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("instrument.pip_size", self.pip_size),
            ("instrument.contract_size", self.contract_size),
            ("instrument.pip_value_per_lot", self.pip_value_per_lot),
            ("instrument.min_lot", self.min_lot),
            ("instrument.lot_step", self.lot_step),
        ];
        for (key, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::invalid(key, format!("must be positive, got {v}")));
            }
        }
        Ok(())
    }

    pub fn pips_to_price(&self, pips: f64) -> f64 {
        pips * self.pip_size
    }

    pub fn price_to_pips(&self, distance: f64) -> f64 {
        distance / self.pip_size
    }

    /// Floor `lots` to the lot step, never going below the minimum lot.
    pub fn round_lots(&self, lots: f64) -> f64 {
        // Small epsilon keeps exact multiples from flooring one step down.
        let steps = (lots / self.lot_step + 1e-9).floor();
        (steps * self.lot_step).max(self.min_lot)
    }

    /// Whether an event in `currency` moves this pair.
    pub fn is_exposed_to(&self, currency: &str) -> bool {
        currency.eq_ignore_ascii_case(&self.base_currency)
            || currency.eq_ignore_ascii_case(&self.quote_currency)
    }
}
