//! Strategy parameters and the bounded space they are drawn from.
//!
//! A `ParameterSet` is a plain `Copy` value; it is never mutated after
//! construction. Validity is always judged against a `SearchSpace`, which is
//! also what the samplers decode their unit-cube genomes through.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of searchable dimensions (one per `ParameterSet` field).
pub const DIMENSIONS: usize = 9;

/// Field names in genome order. These are also the exported record keys.
pub const FIELD_NAMES: [&str; DIMENSIONS] = [
    "ema_fast",
    "ema_slow",
    "rsi_period",
    "rsi_hi",
    "rsi_lo",
    "atr_sl_mult",
    "atr_tp_mult",
    "ml_n_estimators",
    "ml_enabled",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub rsi_hi: f64,
    pub rsi_lo: f64,
    pub atr_sl_mult: f64,
    pub atr_tp_mult: f64,
    pub ml_n_estimators: usize,
    pub ml_enabled: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            ema_fast: 5,
            ema_slow: 10,
            rsi_period: 14,
            rsi_hi: 70.0,
            rsi_lo: 30.0,
            atr_sl_mult: 2.0,
            atr_tp_mult: 3.0,
            ml_n_estimators: 10,
            ml_enabled: true,
        }
    }
}

/// A single exported value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParameterSet {
    /// Flat `(name, value)` pairs in genome order.
    pub fn fields(&self) -> [(&'static str, ParamValue); DIMENSIONS] {
        [
            (FIELD_NAMES[0], ParamValue::Int(self.ema_fast as i64)),
            (FIELD_NAMES[1], ParamValue::Int(self.ema_slow as i64)),
            (FIELD_NAMES[2], ParamValue::Int(self.rsi_period as i64)),
            (FIELD_NAMES[3], ParamValue::Float(self.rsi_hi)),
            (FIELD_NAMES[4], ParamValue::Float(self.rsi_lo)),
            (FIELD_NAMES[5], ParamValue::Float(self.atr_sl_mult)),
            (FIELD_NAMES[6], ParamValue::Float(self.atr_tp_mult)),
            (FIELD_NAMES[7], ParamValue::Int(self.ml_n_estimators as i64)),
            (FIELD_NAMES[8], ParamValue::Bool(self.ml_enabled)),
        ]
    }

    /// Validate against `space`: every field in bounds, fast < slow, lo < hi.
    pub fn validate(&self, space: &SearchSpace) -> Result<(), ConfigError> {
        space.ema_fast.check("ema_fast", self.ema_fast)?;
        space.ema_slow.check("ema_slow", self.ema_slow)?;
        space.rsi_period.check("rsi_period", self.rsi_period)?;
        space.rsi_hi.check("rsi_hi", self.rsi_hi)?;
        space.rsi_lo.check("rsi_lo", self.rsi_lo)?;
        space.atr_sl_mult.check("atr_sl_mult", self.atr_sl_mult)?;
        space.atr_tp_mult.check("atr_tp_mult", self.atr_tp_mult)?;
        space
            .ml_n_estimators
            .check("ml_n_estimators", self.ml_n_estimators)?;
        space.ml_enabled.check("ml_enabled", self.ml_enabled)?;
        if self.ema_fast >= self.ema_slow {
            return Err(ConfigError::Ordering {
                lower: "ema_fast",
                upper: "ema_slow",
            });
        }
        if self.rsi_lo >= self.rsi_hi {
            return Err(ConfigError::Ordering {
                lower: "rsi_lo",
                upper: "rsi_hi",
            });
        }
        Ok(())
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: usize,
    pub max: usize,
}

impl IntRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: usize) -> bool {
        v >= self.min && v <= self.max
    }

    fn check(&self, field: &'static str, v: usize) -> Result<(), ConfigError> {
        if self.contains(v) {
            Ok(())
        } else {
            Err(ConfigError::OutOfBounds {
                field,
                value: v as f64,
                min: self.min as f64,
                max: self.max as f64,
            })
        }
    }

    /// Map a unit-interval gene onto the range, rounding to the nearest integer.
    pub fn decode(&self, gene: f64) -> usize {
        let span = (self.max - self.min) as f64;
        let v = self.min as f64 + gene.clamp(0.0, 1.0) * span;
        (v.round() as usize).clamp(self.min, self.max)
    }

    pub fn encode(&self, v: usize) -> f64 {
        if self.max == self.min {
            return 0.5;
        }
        ((v.saturating_sub(self.min)) as f64 / (self.max - self.min) as f64).clamp(0.0, 1.0)
    }
}

/// Inclusive float range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v.is_finite() && v >= self.min && v <= self.max
    }

    fn check(&self, field: &'static str, v: f64) -> Result<(), ConfigError> {
        if self.contains(v) {
            Ok(())
        } else {
            Err(ConfigError::OutOfBounds {
                field,
                value: v,
                min: self.min,
                max: self.max,
            })
        }
    }

    pub fn decode(&self, gene: f64) -> f64 {
        let v = self.min + gene.clamp(0.0, 1.0) * (self.max - self.min);
        v.clamp(self.min, self.max)
    }

    pub fn encode(&self, v: f64) -> f64 {
        if self.max <= self.min {
            return 0.5;
        }
        ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Domain of the ML toggle: searchable, or pinned to one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagDomain {
    #[default]
    Free,
    Fixed(bool),
}

impl FlagDomain {
    fn check(&self, field: &'static str, v: bool) -> Result<(), ConfigError> {
        match *self {
            Self::Fixed(expected) if expected != v => {
                Err(ConfigError::FixedFlag { field, expected })
            }
            _ => Ok(()),
        }
    }

    pub fn decode(&self, gene: f64) -> bool {
        match *self {
            Self::Free => gene >= 0.5,
            Self::Fixed(v) => v,
        }
    }

    pub fn encode(&self, v: bool) -> f64 {
        if v {
            0.75
        } else {
            0.25
        }
    }
}

/// Declared bounds for every `ParameterSet` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub ema_fast: IntRange,
    pub ema_slow: IntRange,
    pub rsi_period: IntRange,
    pub rsi_hi: FloatRange,
    pub rsi_lo: FloatRange,
    pub atr_sl_mult: FloatRange,
    pub atr_tp_mult: FloatRange,
    pub ml_n_estimators: IntRange,
    pub ml_enabled: FlagDomain,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            ema_fast: IntRange::new(3, 30),
            ema_slow: IntRange::new(8, 100),
            rsi_period: IntRange::new(5, 30),
            rsi_hi: FloatRange::new(55.0, 85.0),
            rsi_lo: FloatRange::new(15.0, 45.0),
            atr_sl_mult: FloatRange::new(0.5, 4.0),
            atr_tp_mult: FloatRange::new(0.5, 6.0),
            ml_n_estimators: IntRange::new(5, 100),
            ml_enabled: FlagDomain::Free,
        }
    }
}

impl SearchSpace {
    /// Check that at least one valid `ParameterSet` exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let int_ranges = [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("rsi_period", self.rsi_period),
            ("ml_n_estimators", self.ml_n_estimators),
        ];
        for (key, r) in int_ranges {
            if r.min > r.max || r.min == 0 {
                return Err(ConfigError::invalid(
                    key,
                    format!("empty or zero-based range [{}, {}]", r.min, r.max),
                ));
            }
        }
        let float_ranges = [
            ("rsi_hi", self.rsi_hi),
            ("rsi_lo", self.rsi_lo),
            ("atr_sl_mult", self.atr_sl_mult),
            ("atr_tp_mult", self.atr_tp_mult),
        ];
        for (key, r) in float_ranges {
            if !(r.min.is_finite() && r.max.is_finite()) || r.min > r.max {
                return Err(ConfigError::invalid(
                    key,
                    format!("empty range [{}, {}]", r.min, r.max),
                ));
            }
        }
        if self.atr_sl_mult.min <= 0.0 || self.atr_tp_mult.min <= 0.0 {
            return Err(ConfigError::invalid(
                "atr multipliers",
                "lower bounds must be positive",
            ));
        }
        if self.ema_fast.min >= self.ema_slow.max {
            return Err(ConfigError::Ordering {
                lower: "ema_fast",
                upper: "ema_slow",
            });
        }
        if self.rsi_lo.max >= self.rsi_hi.min {
            return Err(ConfigError::Ordering {
                lower: "rsi_lo",
                upper: "rsi_hi",
            });
        }
        Ok(())
    }

    /// Decode a unit-cube genome into a valid `ParameterSet`.
    ///
    /// Requires a space that passed `validate`. A decoded `ema_slow` that does
    /// not exceed `ema_fast` is lifted above it, and `ema_fast` is lowered when
    /// the slow range is exhausted.
    pub fn decode(&self, genome: &[f64; DIMENSIONS]) -> ParameterSet {
        let mut ema_fast = self.ema_fast.decode(genome[0]);
        let mut ema_slow = self.ema_slow.decode(genome[1]);
        if ema_slow <= ema_fast {
            ema_slow = (ema_fast + 1).min(self.ema_slow.max);
            if ema_slow <= ema_fast {
                ema_fast = ema_slow.saturating_sub(1).max(self.ema_fast.min);
            }
        }
        ParameterSet {
            ema_fast,
            ema_slow,
            rsi_period: self.rsi_period.decode(genome[2]),
            rsi_hi: self.rsi_hi.decode(genome[3]),
            rsi_lo: self.rsi_lo.decode(genome[4]),
            atr_sl_mult: self.atr_sl_mult.decode(genome[5]),
            atr_tp_mult: self.atr_tp_mult.decode(genome[6]),
            ml_n_estimators: self.ml_n_estimators.decode(genome[7]),
            ml_enabled: self.ml_enabled.decode(genome[8]),
        }
    }

    /// Inverse of `decode` up to rounding.
    pub fn encode(&self, params: &ParameterSet) -> [f64; DIMENSIONS] {
        [
            self.ema_fast.encode(params.ema_fast),
            self.ema_slow.encode(params.ema_slow),
            self.rsi_period.encode(params.rsi_period),
            self.rsi_hi.encode(params.rsi_hi),
            self.rsi_lo.encode(params.rsi_lo),
            self.atr_sl_mult.encode(params.atr_sl_mult),
            self.atr_tp_mult.encode(params.atr_tp_mult),
            self.ml_n_estimators.encode(params.ml_n_estimators),
            self.ml_enabled.encode(params.ml_enabled),
        ]
    }
}
