//! Export of the winning parameter set and the trial log.
//!
//! The parameter record is flat: one key per search-space field, in genome
//! order, multipliers as plain numbers and `ml_enabled` as a boolean.
//!
//! ```text
//! ema_fast=5
//! ema_slow=21
//! ...
//! ml_enabled=true
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::domain::{ParamValue, ParameterSet, FIELD_NAMES};

use crate::optimizer::SearchTrial;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no feasible trial among {trials} evaluated")]
    NoFeasibleTrial { trials: usize },
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    /// `key=value` lines.
    Kv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "kv" => Ok(Self::Kv),
            other => Err(format!("unknown export format '{other}' (expected json or kv)")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Kv => write!(f, "kv"),
        }
    }
}

// ─── Parameter record ────────────────────────────────────────────────

/// Serializes a `ParameterSet` as a flat map in field order.
pub struct ParamRecord<'a>(pub &'a ParameterSet);

impl Serialize for ParamRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.0.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn kv_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Int(v) => v.to_string(),
        ParamValue::Float(v) => v.to_string(),
        ParamValue::Bool(v) => v.to_string(),
    }
}

/// Render the record in `format`. JSON output is pretty-printed.
pub fn render_params(params: &ParameterSet, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&ParamRecord(params))?),
        ExportFormat::Kv => Ok(params
            .fields()
            .iter()
            .map(|(name, value)| format!("{name}={}\n", kv_value(value)))
            .collect()),
    }
}

/// Write the record to `path`, replacing any existing file.
pub fn write_params(
    params: &ParameterSet,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let mut body = render_params(params, format)?;
    if !body.ends_with('\n') {
        body.push('\n');
    }
    std::fs::write(path, body).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Trial log ───────────────────────────────────────────────────────

/// One CSV row per trial: id, outcome, rewards, headline metrics, then the
/// parameter fields.
pub fn write_trials_csv<W: Write>(trials: &[SearchTrial], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![
        "trial",
        "outcome",
        "reward",
        "train_reward",
        "net_profit_pct",
        "max_drawdown_pct",
        "max_daily_drawdown_pct",
        "trade_count",
        "win_rate_pct",
        "sharpe",
        "trading_days",
    ];
    header.extend(FIELD_NAMES);
    wtr.write_record(&header)?;

    for t in trials {
        let mut row = vec![
            t.id.0.to_string(),
            format!("{:?}", t.outcome),
            t.reward.to_string(),
            t.train_reward.map(|r| r.to_string()).unwrap_or_default(),
        ];
        match &t.metrics {
            Some(m) => row.extend([
                format!("{:.4}", m.net_profit_pct),
                format!("{:.4}", m.max_drawdown_pct),
                format!("{:.4}", m.max_daily_drawdown_pct),
                m.trade_count.to_string(),
                format!("{:.2}", m.win_rate_pct),
                format!("{:.4}", m.sharpe),
                m.trading_days.to_string(),
            ]),
            None => row.extend(std::iter::repeat(String::new()).take(7)),
        }
        row.extend(t.params.fields().iter().map(|(_, v)| kv_value(v)));
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// `write_trials_csv` into a file at `path`.
pub fn write_trials_file(trials: &[SearchTrial], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_trials_csv(trials, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::TrialOutcome;
    use crate::reward::SENTINEL;
    use fxlab_core::domain::{SearchSpace, TrialId};

    fn params() -> ParameterSet {
        ParameterSet {
            ema_fast: 4,
            ema_slow: 21,
            rsi_period: 9,
            rsi_hi: 72.5,
            rsi_lo: 27.5,
            atr_sl_mult: 1.5,
            atr_tp_mult: 3.0,
            ml_n_estimators: 40,
            ml_enabled: true,
        }
    }

    #[test]
    fn json_record_is_flat_and_ordered() {
        let json = render_params(&params(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), FIELD_NAMES.len());
        assert_eq!(obj["ema_fast"], serde_json::json!(4));
        assert_eq!(obj["atr_sl_mult"], serde_json::json!(1.5));
        assert_eq!(obj["ml_enabled"], serde_json::json!(true));

        // keys appear in field order in the text
        let positions: Vec<usize> = FIELD_NAMES
            .iter()
            .map(|name| json.find(&format!("\"{name}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn json_record_parses_back_into_params() {
        let json = render_params(&params(), ExportFormat::Json).unwrap();
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params());
        assert!(back.validate(&SearchSpace::default()).is_ok());
    }

    #[test]
    fn kv_lines() {
        let kv = render_params(&params(), ExportFormat::Kv).unwrap();
        let lines: Vec<&str> = kv.lines().collect();
        assert_eq!(lines.len(), FIELD_NAMES.len());
        assert_eq!(lines[0], "ema_fast=4");
        assert_eq!(lines[3], "rsi_hi=72.5");
        assert_eq!(lines[6], "atr_tp_mult=3");
        assert_eq!(lines[8], "ml_enabled=true");
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("kv".parse::<ExportFormat>().unwrap(), ExportFormat::Kv);
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn write_params_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.kv");
        write_params(&params(), ExportFormat::Kv, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ema_fast=4\n"));
        assert!(text.ends_with("ml_enabled=true\n"));
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("best.json");
        let err = write_params(&params(), ExportFormat::Json, &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn trial_log_has_one_row_per_trial() {
        let trials = vec![
            SearchTrial {
                id: TrialId(0),
                params: params(),
                metrics: None,
                train_reward: None,
                reward: SENTINEL,
                outcome: TrialOutcome::Rejected,
            },
            SearchTrial {
                id: TrialId(1),
                params: params(),
                metrics: None,
                train_reward: Some(4.5),
                reward: 3.25,
                outcome: TrialOutcome::Scored,
            },
        ];
        let mut buf = Vec::new();
        write_trials_csv(&trials, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("trial,outcome,reward,train_reward"));
        assert!(lines[0].ends_with("ml_enabled"));
        assert!(lines[1].starts_with("0,Rejected,-1000,,"));
        assert!(lines[2].starts_with("1,Scored,3.25,4.5,"));
    }
}
