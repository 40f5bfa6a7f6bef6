//! CSV loading for bar history and the economic calendar.
//!
//! Bars: `timestamp,open,high,low,close,volume[,spread]`, one row per bar,
//! strictly increasing timestamps. Calendar: `timestamp,currency,impact`.
//! Timestamps are RFC 3339 or naive `YYYY-MM-DD HH:MM[:SS]` read as UTC.
//!
//! The calendar is read once per run; the resulting `NewsCalendar` is shared
//! read-only by every trial.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use fxlab_core::calendar::{EconomicEvent, Impact, NewsCalendar};
use fxlab_core::domain::{Bar, Instrument, Timeframe};
use fxlab_core::engine::validate_bars;
use fxlab_core::error::DataError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unrecognized timestamp '{value}'")]
    BadTimestamp { line: u64, value: String },
    #[error("line {line}: unrecognized impact '{value}' (expected low, medium or high)")]
    BadImpact { line: u64, value: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Bars plus a content hash identifying the dataset.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    /// BLAKE3 over every bar's fields, hex encoded.
    pub dataset_hash: String,
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    spread: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    timestamp: String,
    currency: String,
    impact: String,
}

// ─── Bars ────────────────────────────────────────────────────────────

pub fn load_bars(path: &Path, timeframe: Timeframe) -> Result<LoadedBars, LoadError> {
    let file = open(path)?;
    let loaded = read_bars(BufReader::new(file), timeframe)?;
    info!(
        path = %path.display(),
        bars = loaded.bars.len(),
        hash = %&loaded.dataset_hash[..12],
        "loaded bars"
    );
    Ok(loaded)
}

/// Parse and validate bars from any CSV source.
pub fn read_bars<R: Read>(reader: R, timeframe: Timeframe) -> Result<LoadedBars, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: BarRecord = record.deserialize(Some(&headers))?;
        bars.push(Bar {
            timestamp: parse_timestamp(&row.timestamp, line)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            timeframe,
            spread: row.spread,
        });
    }
    validate_bars(&bars)?;

    let dataset_hash = dataset_hash(&bars);
    Ok(LoadedBars { bars, dataset_hash })
}

/// Content hash over timestamps and prices, independent of file formatting.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
        hasher.update(&bar.spread.unwrap_or(f64::NAN).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ─── Calendar ────────────────────────────────────────────────────────

/// Load the calendar and keep the high-impact events the pair is exposed to.
pub fn load_calendar(path: &Path, instrument: &Instrument) -> Result<NewsCalendar, LoadError> {
    let file = open(path)?;
    let events = read_events(BufReader::new(file))?;
    let calendar = NewsCalendar::new(&events, instrument);
    info!(
        path = %path.display(),
        events = events.len(),
        relevant = calendar.len(),
        "loaded economic calendar"
    );
    Ok(calendar)
}

pub fn read_events<R: Read>(reader: R) -> Result<Vec<EconomicEvent>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut events = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: EventRecord = record.deserialize(Some(&headers))?;
        events.push(EconomicEvent {
            timestamp: parse_timestamp(&row.timestamp, line)?,
            currency: row.currency.to_ascii_uppercase(),
            impact: parse_impact(&row.impact, line)?,
        });
    }
    Ok(events)
}

// ─── Field parsing ───────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_timestamp(value: &str, line: u64) -> Result<DateTime<Utc>, LoadError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| LoadError::BadTimestamp {
            line,
            value: value.to_string(),
        })
}

fn parse_impact(value: &str, line: u64) -> Result<Impact, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(Impact::Low),
        "medium" => Ok(Impact::Medium),
        "high" => Ok(Impact::High),
        _ => Err(LoadError::BadImpact {
            line,
            value: value.to_string(),
        }),
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
