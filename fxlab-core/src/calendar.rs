//! Economic calendar blackout windows.
//!
//! Only high-impact events in a currency the pair is exposed to are kept.
//! Event times are sorted once at construction; each lookup is a binary search.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub timestamp: DateTime<Utc>,
    pub currency: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Default)]
pub struct NewsCalendar {
    times: Vec<DateTime<Utc>>,
}

impl NewsCalendar {
    pub fn new(events: &[EconomicEvent], instrument: &Instrument) -> Self {
        let mut times: Vec<DateTime<Utc>> = events
            .iter()
            .filter(|e| e.impact == Impact::High && instrument.is_exposed_to(&e.currency))
            .map(|e| e.timestamp)
            .collect();
        times.sort_unstable();
        times.dedup();
        Self { times }
    }

    /// Number of relevant high-impact events.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether `ts` lies within `window` (inclusive) of any relevant event.
    pub fn is_blackout(&self, ts: DateTime<Utc>, window: Duration) -> bool {
        let from = ts - window;
        let idx = self.times.partition_point(|&t| t < from);
        self.times.get(idx).is_some_and(|&t| t <= ts + window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, h, m, 0).unwrap()
    }

    fn event(ts: DateTime<Utc>, currency: &str, impact: Impact) -> EconomicEvent {
        EconomicEvent {
            timestamp: ts,
            currency: currency.into(),
            impact,
        }
    }

    fn calendar() -> NewsCalendar {
        NewsCalendar::new(
            &[
                event(at(13, 30), "USD", Impact::High),
                event(at(9, 0), "EUR", Impact::Medium),
                event(at(1, 30), "JPY", Impact::High),
            ],
            &Instrument::default(),
        )
    }

    #[test]
    fn keeps_only_relevant_high_impact() {
        assert_eq!(calendar().len(), 1);
    }

    #[test]
    fn window_is_inclusive_on_both_sides() {
        let cal = calendar();
        let w = Duration::minutes(10);
        assert!(cal.is_blackout(at(13, 20), w));
        assert!(cal.is_blackout(at(13, 30), w));
        assert!(cal.is_blackout(at(13, 40), w));
        assert!(!cal.is_blackout(at(13, 15), w));
        assert!(!cal.is_blackout(at(13, 45), w));
    }

    #[test]
    fn irrelevant_events_never_block() {
        let cal = calendar();
        let w = Duration::minutes(10);
        assert!(!cal.is_blackout(at(9, 0), w));
        assert!(!cal.is_blackout(at(1, 30), w));
    }

    #[test]
    fn empty_calendar_never_blocks() {
        let cal = NewsCalendar::default();
        assert!(cal.is_empty());
        assert!(!cal.is_blackout(at(13, 30), Duration::minutes(10)));
    }
}
