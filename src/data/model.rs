use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Induced – tri-state flag from the feed
// ---------------------------------------------------------------------------

/// Whether an event was induced by human activity. The feed may omit the
/// flag entirely, so this is not a plain `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Induced {
    Yes,
    No,
    #[default]
    Unknown,
}

impl Induced {
    /// Interpret a raw feed cell: blank or non-numeric → `Unknown`,
    /// zero → `No`, any other number → `Yes`.
    pub fn from_field(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Induced::Unknown;
        }
        match raw.parse::<f64>() {
            Ok(v) => Self::from_number(Some(v)),
            Err(_) => Induced::Unknown,
        }
    }

    pub fn from_number(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_nan() => Induced::Unknown,
            Some(v) if v == 0.0 => Induced::No,
            Some(_) => Induced::Yes,
            None => Induced::Unknown,
        }
    }

    /// Numeric form used when writing the feed back out (blank for unknown).
    pub fn as_field(&self) -> &'static str {
        match self {
            Induced::Yes => "1",
            Induced::No => "0",
            Induced::Unknown => "",
        }
    }
}

impl fmt::Display for Induced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Induced::Yes => write!(f, "Yes"),
            Induced::No => write!(f, "No"),
            Induced::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse a feed timestamp into a UTC instant. Values without an offset are
/// taken as UTC; a bare date is midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// EventRecord – one admitted row of the feed
// ---------------------------------------------------------------------------

/// A single seismic event. Immutable once admitted to a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Depth in km.
    pub depth: f64,
    pub magnitude: f64,
    pub induced: Induced,
    /// Free text with quote characters stripped.
    pub location: String,
    /// Timestamp exactly as it appeared in the source.
    pub timestamp: String,
    /// `timestamp` parsed to an instant, if it parses.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Admit a row. Fails unless latitude, longitude, depth and magnitude are
    /// all finite; the timestamp is allowed not to parse.
    pub fn try_new(
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        induced: Induced,
        location: &str,
        timestamp: &str,
    ) -> Result<Self, RejectReason> {
        let numeric = [
            ("latitude", latitude),
            ("longitude", longitude),
            ("depth", depth),
            ("magnitude", magnitude),
        ];
        if let Some(&(field, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RejectReason::NonFinite { field });
        }

        let timestamp = timestamp.trim().to_string();
        Ok(EventRecord {
            latitude,
            longitude,
            depth,
            magnitude,
            induced,
            location: clean_location(location),
            occurred_at: parse_timestamp(&timestamp),
            timestamp,
        })
    }

    /// Map position as `[lon, lat]`.
    pub fn position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Collapse runs of whitespace and strip `"` / `'`.
pub fn clean_location(raw: &str) -> String {
    raw.replace(['"', '\''], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Rejections – why a source row did not make it into the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("{field} is missing or not a finite number")]
    NonFinite { field: &'static str },
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A dropped source row. `row` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub row: u64,
    pub reason: RejectReason,
}

// ---------------------------------------------------------------------------
// EventDataset – the complete admitted dataset
// ---------------------------------------------------------------------------

/// All admitted events in source row order (not sorted by time).
#[derive(Debug, Clone, Default)]
pub struct EventDataset {
    pub events: Vec<EventRecord>,
}

impl EventDataset {
    pub fn from_events(events: Vec<EventRecord>) -> Self {
        EventDataset { events }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events whose timestamp did not parse.
    pub fn undated_count(&self) -> usize {
        self.events.iter().filter(|e| e.occurred_at.is_none()).count()
    }
}

/// Parser output: the admitted dataset plus every row that was dropped.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub dataset: EventDataset,
    pub rejected: Vec<RowRejection>,
}

impl ParseReport {
    /// Drop counter for diagnostics.
    pub fn dropped(&self) -> usize {
        self.rejected.len()
    }
}
