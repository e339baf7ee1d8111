//! Raw feed loading and record normalization
//!
//! Accepts the JSON shapes the upstream fetcher writes: a bare array of
//! records, an array of `{"event": {...}}` wrappers, or an object with a
//! `data` array. Records that cannot be normalized are counted, not fatal.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{InsightError, Result};
use crate::event::{Event, EventSet};

const FEED_PREFIX: &str = "conflict_";
const FEED_SUFFIX: &str = ".json";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct LoadedFeed {
    pub source: PathBuf,
    pub events: EventSet,
}

/// Load a feed file, or the newest `conflict_*.json` when given a directory.
pub fn load_feed(path: impl AsRef<Path>) -> Result<LoadedFeed> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(InsightError::DataNotFound(path.to_path_buf()));
    }

    let source = if path.is_dir() {
        latest_feed_in(path)?
    } else {
        path.to_path_buf()
    };

    let raw = std::fs::read_to_string(&source).map_err(|e| unreadable(&source, e))?;
    let events = parse_feed(&raw, &source)?;

    if events.skipped() > 0 {
        warn!(
            path = %source.display(),
            skipped = events.skipped(),
            "Skipped malformed records"
        );
    }
    info!(
        path = %source.display(),
        events = events.len(),
        "Loaded conflict feed"
    );

    Ok(LoadedFeed { source, events })
}

/// An existing source that cannot be read counts as no data available.
fn unreadable(path: &Path, error: std::io::Error) -> InsightError {
    warn!(path = %path.display(), error = %error, "Conflict data source is unreadable");
    InsightError::DataNotFound(path.to_path_buf())
}

/// Most recently modified `conflict_*.json` in `dir`.
pub fn latest_feed_in(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| unreadable(dir, e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| unreadable(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(FEED_PREFIX) && name.ends_with(FEED_SUFFIX)) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let candidate = entry.path();

        // Equal mtimes fall back to the lexicographically larger name
        let replace = match &newest {
            None => true,
            Some((t, p)) => modified > *t || (modified == *t && candidate > *p),
        };
        if replace {
            newest = Some((modified, candidate));
        }
    }

    match newest {
        Some((_, path)) => {
            debug!(path = %path.display(), "Selected latest feed file");
            Ok(path)
        }
        None => Err(InsightError::DataNotFound(dir.to_path_buf())),
    }
}

/// Parse a feed document. Only a document that is not JSON at all is an error.
pub fn parse_feed(raw: &str, source: &Path) -> Result<EventSet> {
    let document: Value = serde_json::from_str(raw).map_err(|e| InsightError::MalformedFeed {
        path: source.to_path_buf(),
        source: e,
    })?;

    let records = match document {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(InsightError::MalformedFeed {
                    path: source.to_path_buf(),
                    source: <serde_json::Error as serde::de::Error>::custom(
                        "expected an array of records or an object with a `data` array",
                    ),
                });
            }
        },
        _ => {
            return Err(InsightError::MalformedFeed {
                path: source.to_path_buf(),
                source: <serde_json::Error as serde::de::Error>::custom(
                    "feed document must be an array or object",
                ),
            });
        }
    };

    Ok(normalize_records(records))
}

/// Normalize raw records, counting every record that had to be dropped.
pub fn normalize_records(records: Vec<Value>) -> EventSet {
    let mut events = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let record = unwrap_event(record);
        match record.as_object().and_then(|obj| normalize_record(index, obj)) {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }

    EventSet::with_skipped(events, skipped)
}

fn unwrap_event(record: Value) -> Value {
    match record {
        Value::Object(mut obj) if obj.get("event").is_some_and(Value::is_object) => {
            obj.remove("event").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn normalize_record(index: usize, record: &Map<String, Value>) -> Option<Event> {
    let date = ["event_date", "date"]
        .iter()
        .find_map(|k| record.get(*k))
        .and_then(Value::as_str)
        .and_then(parse_date)?;

    let id = text_field(record, &["event_id_cnty", "data_id", "id"])
        .unwrap_or_else(|| index.to_string());

    Some(Event {
        id,
        date,
        country: text_field(record, &["country"]).unwrap_or_else(|| UNKNOWN.to_string()),
        admin1: text_field(record, &["admin1"]),
        location: text_field(record, &["location"]).unwrap_or_else(|| UNKNOWN.to_string()),
        event_type: text_field(record, &["event_type"]).unwrap_or_else(|| UNKNOWN.to_string()),
        actor1: text_field(record, &["actor1"]).unwrap_or_default(),
        actor2: text_field(record, &["actor2"]),
        fatalities: coerce_fatalities(record.get("fatalities")),
        latitude: coerce_coordinate(record.get("latitude")),
        longitude: coerce_coordinate(record.get("longitude")),
        notes: text_field(record, &["notes"]),
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// Numeric or numeric-string fatalities; anything else counts as zero.
pub fn coerce_fatalities(value: Option<&Value>) -> u32 {
    let count = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match count {
        Some(c) if c.is_finite() && c > 0.0 => c.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn coerce_coordinate(value: Option<&Value>) -> Option<f64> {
    let coord = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    coord.filter(|c| c.is_finite())
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
