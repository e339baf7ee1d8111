//! Insight snapshot assembly
//!
//! The snapshot is the single output of a run: metadata, every profile
//! collection, hotspots, alerts and a bounded sample of raw events.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Days, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::Aggregates;
use crate::alerts::{self, Alert};
use crate::config::InsightConfig;
use crate::error::{InsightError, Result};
use crate::event::{Event, EventSet};
use crate::hotspot::{self, Hotspot};
use crate::profiles::{self, ActorProfile, CountryProfile, EventTypeSummary};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(with = "timestamp")]
    pub generated_at: NaiveDateTime,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_events: u64,
    pub total_fatalities: u64,
    /// Sorted ascending
    pub countries_covered: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSnapshot {
    pub metadata: Metadata,
    pub country_profiles: BTreeMap<String, CountryProfile>,
    pub event_type_summary: BTreeMap<String, EventTypeSummary>,
    pub actor_profiles: BTreeMap<String, ActorProfile>,
    pub hotspots: Vec<Hotspot>,
    pub strategic_alerts: Vec<Alert>,
    /// Representative sample, not the full event set
    pub events: Vec<Event>,
}

impl InsightSnapshot {
    /// `conflict_insights_<YYYYmmdd_HHMMSS>.json`, stamped with the generation time
    pub fn file_name(&self) -> String {
        format!(
            "conflict_insights_{}.json",
            self.metadata.generated_at.format(FILE_TIMESTAMP_FORMAT)
        )
    }

    /// Write pretty JSON into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| InsightError::io(dir, e))?;

        let path = dir.join(self.file_name());
        let raw = serde_json::to_string_pretty(self).map_err(|e| InsightError::Serialize {
            target: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&path, raw).map_err(|e| InsightError::io(&path, e))?;

        info!(path = %path.display(), "Saved insights");
        Ok(path)
    }
}

pub struct SnapshotBuilder<'a> {
    config: &'a InsightConfig,
    generated_at: Option<NaiveDateTime>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(config: &'a InsightConfig) -> Self {
        Self {
            config,
            generated_at: None,
        }
    }

    /// Pin the generation timestamp instead of reading the clock.
    pub fn generated_at(mut self, ts: NaiveDateTime) -> Self {
        self.generated_at = Some(ts);
        self
    }

    /// Run every analysis stage. Never fails; an empty set gives empty
    /// collections and zeroed totals.
    pub fn build(&self, events: &EventSet) -> InsightSnapshot {
        let config = self.config;
        let agg = Aggregates::build(events);

        let country_profiles =
            profiles::country_profiles(events, &agg, &config.profiles, &config.trend);
        let event_type_summary =
            profiles::event_type_summary(events, &agg, &config.profiles, &config.trend);
        let actor_profiles = profiles::actor_profiles(events, &agg, &config.profiles, &config.trend);
        let hotspots = hotspot::rank_hotspots(events, &agg, &config.hotspots);

        let strategic_alerts =
            match alerts::detect_alerts(events, &agg, &config.alerts, config.parallel_detectors) {
                Ok(found) => found,
                Err(e) => {
                    warn!(error = %e, "Alert detection skipped");
                    Vec::new()
                }
            };

        let sample = sample_events(events, &hotspots, config);
        info!(events = sample.len(), "Extracted sample events");

        let span = events.date_span();
        let metadata = Metadata {
            generated_at: self.generated_at.unwrap_or_else(now),
            period_start: span.map(|(min, _)| min),
            period_end: span.map(|(_, max)| max),
            total_events: agg.total_events,
            total_fatalities: agg.total_fatalities,
            countries_covered: agg.countries(),
        };

        InsightSnapshot {
            metadata,
            country_profiles,
            event_type_summary,
            actor_profiles,
            hotspots,
            strategic_alerts,
            events: sample,
        }
    }
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Most fatal events of the trailing window, then the latest few at each
/// hotspot, deduplicated by id with the first occurrence kept.
pub fn sample_events(events: &EventSet, hotspots: &[Hotspot], config: &InsightConfig) -> Vec<Event> {
    let Some((_, max_date)) = events.date_span() else {
        return Vec::new();
    };
    let cutoff = max_date
        .checked_sub_days(Days::new(config.alerts.window_days))
        .unwrap_or(NaiveDate::MIN);

    let mut fatal: Vec<&Event> = events
        .iter()
        .filter(|e| e.date >= cutoff && e.fatalities > 0)
        .collect();
    fatal.sort_by(|a, b| b.fatalities.cmp(&a.fatalities).then_with(|| a.id.cmp(&b.id)));
    fatal.truncate(config.sample.max_recent_fatal);

    let mut selected = fatal;
    for hotspot in hotspots {
        let mut at_location: Vec<&Event> = events
            .iter()
            .filter(|e| e.country == hotspot.country && e.location == hotspot.location)
            .collect();
        at_location.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        selected.extend(at_location.into_iter().take(config.sample.per_hotspot));
    }

    let mut seen = HashSet::new();
    selected
        .into_iter()
        .filter(|e| seen.insert(e.id.as_str()))
        .cloned()
        .collect()
}
