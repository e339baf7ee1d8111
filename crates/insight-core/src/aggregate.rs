//! Single-pass grouping of events by country, location, event type and actor
//!
//! Every group keeps the indices of its member events so later stages
//! (trend, hotspot, detectors) can revisit the sub-collection without
//! rescanning the whole set.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventSet};

/// One row of a ranked frequency list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub name: String,
    pub count: u64,
}

/// Frequency counter with a deterministic ranking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
        } else {
            self.counts.insert(key.to_string(), 1);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All keys, count descending, ties by name ascending.
    pub fn ranked(&self) -> Vec<TallyEntry> {
        let mut entries: Vec<TallyEntry> = self
            .counts
            .iter()
            .map(|(name, &count)| TallyEntry {
                name: name.clone(),
                count,
            })
            .collect();
        // BTreeMap order already gives name ascending; stable sort keeps it for ties
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    pub fn top(&self, n: usize) -> Vec<TallyEntry> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Share of the total held by `key`, 0 for an empty tally.
    pub fn share(&self, key: &str) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(key) as f64 / total as f64
    }
}

impl<'a> FromIterator<&'a str> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

/// Count, fatality sum and member indices of one group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    pub count: u64,
    pub fatalities: u64,
    /// Indices into the source `EventSet`, ascending
    pub members: Vec<usize>,
}

impl GroupStats {
    fn record(&mut self, index: usize, event: &Event) {
        self.count += 1;
        self.fatalities += event.fatalities as u64;
        self.members.push(index);
    }

    pub fn fatality_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.fatalities as f64 / self.count as f64
        }
    }

    pub fn events<'a>(&'a self, set: &'a EventSet) -> impl Iterator<Item = &'a Event> + 'a {
        self.members.iter().filter_map(move |&i| set.get(i))
    }

    pub fn dates(&self, set: &EventSet) -> Vec<NaiveDate> {
        self.events(set).map(|e| e.date).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationKey {
    pub country: String,
    pub location: String,
}

impl LocationKey {
    pub fn new(country: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            location: location.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationStats {
    pub stats: GroupStats,
    /// First non-null latitude seen at this location
    pub latitude: Option<f64>,
    /// First non-null longitude seen at this location
    pub longitude: Option<f64>,
    pub first_event: NaiveDate,
    pub last_event: NaiveDate,
}

impl LocationStats {
    fn new(date: NaiveDate) -> Self {
        Self {
            stats: GroupStats::default(),
            latitude: None,
            longitude: None,
            first_event: date,
            last_event: date,
        }
    }

    fn record(&mut self, index: usize, event: &Event) {
        self.stats.record(index, event);
        if self.latitude.is_none() {
            self.latitude = event.latitude;
        }
        if self.longitude.is_none() {
            self.longitude = event.longitude;
        }
        self.first_event = self.first_event.min(event.date);
        self.last_event = self.last_event.max(event.date);
    }
}

/// All grouped counts for one event set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub by_country: BTreeMap<String, GroupStats>,
    pub by_location: BTreeMap<LocationKey, LocationStats>,
    pub by_event_type: BTreeMap<String, GroupStats>,
    /// Keyed by actor name; an event counts once even if the actor fills both slots
    pub by_actor: BTreeMap<String, GroupStats>,
    pub actor1_frequency: Tally,
    pub actor2_frequency: Tally,
    pub total_events: u64,
    pub total_fatalities: u64,
}

impl Aggregates {
    pub fn build(events: &EventSet) -> Self {
        let mut agg = Aggregates::default();

        for (index, event) in events.iter().enumerate() {
            agg.total_events += 1;
            agg.total_fatalities += event.fatalities as u64;

            agg.by_country
                .entry(event.country.clone())
                .or_default()
                .record(index, event);

            agg.by_location
                .entry(LocationKey::new(&event.country, &event.location))
                .or_insert_with(|| LocationStats::new(event.date))
                .record(index, event);

            agg.by_event_type
                .entry(event.event_type.clone())
                .or_default()
                .record(index, event);

            for actor in event.actors() {
                agg.by_actor
                    .entry(actor.to_string())
                    .or_default()
                    .record(index, event);
            }

            if !event.actor1.is_empty() {
                agg.actor1_frequency.add(&event.actor1);
            }
            if let Some(actor2) = event.actor2.as_deref().filter(|a| !a.is_empty()) {
                agg.actor2_frequency.add(actor2);
            }
        }

        agg
    }

    pub fn countries(&self) -> Vec<String> {
        self.by_country.keys().cloned().collect()
    }
}
