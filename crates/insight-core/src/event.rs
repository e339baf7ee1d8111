//! Normalized conflict events
//!
//! Events are produced once by the loader and only read afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated conflict incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub date: NaiveDate,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    /// Sub-national place name
    pub location: String,
    pub event_type: String,
    pub actor1: String,
    pub actor2: Option<String>,
    pub fatalities: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        country: impl Into<String>,
        location: impl Into<String>,
        event_type: impl Into<String>,
        actor1: impl Into<String>,
        fatalities: u32,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            country: country.into(),
            admin1: None,
            location: location.into(),
            event_type: event_type.into(),
            actor1: actor1.into(),
            actor2: None,
            fatalities,
            latitude: None,
            longitude: None,
            notes: None,
        }
    }

    pub fn with_actor2(mut self, actor2: impl Into<String>) -> Self {
        self.actor2 = Some(actor2.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_admin1(mut self, admin1: impl Into<String>) -> Self {
        self.admin1 = Some(admin1.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Non-empty actor names across both slots, deduplicated within the event.
    pub fn actors(&self) -> impl Iterator<Item = &str> {
        let first = Some(self.actor1.as_str()).filter(|a| !a.is_empty());
        let second = self
            .actor2
            .as_deref()
            .filter(|a| !a.is_empty() && Some(*a) != first);
        first.into_iter().chain(second)
    }

    pub fn involves(&self, actor: &str) -> bool {
        self.actor1 == actor || self.actor2.as_deref() == Some(actor)
    }
}

/// Ordered, immutable collection of valid events for one ingestion batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    events: Vec<Event>,
    skipped: usize,
}

impl EventSet {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events, skipped: 0 }
    }

    /// Events plus the number of raw records the loader had to drop.
    pub fn with_skipped(events: Vec<Event>, skipped: usize) -> Self {
        Self { events, skipped }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// (min, max) event date, `None` for an empty set
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.events.iter().map(|e| e.date).min()?;
        let max = self.events.iter().map(|e| e.date).max()?;
        Some((min, max))
    }

    pub fn total_fatalities(&self) -> u64 {
        self.events.iter().map(|e| e.fatalities as u64).sum()
    }
}

impl FromIterator<Event> for EventSet {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_actors_skip_empty_and_duplicates() {
        let event = Event::new("e1", day(1), "Syria", "Sayda", "Battles", "A", 0).with_actor2("A");
        assert_eq!(event.actors().collect::<Vec<_>>(), vec!["A"]);

        let event = Event::new("e2", day(1), "Syria", "Sayda", "Battles", "", 0).with_actor2("B");
        assert_eq!(event.actors().collect::<Vec<_>>(), vec!["B"]);

        let event = Event::new("e3", day(1), "Syria", "Sayda", "Battles", "A", 0).with_actor2("B");
        assert!(event.involves("B"));
        assert!(!event.involves("C"));
    }

    #[test]
    fn test_date_span_and_totals() {
        let set: EventSet = vec![
            Event::new("a", day(3), "Syria", "Sayda", "Battles", "A", 4),
            Event::new("b", day(1), "Syria", "Sayda", "Battles", "A", 6),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.date_span(), Some((day(1), day(3))));
        assert_eq!(set.total_fatalities(), 10);
        assert_eq!(EventSet::default().date_span(), None);
    }

    #[test]
    fn test_event_serializes_dates_as_iso() {
        let event = Event::new("a", day(2), "Syria", "Sayda", "Battles", "A", 1);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["date"], "2025-04-02");
        assert!(json["actor2"].is_null());
        assert!(json.get("notes").is_none());
    }
}
