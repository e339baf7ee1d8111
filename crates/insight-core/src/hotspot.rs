//! Hotspot ranking
//!
//! Significant (country, location) pairs are scored by a blend of event
//! volume and fatalities, each normalized to the maximum among the
//! significant set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{Aggregates, LocationKey, LocationStats, Tally, TallyEntry};
use crate::config::HotspotConfig;
use crate::event::EventSet;
use crate::trend::{self, Activity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub country: String,
    pub location: String,
    pub count: u64,
    pub fatalities: u64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_types: Vec<TallyEntry>,
    pub trend: Activity,
    pub first_event: NaiveDate,
    pub last_event: NaiveDate,
    pub hotspot_score: f64,
}

impl Hotspot {
    pub fn key(&self) -> LocationKey {
        LocationKey::new(&self.country, &self.location)
    }
}

fn is_significant(stats: &LocationStats, config: &HotspotConfig) -> bool {
    stats.stats.count >= config.min_events || stats.stats.fatalities >= config.min_fatalities
}

fn normalized(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        value as f64 / max as f64
    }
}

/// Top hotspots, score descending, ties by (country, location) ascending.
pub fn rank_hotspots(events: &EventSet, agg: &Aggregates, config: &HotspotConfig) -> Vec<Hotspot> {
    let significant: Vec<(&LocationKey, &LocationStats)> = agg
        .by_location
        .iter()
        .filter(|(_, stats)| is_significant(stats, config))
        .collect();

    let max_count = significant.iter().map(|(_, s)| s.stats.count).max().unwrap_or(0);
    let max_fatalities = significant
        .iter()
        .map(|(_, s)| s.stats.fatalities)
        .max()
        .unwrap_or(0);

    let mut scored: Vec<(f64, &LocationKey, &LocationStats)> = significant
        .into_iter()
        .map(|(key, stats)| {
            let score = normalized(stats.stats.count, max_count)
                + normalized(stats.stats.fatalities, max_fatalities);
            (score, key, stats)
        })
        .collect();

    // Stable: equal scores keep BTreeMap key order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(config.max_hotspots);

    let hotspots: Vec<Hotspot> = scored
        .into_iter()
        .map(|(score, key, stats)| {
            let event_types: Tally = stats
                .stats
                .events(events)
                .map(|e| e.event_type.as_str())
                .collect();
            let dates = stats.stats.dates(events);

            Hotspot {
                country: key.country.clone(),
                location: key.location.clone(),
                count: stats.stats.count,
                fatalities: stats.stats.fatalities,
                latitude: stats.latitude,
                longitude: stats.longitude,
                event_types: event_types.top(config.top_event_types),
                trend: trend::classify_activity(&dates, config),
                first_event: stats.first_event,
                last_event: stats.last_event,
                hotspot_score: score,
            }
        })
        .collect();

    info!(hotspots = hotspots.len(), "Identified conflict hotspots");
    hotspots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn ranked(events: Vec<Event>) -> Vec<Hotspot> {
        let set: EventSet = events.into_iter().collect();
        let agg = Aggregates::build(&set);
        rank_hotspots(&set, &agg, &HotspotConfig::default())
    }

    #[test]
    fn test_filter_and_blend() {
        let mut events = Vec::new();
        // Busy but bloodless: 6 events, 0 fatalities
        for i in 0..6u32 {
            events.push(Event::new(format!("b{i}"), day(1 + i), "Kenya", "Nairobi", "Protests", "P", 0));
        }
        // Deadly: 1 event, 30 fatalities
        events.push(Event::new("d", day(2), "Sudan", "Khartoum", "Battles", "S", 30));
        // Neither threshold met
        events.push(Event::new("q", day(3), "Chad", "Abeche", "Riots", "R", 9));

        let hotspots = ranked(events);
        assert_eq!(hotspots.len(), 2);
        assert!(hotspots.iter().all(|h| h.count >= 5 || h.fatalities >= 10));
        // Sudan: 1/6 + 30/30, Kenya: 6/6 + 0/30
        assert_eq!(hotspots[0].country, "Sudan");
        assert_eq!(hotspots[1].country, "Kenya");
        assert!((hotspots[0].hotspot_score - (1.0 + 1.0 / 6.0)).abs() < 1e-12);
        assert!((hotspots[1].hotspot_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_scores_break_ties_by_key() {
        let events = vec![
            Event::new("1", day(1), "Yemen", "Aden", "Battles", "A", 12),
            Event::new("2", day(1), "Libya", "Sirte", "Battles", "A", 12),
        ];
        let hotspots = ranked(events);
        assert_eq!(hotspots[0].country, "Libya");
        assert_eq!(hotspots[1].country, "Yemen");
        assert_eq!(hotspots[0].hotspot_score, hotspots[1].hotspot_score);
    }

    #[test]
    fn test_zero_fatality_denominator_is_guarded() {
        let events: Vec<Event> = (0..5)
            .map(|i| Event::new(format!("e{i}"), day(1 + i), "Kenya", "Nairobi", "Protests", "P", 0))
            .collect();
        let hotspots = ranked(events);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].hotspot_score, 1.0);
        assert!(hotspots[0].hotspot_score.is_finite());
    }

    #[test]
    fn test_top_event_types_and_coordinates() {
        let events = vec![
            Event::new("1", day(1), "Syria", "Sayda", "Battles", "A", 4),
            Event::new("2", day(2), "Syria", "Sayda", "Riots", "A", 4).with_coordinates(36.1, 37.4),
            Event::new("3", day(3), "Syria", "Sayda", "Riots", "A", 4),
            Event::new("4", day(3), "Syria", "Sayda", "Protests", "A", 0),
            Event::new("5", day(9), "Syria", "Sayda", "Looting", "A", 0),
        ];
        let hotspot = &ranked(events)[0];
        let names: Vec<&str> = hotspot.event_types.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Riots", "Battles", "Looting"]);
        assert_eq!(hotspot.latitude, Some(36.1));
        assert_eq!(hotspot.first_event, day(1));
        assert_eq!(hotspot.last_event, day(9));
    }

    #[test]
    fn test_caps_at_max_hotspots() {
        let events: Vec<Event> = (0..30)
            .map(|i| Event::new(format!("e{i}"), day(1), "Iraq", format!("Town{i:02}"), "Battles", "A", 10 + i))
            .collect();
        let hotspots = ranked(events);
        assert_eq!(hotspots.len(), 20);
        assert!(hotspots.windows(2).all(|w| w[0].hotspot_score >= w[1].hotspot_score));
        assert_eq!(hotspots[0].location, "Town29");
    }
}
