//! Country, event-type and actor profiles built from the aggregates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{Aggregates, GroupStats, Tally, TallyEntry};
use crate::config::{ProfileConfig, TrendConfig};
use crate::event::{Event, EventSet};
use crate::trend::{self, Trend, TrendEstimate, round2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopActors {
    pub actor1: Vec<TallyEntry>,
    pub actor2: Vec<TallyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
    pub fatalities: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub events: u64,
    pub fatalities: u64,
    pub fatality_rate: f64,
    /// Full event-type histogram, most frequent first
    pub event_types: Vec<TallyEntry>,
    pub top_actors: TopActors,
    pub top_locations: Vec<LocationCount>,
    pub trend: Trend,
    pub trend_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeSummary {
    pub count: u64,
    pub fatalities: u64,
    pub fatality_rate: f64,
    pub trend: Trend,
    pub trend_factor: f64,
    pub top_countries: Vec<TallyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub events: u64,
    pub fatalities: u64,
    pub fatality_rate: f64,
    pub countries: Vec<TallyEntry>,
    pub event_types: Vec<TallyEntry>,
    pub trend: Trend,
    pub trend_factor: f64,
    /// Frequency of the opposing actor slot
    pub interactions: Vec<TallyEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorSlot {
    First,
    Second,
}

impl ActorSlot {
    fn opposing<'a>(&self, event: &'a Event) -> Option<&'a str> {
        match self {
            ActorSlot::First => event.actor2.as_deref(),
            ActorSlot::Second => Some(event.actor1.as_str()),
        }
        .filter(|a| !a.is_empty())
    }
}

fn group_trend(group: &GroupStats, events: &EventSet, config: &TrendConfig) -> TrendEstimate {
    trend::estimate(&group.dates(events), config)
}

pub fn country_profiles(
    events: &EventSet,
    agg: &Aggregates,
    profiles: &ProfileConfig,
    trend_config: &TrendConfig,
) -> BTreeMap<String, CountryProfile> {
    let mut out = BTreeMap::new();

    for (country, group) in &agg.by_country {
        let mut event_types = Tally::new();
        let mut actor1 = Tally::new();
        let mut actor2 = Tally::new();
        for event in group.events(events) {
            event_types.add(&event.event_type);
            if !event.actor1.is_empty() {
                actor1.add(&event.actor1);
            }
            if let Some(a) = event.actor2.as_deref().filter(|a| !a.is_empty()) {
                actor2.add(a);
            }
        }

        let mut locations: Vec<LocationCount> = agg
            .by_location
            .iter()
            .filter(|(key, _)| &key.country == country)
            .map(|(key, stats)| LocationCount {
                location: key.location.clone(),
                count: stats.stats.count,
                fatalities: stats.stats.fatalities,
            })
            .collect();
        locations.sort_by(|a, b| b.count.cmp(&a.count));
        locations.truncate(profiles.top_n);

        let estimate = group_trend(group, events, trend_config);

        out.insert(
            country.clone(),
            CountryProfile {
                events: group.count,
                fatalities: group.fatalities,
                fatality_rate: round2(group.fatality_rate()),
                event_types: event_types.ranked(),
                top_actors: TopActors {
                    actor1: actor1.top(profiles.top_n),
                    actor2: actor2.top(profiles.top_n),
                },
                top_locations: locations,
                trend: estimate.trend,
                trend_factor: round2(estimate.factor),
            },
        );
    }

    info!(countries = out.len(), "Extracted country profiles");
    out
}

pub fn event_type_summary(
    events: &EventSet,
    agg: &Aggregates,
    profiles: &ProfileConfig,
    trend_config: &TrendConfig,
) -> BTreeMap<String, EventTypeSummary> {
    let mut out = BTreeMap::new();

    for (event_type, group) in &agg.by_event_type {
        let countries: Tally = group.events(events).map(|e| e.country.as_str()).collect();
        let estimate = group_trend(group, events, trend_config);

        out.insert(
            event_type.clone(),
            EventTypeSummary {
                count: group.count,
                fatalities: group.fatalities,
                fatality_rate: round2(group.fatality_rate()),
                trend: estimate.trend,
                trend_factor: round2(estimate.factor),
                top_countries: countries.top(profiles.top_n),
            },
        );
    }

    info!(event_types = out.len(), "Extracted event type summaries");
    out
}

/// Profiles for the most frequent actors of each slot that clear the
/// minimum event count. An actor is profiled once, from the first slot
/// that selects it.
pub fn actor_profiles(
    events: &EventSet,
    agg: &Aggregates,
    profiles: &ProfileConfig,
    trend_config: &TrendConfig,
) -> BTreeMap<String, ActorProfile> {
    let mut out = BTreeMap::new();

    let slots = [
        (ActorSlot::First, &agg.actor1_frequency),
        (ActorSlot::Second, &agg.actor2_frequency),
    ];

    for (slot, frequency) in slots {
        for candidate in frequency.top(profiles.actor_candidates_per_slot) {
            let name = candidate.name;
            if name.is_empty() || out.contains_key(&name) {
                continue;
            }
            let Some(group) = agg.by_actor.get(&name) else {
                continue;
            };
            if group.count < profiles.actor_min_events {
                continue;
            }

            let mut countries = Tally::new();
            let mut event_types = Tally::new();
            let mut interactions = Tally::new();
            for event in group.events(events) {
                countries.add(&event.country);
                event_types.add(&event.event_type);
                if let Some(partner) = slot.opposing(event) {
                    interactions.add(partner);
                }
            }

            let estimate = group_trend(group, events, trend_config);

            out.insert(
                name,
                ActorProfile {
                    events: group.count,
                    fatalities: group.fatalities,
                    fatality_rate: round2(group.fatality_rate()),
                    countries: countries.top(profiles.top_n),
                    event_types: event_types.top(profiles.top_n),
                    trend: estimate.trend,
                    trend_factor: round2(estimate.factor),
                    interactions: interactions.top(profiles.top_n),
                },
            );
        }
    }

    info!(actors = out.len(), "Extracted actor profiles");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn build(events: Vec<Event>) -> (EventSet, Aggregates) {
        let set: EventSet = events.into_iter().collect();
        let agg = Aggregates::build(&set);
        (set, agg)
    }

    #[test]
    fn test_country_profile_fields() {
        let (set, agg) = build(vec![
            Event::new("1", day(1), "Syria", "Sayda", "Violence against civilians", "Army", 15),
            Event::new("2", day(3), "Syria", "Damascus", "Strategic developments", "Gov", 0),
            Event::new("3", day(4), "Syria", "Sayda", "Violence against civilians", "Army", 5)
                .with_actor2("Civilians"),
        ]);
        let profiles =
            country_profiles(&set, &agg, &ProfileConfig::default(), &TrendConfig::default());
        let syria = &profiles["Syria"];

        assert_eq!(syria.events, 3);
        assert_eq!(syria.fatalities, 20);
        assert_eq!(syria.fatality_rate, 6.67);
        assert_eq!(syria.event_types.len(), 2);
        assert_eq!(syria.event_types[0].name, "Violence against civilians");
        assert_eq!(syria.top_actors.actor1[0].name, "Army");
        assert_eq!(syria.top_actors.actor2.len(), 1);
        assert_eq!(syria.top_locations[0].location, "Sayda");
        assert_eq!(syria.top_locations[0].fatalities, 20);
    }

    #[test]
    fn test_country_with_zero_span_is_stable() {
        let events = (0..10)
            .map(|i| Event::new(format!("e{i}"), day(7), "Mali", "Gao", "Battles", "JNIM", 1))
            .collect();
        let (set, agg) = build(events);
        let profiles =
            country_profiles(&set, &agg, &ProfileConfig::default(), &TrendConfig::default());
        assert_eq!(profiles["Mali"].trend, Trend::Stable);
        assert_eq!(profiles["Mali"].trend_factor, 0.0);
    }

    #[test]
    fn test_event_type_summary() {
        let (set, agg) = build(vec![
            Event::new("1", day(1), "Syria", "Sayda", "Battles", "A", 3),
            Event::new("2", day(2), "Ukraine", "Donetsk", "Battles", "B", 8),
            Event::new("3", day(2), "Ukraine", "Donetsk", "Battles", "B", 0),
        ]);
        let summary =
            event_type_summary(&set, &agg, &ProfileConfig::default(), &TrendConfig::default());
        let battles = &summary["Battles"];
        assert_eq!(battles.count, 3);
        assert_eq!(battles.fatalities, 11);
        assert_eq!(battles.fatality_rate, 3.67);
        assert_eq!(battles.top_countries[0].name, "Ukraine");
        assert_eq!(battles.trend, Trend::Increasing);
    }

    #[test]
    fn test_actor_profiles_require_minimum_events() {
        let mut events: Vec<Event> = (0..5)
            .map(|i| {
                Event::new(format!("a{i}"), day(1 + i), "Sudan", "Khartoum", "Battles", "RSF", 2)
                    .with_actor2("SAF")
            })
            .collect();
        events.push(Event::new("x", day(9), "Sudan", "Omdurman", "Riots", "Rioters", 0));
        let (set, agg) = build(events);

        let profiles =
            actor_profiles(&set, &agg, &ProfileConfig::default(), &TrendConfig::default());
        assert!(profiles.contains_key("RSF"));
        assert!(profiles.contains_key("SAF"));
        assert!(!profiles.contains_key("Rioters"));

        let rsf = &profiles["RSF"];
        assert_eq!(rsf.events, 5);
        assert_eq!(rsf.fatalities, 10);
        assert_eq!(rsf.interactions[0].name, "SAF");
        assert_eq!(profiles["SAF"].interactions[0].name, "RSF");
    }

    #[test]
    fn test_empty_inputs_give_empty_maps() {
        let (set, agg) = build(Vec::new());
        let p = ProfileConfig::default();
        let t = TrendConfig::default();
        assert!(country_profiles(&set, &agg, &p, &t).is_empty());
        assert!(event_type_summary(&set, &agg, &p, &t).is_empty());
        assert!(actor_profiles(&set, &agg, &p, &t).is_empty());
    }
}
