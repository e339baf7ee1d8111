//! Synthetic conflict-feed generator
//!
//! Produces a seeded, reproducible background of daily conflict events and
//! overlays the deterministic patterns of any injected [`Scenario`].

use chrono::{Days, NaiveDate};
use insight_core::Event;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Poisson};
use serde_json::{Value, json};
use tracing::debug;

use crate::scenario::{
    EMERGING_COUNTRY, EMERGING_LOCATION, NEW_ACTOR, NEW_ACTOR_COUNTRY, SHIFT_COUNTRY,
    SHIFT_EVENT_TYPE, SPIKE_COUNTRY, Scenario,
};

pub const DEFAULT_DAILY_RATE: f64 = 6.0;

/// Background country: (name, [(location, lat, lon)], actors)
struct Region {
    country: &'static str,
    locations: &'static [(&'static str, f64, f64)],
    actors: &'static [&'static str],
}

const REGIONS: &[Region] = &[
    Region {
        country: "Syria",
        locations: &[("Aleppo", 36.20, 37.16), ("Idlib", 35.93, 36.63), ("Deir ez-Zor", 35.33, 40.14)],
        actors: &["Military Forces of Syria", "Hayat Tahrir al-Sham", "Syrian Democratic Forces"],
    },
    Region {
        country: "Sudan",
        locations: &[("Khartoum", 15.50, 32.56), ("El Fasher", 13.63, 25.35), ("Nyala", 12.05, 24.88)],
        actors: &["Rapid Support Forces", "Sudan Armed Forces", "Darfur Joint Protection Force"],
    },
    Region {
        country: "Ukraine",
        locations: &[("Donetsk", 48.02, 37.80), ("Kharkiv", 49.99, 36.23), ("Kherson", 46.64, 32.62)],
        actors: &["Military Forces of Russia", "Military Forces of Ukraine"],
    },
    Region {
        country: "Somalia",
        locations: &[("Mogadishu", 2.05, 45.32), ("Kismayo", -0.36, 42.55), ("Baidoa", 3.12, 43.65)],
        actors: &["Al Shabaab", "Military Forces of Somalia", "Jubaland Security Forces"],
    },
    Region {
        country: "Myanmar",
        locations: &[("Sagaing", 21.88, 95.98), ("Mandalay", 21.97, 96.08), ("Lashio", 22.93, 97.75)],
        actors: &["Military Forces of Myanmar", "People's Defense Force", "Arakan Army"],
    },
];

const EVENT_TYPES: &[(&str, u32)] = &[
    ("Battles", 30),
    ("Explosions/Remote violence", 25),
    ("Violence against civilians", 20),
    ("Protests", 15),
    ("Riots", 7),
    ("Strategic developments", 3),
];

const STRATEGIC_NOTES: &[&str] = &[
    "Ceasefire negotiation reported between the parties.",
    "Troop deployment observed along the main road.",
    "Armed group announced withdrawal from the district headquarters.",
    "Arrest of a local commander reported.",
];

pub struct FeedGenerator {
    rng: StdRng,
    start: NaiveDate,
    days: u32,
    daily_rate: f64,
    fatality_dist: Option<LogNormal<f64>>,
    scenarios: Vec<Scenario>,
    next_id: u64,
}

impl FeedGenerator {
    pub fn new(seed: u64, start: NaiveDate, days: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            start,
            days,
            daily_rate: DEFAULT_DAILY_RATE,
            fatality_dist: LogNormal::new(1.0, 0.7).ok(),
            scenarios: Vec::new(),
            next_id: 0,
        }
    }

    /// Mean background events per day. A non-positive rate disables the background.
    pub fn with_daily_rate(mut self, rate: f64) -> Self {
        self.daily_rate = rate;
        self
    }

    /// Scenarios assume a span of at least 90 days so the trailing window
    /// has history to stand out against.
    pub fn inject(mut self, scenario: Scenario) -> Self {
        if !self.scenarios.contains(&scenario) {
            self.scenarios.push(scenario);
        }
        self
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Last generated day, `None` for a zero-day span
    pub fn end_date(&self) -> Option<NaiveDate> {
        let last = self.days.checked_sub(1)?;
        self.start.checked_add_days(Days::new(last as u64))
    }

    /// Background plus scenario events, ordered by date.
    pub fn generate(&mut self) -> Vec<Event> {
        let Some(end) = self.end_date() else {
            return Vec::new();
        };

        let daily = Poisson::new(self.daily_rate).ok();
        let mut events = Vec::new();
        for offset in 0..self.days {
            let date = self.start + Days::new(offset as u64);
            let count = match &daily {
                Some(p) => p.sample(&mut self.rng) as u64,
                None => 0,
            };
            for _ in 0..count {
                let event = self.background_event(date);
                events.push(event);
            }
        }
        let background = events.len();

        for scenario in self.scenarios.clone() {
            self.inject_scenario(scenario, end, &mut events);
        }
        debug!(
            background,
            injected = events.len() - background,
            "Generated synthetic feed"
        );

        events.sort_by_key(|e| e.date);
        events
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("SIM{:06}", self.next_id)
    }

    fn pick_event_type(&mut self) -> &'static str {
        let total: u32 = EVENT_TYPES.iter().map(|(_, w)| w).sum();
        let mut roll = self.rng.random_range(0..total);
        for (name, weight) in EVENT_TYPES {
            if roll < *weight {
                return *name;
            }
            roll -= weight;
        }
        EVENT_TYPES[0].0
    }

    fn fatalities(&mut self, event_type: &str) -> u32 {
        if matches!(event_type, "Protests" | "Strategic developments") || self.rng.random_bool(0.55) {
            return 0;
        }
        match &self.fatality_dist {
            Some(dist) => (dist.sample(&mut self.rng).round() as u32).max(1),
            None => 1,
        }
    }

    fn background_event(&mut self, date: NaiveDate) -> Event {
        let region = &REGIONS[self.rng.random_range(0..REGIONS.len())];
        let (location, lat, lon) = region.locations[self.rng.random_range(0..region.locations.len())];
        let event_type = self.pick_event_type();
        let actor1 = region.actors[self.rng.random_range(0..region.actors.len())];
        let fatalities = self.fatalities(event_type);
        let id = self.next_id();

        let mut event = Event::new(id, date, region.country, location, event_type, actor1, fatalities)
            .with_coordinates(lat, lon);
        if self.rng.random_bool(0.5) {
            let actor2 = region.actors[self.rng.random_range(0..region.actors.len())];
            if actor2 != actor1 {
                event = event.with_actor2(actor2);
            } else {
                event = event.with_actor2(format!("Civilians ({})", region.country));
            }
        }
        if event_type == "Strategic developments" {
            let note = STRATEGIC_NOTES[self.rng.random_range(0..STRATEGIC_NOTES.len())];
            event = event.with_notes(note);
        }
        event
    }

    fn inject_scenario(&mut self, scenario: Scenario, end: NaiveDate, events: &mut Vec<Event>) {
        let days_before = |n: u64| end.checked_sub_days(Days::new(n)).unwrap_or(end);

        match scenario {
            Scenario::EmergingHotspot => {
                for i in 0..8u64 {
                    let event_type = if i % 2 == 0 { "Violence against civilians" } else { "Battles" };
                    let id = self.next_id();
                    events.push(
                        Event::new(id, days_before(7 - i), EMERGING_COUNTRY, EMERGING_LOCATION, event_type, "Rapid Support Forces", 3)
                            .with_actor2(format!("Civilians ({EMERGING_COUNTRY})"))
                            .with_coordinates(13.45, 22.45),
                    );
                }
            }
            Scenario::FatalitySpike => {
                // Quiet protest series across the whole span
                for offset in (0..self.days as u64).step_by(6) {
                    let id = self.next_id();
                    events.push(
                        Event::new(id, self.start + Days::new(offset), SPIKE_COUNTRY, "Baghdad", "Protests", "Protesters (Iraq)", 0)
                            .with_coordinates(33.31, 44.36),
                    );
                }
                for i in 0..5u64 {
                    let id = self.next_id();
                    events.push(
                        Event::new(id, days_before(4 - i), SPIKE_COUNTRY, "Mosul", "Explosions/Remote violence", "Islamic State (Iraq)", 40)
                            .with_actor2(format!("Civilians ({SPIKE_COUNTRY})"))
                            .with_coordinates(36.34, 43.13),
                    );
                }
            }
            Scenario::NewActor => {
                let region = REGIONS.iter().find(|r| r.country == NEW_ACTOR_COUNTRY);
                let (location, lat, lon) = region.map(|r| r.locations[0]).unwrap_or(("Sagaing", 21.88, 95.98));
                for i in 0..6u64 {
                    let id = self.next_id();
                    events.push(
                        Event::new(id, days_before(5 - i), NEW_ACTOR_COUNTRY, location, "Battles", NEW_ACTOR, 5)
                            .with_actor2("Military Forces of Myanmar")
                            .with_coordinates(lat, lon),
                    );
                }
            }
            Scenario::DynamicShift => {
                // Protest-dominated history, one clash in five
                for (n, offset) in (0..self.days as u64).step_by(4).enumerate() {
                    let (event_type, actor) = if n % 5 == 4 {
                        (SHIFT_EVENT_TYPE, "Fano Militia")
                    } else {
                        ("Protests", "Protesters (Ethiopia)")
                    };
                    let id = self.next_id();
                    events.push(
                        Event::new(id, self.start + Days::new(offset), SHIFT_COUNTRY, "Gondar", event_type, actor, 0)
                            .with_coordinates(12.60, 37.47),
                    );
                }
                for i in 0..12u64 {
                    let id = self.next_id();
                    events.push(
                        Event::new(id, days_before(i % 10), SHIFT_COUNTRY, "Bahir Dar", SHIFT_EVENT_TYPE, "Fano Militia", 2)
                            .with_actor2("Military Forces of Ethiopia")
                            .with_coordinates(11.59, 37.39),
                    );
                }
            }
        }
    }
}

/// Raw record in the shape the loader accepts
pub fn raw_record(event: &Event) -> Value {
    let mut record = json!({
        "event_id_cnty": event.id,
        "event_date": event.date.format("%Y-%m-%d").to_string(),
        "country": event.country,
        "location": event.location,
        "event_type": event.event_type,
        "actor1": event.actor1,
        "actor2": event.actor2.clone().unwrap_or_default(),
        "fatalities": event.fatalities,
        "latitude": event.latitude,
        "longitude": event.longitude,
    });
    if let (Some(notes), Some(obj)) = (&event.notes, record.as_object_mut()) {
        obj.insert("notes".to_string(), Value::String(notes.clone()));
    }
    record
}

/// `{"data": [...]}` feed document
pub fn raw_feed(events: &[Event]) -> Value {
    json!({ "data": events.iter().map(raw_record).collect::<Vec<_>>() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_same_seed_same_feed() {
        let a = FeedGenerator::new(7, start(), 60).generate();
        let b = FeedGenerator::new(7, start(), 60).generate();
        assert_eq!(a, b);
        assert!(!a.is_empty());

        let c = FeedGenerator::new(8, start(), 60).generate();
        assert_ne!(a, c);
    }

    #[test]
    fn test_events_stay_in_span_and_sorted() {
        let mut generator = FeedGenerator::new(1, start(), 30).inject(Scenario::EmergingHotspot);
        let end = generator.end_date().unwrap();
        let events = generator.generate();
        assert!(events.iter().all(|e| e.date >= start() && e.date <= end));
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(events.last().map(|e| e.date), Some(end));
    }

    #[test]
    fn test_zero_days_and_zero_rate() {
        assert!(FeedGenerator::new(1, start(), 0).generate().is_empty());
        let events = FeedGenerator::new(1, start(), 30)
            .with_daily_rate(0.0)
            .inject(Scenario::NewActor)
            .generate();
        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|e| e.actor1 == NEW_ACTOR));
    }

    #[test]
    fn test_raw_record_shape() {
        let event = Event::new("SIM000001", start(), "Syria", "Aleppo", "Battles", "A", 2).with_notes("Troop deployment");
        let record = raw_record(&event);
        assert_eq!(record["event_date"], "2025-01-01");
        assert_eq!(record["actor2"], "");
        assert_eq!(record["notes"], "Troop deployment");
        assert!(record["latitude"].is_null());
    }
}
