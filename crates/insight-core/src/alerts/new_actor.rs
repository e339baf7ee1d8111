use std::collections::BTreeSet;

use tracing::debug;

use crate::aggregate::Tally;
use crate::error::Result;

use super::{Alert, AlertDetector, AlertKind, AlertLocation, DetectionContext, Severity};

/// Actors active in the trailing window that never appear before the
/// buffer window.
///
/// The buffer-window set is collected and logged, but an actor seen only
/// in the buffer still counts as new.
pub struct NewActorDetector;

impl AlertDetector for NewActorDetector {
    fn name(&self) -> &str {
        "new_actor"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>> {
        let config = ctx.config;

        let mut recent: BTreeSet<&str> = BTreeSet::new();
        let mut buffer: BTreeSet<&str> = BTreeSet::new();
        let mut historical: BTreeSet<&str> = BTreeSet::new();
        for event in ctx.events {
            let bucket = if event.date >= ctx.recent_cutoff {
                &mut recent
            } else if event.date >= ctx.older_cutoff {
                &mut buffer
            } else {
                &mut historical
            };
            bucket.extend(event.actors());
        }
        debug!(
            recent = recent.len(),
            buffer = buffer.len(),
            historical = historical.len(),
            "Collected actor windows"
        );

        let mut alerts = Vec::new();
        for actor in recent.difference(&historical) {
            if actor.chars().count() <= config.new_actor_max_noise_len {
                continue;
            }
            let Some(group) = ctx.aggregates.by_actor.get(*actor) else {
                continue;
            };
            if group.count < config.new_actor_min_events {
                continue;
            }

            let mut countries = Tally::new();
            let mut event_types = Tally::new();
            for event in group.events(ctx.events) {
                countries.add(&event.country);
                event_types.add(&event.event_type);
            }
            let countries: Vec<String> = countries.top(2).into_iter().map(|e| e.name).collect();
            let event_types: Vec<String> = event_types.top(2).into_iter().map(|e| e.name).collect();

            alerts.push(Alert {
                kind: AlertKind::NewActor,
                severity: Severity::high_if(group.fatalities > config.new_actor_high_fatalities),
                description: format!(
                    "Emergence of new conflict actor: {} in {}. Associated with {} events and {} fatalities.",
                    actor,
                    countries.join(", "),
                    event_types.join(", "),
                    group.fatalities
                ),
                location: AlertLocation::countries(countries),
            });
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::test_support::{day, run};
    use crate::event::Event;

    fn background() -> Vec<Event> {
        vec![
            Event::new("h1", day(2024, 11, 1), "Sudan", "Khartoum", "Battles", "Sudan Armed Forces", 1)
                .with_actor2("Rapid Support Forces"),
            Event::new("r1", day(2025, 4, 25), "Sudan", "Khartoum", "Battles", "Sudan Armed Forces", 1)
                .with_actor2("Rapid Support Forces"),
        ]
    }

    #[test]
    fn test_new_actor_fires_with_context() {
        let mut events = background();
        events.push(Event::new("n1", day(2025, 4, 20), "Sudan", "Kassala", "Battles", "Beja Militia", 10));
        events.push(Event::new("n2", day(2025, 4, 22), "Eritrea", "Teseney", "Riots", "Beja Militia", 8));
        events.push(
            Event::new("n3", day(2025, 4, 26), "Sudan", "Kassala", "Battles", "Sudan Armed Forces", 5)
                .with_actor2("Beja Militia"),
        );

        let alerts = run(&NewActorDetector, events);
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.kind, AlertKind::NewActor);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.location.countries, vec!["Sudan", "Eritrea"]);
        assert_eq!(
            alert.description,
            "Emergence of new conflict actor: Beja Militia in Sudan, Eritrea. Associated with Battles, Riots events and 23 fatalities."
        );
    }

    #[test]
    fn test_short_names_and_rare_actors_are_ignored() {
        let mut events = background();
        for i in 0..3u32 {
            events.push(Event::new(format!("u{i}"), day(2025, 4, 20 + i), "Sudan", "Kassala", "Riots", "UNK", 0));
        }
        events.push(Event::new("x", day(2025, 4, 21), "Sudan", "Kassala", "Riots", "Lone Wolves", 0));
        assert!(run(&NewActorDetector, events).is_empty());
    }

    #[test]
    fn test_actor_seen_only_in_buffer_still_counts_as_new() {
        let mut events = background();
        // 2025-02-10 sits between the buffer start (2025-01-25) and the window start (2025-03-26)
        events.push(Event::new("b1", day(2025, 2, 10), "Sudan", "Kassala", "Battles", "Beja Militia", 1));
        events.push(Event::new("n1", day(2025, 4, 20), "Sudan", "Kassala", "Battles", "Beja Militia", 1));
        events.push(Event::new("n2", day(2025, 4, 21), "Sudan", "Kassala", "Battles", "Beja Militia", 1));

        let alerts = run(&NewActorDetector, events);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }
}
