use std::collections::BTreeMap;

use crate::config::SpikeBaseline;
use crate::error::Result;
use crate::event::Event;

use super::{Alert, AlertDetector, AlertKind, AlertLocation, DetectionContext, Severity};

/// Countries whose trailing-window fatalities exceed a multiple of their
/// historical monthly average
pub struct FatalitySpikeDetector;

struct Baseline {
    events: u64,
    fatalities: u64,
    span_days: i64,
}

impl Baseline {
    fn from_events<'a>(events: impl Iterator<Item = &'a Event>) -> Self {
        let mut baseline = Baseline {
            events: 0,
            fatalities: 0,
            span_days: 0,
        };
        let mut span: Option<(chrono::NaiveDate, chrono::NaiveDate)> = None;
        for event in events {
            baseline.events += 1;
            baseline.fatalities += event.fatalities as u64;
            span = Some(match span {
                None => (event.date, event.date),
                Some((min, max)) => (min.min(event.date), max.max(event.date)),
            });
        }
        if let Some((min, max)) = span {
            baseline.span_days = (max - min).num_days();
        }
        baseline
    }

    /// Fatalities per 30 days over the baseline span
    fn monthly_average(&self) -> f64 {
        let months = self.span_days as f64 / 30.0;
        self.fatalities as f64 / months
    }
}

impl AlertDetector for FatalitySpikeDetector {
    fn name(&self) -> &str {
        "fatality_spike"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>> {
        let config = ctx.config;

        let mut recent_fatalities: BTreeMap<&str, u64> = BTreeMap::new();
        for event in ctx.recent_events() {
            *recent_fatalities.entry(event.country.as_str()).or_default() += event.fatalities as u64;
        }

        let mut alerts = Vec::new();
        for (country, recent) in recent_fatalities {
            let Some(group) = ctx.aggregates.by_country.get(country) else {
                continue;
            };

            let members = group.events(ctx.events);
            let baseline = match config.spike_baseline {
                SpikeBaseline::AllTime => Baseline::from_events(members),
                SpikeBaseline::BeforeWindow => {
                    Baseline::from_events(members.filter(|e| !ctx.is_recent(e)))
                }
            };

            if baseline.events < config.spike_min_events || baseline.span_days <= 0 {
                continue;
            }
            if recent == 0 {
                continue;
            }

            let average = baseline.monthly_average();
            // A fatality-free baseline makes any recent toll a spike
            let spiking = average <= 0.0 || recent as f64 / average > config.spike_ratio;
            if !spiking {
                continue;
            }

            alerts.push(Alert {
                kind: AlertKind::FatalitySpike,
                severity: Severity::high_if(recent > config.spike_high_fatalities),
                location: AlertLocation::country(country),
                description: format!(
                    "Significant increase in fatalities in {} with {} fatalities in the last 30 days, compared to historical average of {} per month.",
                    country,
                    recent,
                    average.trunc() as u64
                ),
            });
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::test_support::{day, run, run_with};
    use crate::config::AlertConfig;

    /// Ten quiet January events, then two deadly ones at the end of April
    fn iraq() -> Vec<Event> {
        let mut events: Vec<Event> = (0..10u32)
            .map(|i| Event::new(format!("j{i}"), day(2025, 1, 1 + i), "Iraq", "Mosul", "Battles", "ISIS", 1))
            .collect();
        events.push(Event::new("a1", day(2025, 4, 29), "Iraq", "Mosul", "Battles", "ISIS", 30));
        events.push(Event::new("a2", day(2025, 4, 30), "Iraq", "Mosul", "Battles", "ISIS", 30));
        events
    }

    #[test]
    fn test_window_fatalities_do_not_dilute_the_baseline() {
        // 10 fatalities over 9 days is 33.3 per month, 60 is under twice that
        assert!(run(&FatalitySpikeDetector, iraq()).is_empty());

        let mut events = iraq();
        events.push(Event::new("a3", day(2025, 4, 30), "Iraq", "Basra", "Battles", "ISIS", 10));
        let alerts = run(&FatalitySpikeDetector, events);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[0].location, AlertLocation::country("Iraq"));
        assert_eq!(
            alerts[0].description,
            "Significant increase in fatalities in Iraq with 70 fatalities in the last 30 days, compared to historical average of 33 per month."
        );
    }

    #[test]
    fn test_all_time_baseline_includes_the_window() {
        let config = AlertConfig {
            spike_baseline: SpikeBaseline::AllTime,
            ..AlertConfig::default()
        };
        let alerts = run_with(&FatalitySpikeDetector, iraq(), &config);
        assert_eq!(alerts.len(), 1);
        // 70 fatalities over 119 days is 17.6 per month
        assert_eq!(
            alerts[0].description,
            "Significant increase in fatalities in Iraq with 60 fatalities in the last 30 days, compared to historical average of 17 per month."
        );
    }

    #[test]
    fn test_fatality_free_history_makes_any_toll_a_spike() {
        let mut events: Vec<Event> = (0..10u32)
            .map(|i| Event::new(format!("q{i}"), day(2025, 1, 1 + i), "Iraq", "Baghdad", "Protests", "P", 0))
            .collect();
        events.push(Event::new("d1", day(2025, 4, 30), "Iraq", "Mosul", "Battles", "ISIS", 4));
        let alerts = run(&FatalitySpikeDetector, events);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_steady_country_and_small_country_are_quiet() {
        let mut events: Vec<Event> = (0..12u32)
            .map(|i| {
                let date = day(2025, 1, 1) + chrono::Days::new(10 * i as u64);
                Event::new(format!("s{i}"), date, "Kenya", "Nairobi", "Riots", "P", 5)
            })
            .collect();
        for i in 0..3u32 {
            events.push(Event::new(format!("t{i}"), day(2025, 4, 20 + i), "Togo", "Lome", "Riots", "P", 40));
        }
        assert!(run(&FatalitySpikeDetector, events).is_empty());
    }

    #[test]
    fn test_zero_span_is_skipped() {
        let events = (0..12u32)
            .map(|i| Event::new(format!("z{i}"), day(2025, 4, 1), "Iraq", "Mosul", "Battles", "ISIS", 9))
            .collect();
        assert!(run(&FatalitySpikeDetector, events).is_empty());
    }
}
