use std::collections::BTreeMap;

use crate::aggregate::{LocationKey, Tally};
use crate::error::Result;

use super::{Alert, AlertDetector, AlertKind, AlertLocation, DetectionContext, Severity};

/// Locations where most of the all-time activity falls in the trailing window
pub struct EmergingHotspotDetector;

impl AlertDetector for EmergingHotspotDetector {
    fn name(&self) -> &str {
        "emerging_hotspot"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>> {
        let config = ctx.config;

        let mut recent_counts: BTreeMap<LocationKey, u64> = BTreeMap::new();
        for event in ctx.recent_events() {
            *recent_counts
                .entry(LocationKey::new(&event.country, &event.location))
                .or_default() += 1;
        }

        let mut alerts = Vec::new();
        for (key, recent) in recent_counts {
            if recent < config.emerging_min_recent {
                continue;
            }
            let Some(location) = ctx.aggregates.by_location.get(&key) else {
                continue;
            };

            let total = location.stats.count;
            let recent_ratio = recent as f64 / total as f64;
            if recent_ratio <= config.emerging_recent_ratio || total < config.emerging_min_total {
                continue;
            }

            let event_types: Tally = location
                .stats
                .events(ctx.events)
                .map(|e| e.event_type.as_str())
                .collect();
            let event_types = event_types
                .top(2)
                .into_iter()
                .map(|e| e.name)
                .collect::<Vec<_>>()
                .join(", ");
            let fatalities = location.stats.fatalities;

            alerts.push(Alert {
                kind: AlertKind::EmergingHotspot,
                severity: Severity::high_if(fatalities > config.emerging_high_fatalities),
                description: format!(
                    "Rapid escalation of conflict in {}, {} with {} recent events ({}).",
                    key.location, key.country, recent, event_types
                ),
                location: AlertLocation::place(key.country, key.location),
            });
        }

        Ok(alerts)
    }
}
