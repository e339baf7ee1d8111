use crate::aggregate::Tally;
use crate::error::Result;

use super::{Alert, AlertDetector, AlertKind, AlertLocation, DetectionContext, Severity, whole_percent};

/// Compares each country's recent event-type mix to its historical mix.
///
/// Emits a shift alert when a known type gains share and a new-dynamic
/// alert when a type never seen before takes a large share.
pub struct DynamicShiftDetector;

impl AlertDetector for DynamicShiftDetector {
    fn name(&self) -> &str {
        "dynamic_shift"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>> {
        let config = ctx.config;
        let mut alerts = Vec::new();

        for (country, group) in &ctx.aggregates.by_country {
            if group.count < config.shift_min_country_events {
                continue;
            }

            let mut recent = Tally::new();
            let mut historical = Tally::new();
            for event in group.events(ctx.events) {
                if ctx.is_recent(event) {
                    recent.add(&event.event_type);
                } else {
                    historical.add(&event.event_type);
                }
            }
            if recent.total() < config.shift_min_partition_events
                || historical.total() < config.shift_min_partition_events
            {
                continue;
            }

            for entry in recent.ranked() {
                let recent_share = recent.share(&entry.name);

                if historical.contains(&entry.name) {
                    let historical_share = historical.share(&entry.name);
                    if recent_share - historical_share > config.shift_share_increase {
                        alerts.push(Alert {
                            kind: AlertKind::ConflictDynamicShift,
                            severity: Severity::Medium,
                            location: AlertLocation::country(country),
                            description: format!(
                                "Significant shift toward {} events in {}. This event type now represents {}% of recent events, up from {}% historically.",
                                entry.name,
                                country,
                                whole_percent(recent_share),
                                whole_percent(historical_share)
                            ),
                        });
                    }
                } else if recent_share > config.new_dynamic_min_share {
                    alerts.push(Alert {
                        kind: AlertKind::NewConflictDynamic,
                        severity: Severity::High,
                        location: AlertLocation::country(country),
                        description: format!(
                            "Emergence of {} as a significant new conflict dynamic in {}, representing {}% of recent events.",
                            entry.name,
                            country,
                            whole_percent(recent_share)
                        ),
                    });
                }
            }
        }

        Ok(alerts)
    }
}
