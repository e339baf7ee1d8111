//! Strategic alert detection
//!
//! Four independent detectors scan a trailing window that ends at the
//! newest event in the set and compare it against everything older:
//!
//! 1. Emerging hotspots: locations whose activity is mostly recent
//! 2. Fatality spikes: countries whose recent toll outruns their monthly average
//! 3. New actors: names seen recently but never before the buffer window
//! 4. Dynamic shifts: event-type mix moving toward one category
//!
//! Detectors are isolated from each other. One that errors or panics is
//! logged and skipped; the rest still report.

pub mod dynamics;
pub mod emerging;
pub mod new_actor;
pub mod spike;

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{Days, NaiveDate};
use crossbeam_channel::unbounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregates;
use crate::config::AlertConfig;
use crate::error::{InsightError, Result};
use crate::event::{Event, EventSet};

pub use dynamics::DynamicShiftDetector;
pub use emerging::EmergingHotspotDetector;
pub use new_actor::NewActorDetector;
pub use spike::FatalitySpikeDetector;

// ============================================================================
// ALERT MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "Emerging Hotspot")]
    EmergingHotspot,
    #[serde(rename = "Fatality Spike")]
    FatalitySpike,
    #[serde(rename = "New Actor")]
    NewActor,
    #[serde(rename = "Conflict Dynamic Shift")]
    ConflictDynamicShift,
    #[serde(rename = "New Conflict Dynamic")]
    NewConflictDynamic,
}

/// Alert severity. Values other than the known ones rank last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Sort position, lower first
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
            Severity::Unknown => 3,
        }
    }

    /// High when the condition holds, Medium otherwise
    pub(crate) fn high_if(condition: bool) -> Self {
        if condition {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
}

impl AlertLocation {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Default::default()
        }
    }

    pub fn place(country: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            location: Some(location.into()),
            countries: Vec::new(),
        }
    }

    pub fn countries(countries: Vec<String>) -> Self {
        Self {
            countries,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub location: AlertLocation,
    pub description: String,
}

// ============================================================================
// DETECTION CONTEXT
// ============================================================================

/// Shared read-only inputs for one detection pass
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub events: &'a EventSet,
    pub aggregates: &'a Aggregates,
    pub config: &'a AlertConfig,
    /// Newest event date in the whole set
    pub max_date: NaiveDate,
    /// Events on or after this date form the trailing window
    pub recent_cutoff: NaiveDate,
    /// Start of the buffer window that precedes the trailing window
    pub older_cutoff: NaiveDate,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        events: &'a EventSet,
        aggregates: &'a Aggregates,
        config: &'a AlertConfig,
        max_date: NaiveDate,
    ) -> Result<Self> {
        let recent_cutoff = max_date
            .checked_sub_days(Days::new(config.window_days))
            .ok_or(InsightError::DateWindow(max_date))?;
        let older_cutoff = recent_cutoff
            .checked_sub_days(Days::new(config.new_actor_buffer_days))
            .ok_or(InsightError::DateWindow(recent_cutoff))?;

        Ok(Self {
            events,
            aggregates,
            config,
            max_date,
            recent_cutoff,
            older_cutoff,
        })
    }

    pub fn is_recent(&self, event: &Event) -> bool {
        event.date >= self.recent_cutoff
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &'a Event> + 'a {
        let cutoff = self.recent_cutoff;
        self.events.iter().filter(move |e| e.date >= cutoff)
    }
}

// ============================================================================
// DETECTORS
// ============================================================================

/// One independent alert rule
pub trait AlertDetector: Send + Sync {
    fn name(&self) -> &str;
    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>>;
}

/// The four standard detectors, in emission order
pub fn default_detectors() -> Vec<Box<dyn AlertDetector>> {
    vec![
        Box::new(EmergingHotspotDetector),
        Box::new(FatalitySpikeDetector),
        Box::new(NewActorDetector),
        Box::new(DynamicShiftDetector),
    ]
}

type DetectorOutcome = std::result::Result<Vec<Alert>, InsightError>;

fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

fn run_isolated(detector: &dyn AlertDetector, ctx: &DetectionContext<'_>) -> DetectorOutcome {
    match catch_unwind(AssertUnwindSafe(|| detector.detect(ctx))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(InsightError::Detector {
            detector: detector.name().to_string(),
            reason: panic_reason(payload),
        }),
    }
}

fn run_parallel(
    detectors: &[Box<dyn AlertDetector>],
    ctx: &DetectionContext<'_>,
) -> Vec<DetectorOutcome> {
    let (tx, rx) = unbounded::<(usize, DetectorOutcome)>();

    std::thread::scope(|scope| {
        for (index, detector) in detectors.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let outcome = run_isolated(detector.as_ref(), ctx);
                let _ = tx.send((index, outcome));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<DetectorOutcome>> = detectors.iter().map(|_| None).collect();
    for (index, outcome) in rx.iter() {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    slots
        .into_iter()
        .zip(detectors)
        .map(|(slot, detector)| {
            slot.unwrap_or_else(|| {
                Err(InsightError::Detector {
                    detector: detector.name().to_string(),
                    reason: "worker exited without a result".to_string(),
                })
            })
        })
        .collect()
}

/// Run every detector, then merge and sort their alerts by severity.
///
/// Emission order is preserved within a severity level regardless of
/// whether the detectors ran in parallel.
pub fn run_detectors(
    detectors: &[Box<dyn AlertDetector>],
    ctx: &DetectionContext<'_>,
    parallel: bool,
) -> Vec<Alert> {
    let outcomes: Vec<DetectorOutcome> = if parallel {
        run_parallel(detectors, ctx)
    } else {
        detectors
            .iter()
            .map(|d| run_isolated(d.as_ref(), ctx))
            .collect()
    };

    let mut alerts = Vec::new();
    for (detector, outcome) in detectors.iter().zip(outcomes) {
        match outcome {
            Ok(found) => {
                debug!(detector = detector.name(), alerts = found.len(), "Detector finished");
                alerts.extend(found);
            }
            Err(e) => {
                warn!(detector = detector.name(), error = %e, "Detector failed, skipping");
            }
        }
    }

    sort_alerts(&mut alerts);
    alerts
}

/// Detect alerts over a whole event set with the standard detectors.
pub fn detect_alerts(
    events: &EventSet,
    aggregates: &Aggregates,
    config: &AlertConfig,
    parallel: bool,
) -> Result<Vec<Alert>> {
    let Some((_, max_date)) = events.date_span() else {
        return Ok(Vec::new());
    };

    let ctx = DetectionContext::new(events, aggregates, config, max_date)?;
    let alerts = run_detectors(&default_detectors(), &ctx, parallel);
    info!(alerts = alerts.len(), "Identified strategic alerts");
    Ok(alerts)
}

/// Stable sort, High first, unrecognized severities last
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by_key(|a| a.severity.rank());
}

/// Percentage truncated toward zero, as shown in descriptions
pub(crate) fn whole_percent(share: f64) -> u64 {
    (share * 100.0) as u64
}
