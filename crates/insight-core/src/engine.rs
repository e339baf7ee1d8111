//! Insight engine
//!
//! Entry point for a full run: load a feed, separate "no events" from a
//! populated result, and hand the event set to the snapshot builder.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::config::InsightConfig;
use crate::error::Result;
use crate::event::EventSet;
use crate::loader;
use crate::snapshot::{InsightSnapshot, SnapshotBuilder};

/// Outcome of analyzing one event set
#[derive(Debug, Clone, PartialEq)]
pub enum InsightReport {
    /// Well-formed input with zero valid events
    NoEvents { skipped: usize },
    Snapshot(Box<InsightSnapshot>),
}

impl InsightReport {
    pub fn snapshot(&self) -> Option<&InsightSnapshot> {
        match self {
            InsightReport::Snapshot(s) => Some(s),
            InsightReport::NoEvents { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<InsightSnapshot> {
        match self {
            InsightReport::Snapshot(s) => Some(*s),
            InsightReport::NoEvents { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    config: InsightConfig,
}

impl InsightEngine {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn analyze(&self, events: &EventSet) -> InsightReport {
        self.run(events, SnapshotBuilder::new(&self.config))
    }

    /// Like [`analyze`](Self::analyze) with a pinned generation timestamp,
    /// so repeated runs compare equal.
    pub fn analyze_at(&self, events: &EventSet, generated_at: NaiveDateTime) -> InsightReport {
        self.run(events, SnapshotBuilder::new(&self.config).generated_at(generated_at))
    }

    /// Load a feed file or directory and analyze it.
    ///
    /// A missing source is an error; an empty one is `NoEvents`.
    pub fn load_and_analyze(&self, path: impl AsRef<Path>) -> Result<InsightReport> {
        let feed = loader::load_feed(path)?;
        Ok(self.analyze(&feed.events))
    }

    fn run(&self, events: &EventSet, builder: SnapshotBuilder<'_>) -> InsightReport {
        if events.is_empty() {
            warn!(skipped = events.skipped(), "No valid events to analyze");
            return InsightReport::NoEvents {
                skipped: events.skipped(),
            };
        }

        info!(
            events = events.len(),
            skipped = events.skipped(),
            parallel_detectors = self.config.parallel_detectors,
            "Generating insights"
        );
        let snapshot = builder.build(events);
        info!(
            countries = snapshot.country_profiles.len(),
            hotspots = snapshot.hotspots.len(),
            alerts = snapshot.strategic_alerts.len(),
            "Insight generation complete"
        );

        InsightReport::Snapshot(Box::new(snapshot))
    }
}
