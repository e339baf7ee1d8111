//! Conflict-event insight engine
//!
//! Turns a normalized set of conflict events into an [`InsightSnapshot`]:
//! country, event-type and actor profiles, ranked hotspots and strategic
//! alerts computed against a trailing window.

pub mod aggregate;
pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod hotspot;
pub mod loader;
pub mod notes;
pub mod novelty;
pub mod profiles;
pub mod snapshot;
pub mod trend;

pub use aggregate::{Aggregates, Tally, TallyEntry};
pub use alerts::{Alert, AlertDetector, AlertKind, AlertLocation, DetectionContext, Severity};
pub use config::InsightConfig;
pub use engine::{InsightEngine, InsightReport};
pub use error::{InsightError, Result};
pub use event::{Event, EventSet};
pub use hotspot::Hotspot;
pub use loader::{LoadedFeed, load_feed};
pub use notes::{StrategicNote, strategic_notes};
pub use novelty::{JsonNoveltyStore, MemoryNoveltyStore, NoveltyIndex, NoveltyStore};
pub use snapshot::{InsightSnapshot, Metadata, SnapshotBuilder};
pub use trend::{Activity, Trend};
