//! # insight-sim
//!
//! Seeded synthetic conflict feeds with ground-truth anomaly injection.
//!
//! The generator only produces events and records which alert each
//! injected scenario should provoke. Detection happens in `insight-core`.

pub mod generator;
pub mod scenario;

pub use generator::{FeedGenerator, raw_feed, raw_record};
pub use scenario::{GroundTruth, Scenario};
