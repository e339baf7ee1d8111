//! Injectable anomaly scenarios with their expected alerts
//!
//! Each scenario writes a fixed, deterministic pattern into the feed. The
//! pattern ends on the last generated day, so it always lands inside the
//! trailing detection window.

use insight_core::AlertKind;
use serde::{Deserialize, Serialize};

pub const EMERGING_COUNTRY: &str = "Sudan";
pub const EMERGING_LOCATION: &str = "Al Junaynah";
pub const SPIKE_COUNTRY: &str = "Iraq";
pub const NEW_ACTOR: &str = "Northern Liberation Front";
pub const NEW_ACTOR_COUNTRY: &str = "Myanmar";
pub const SHIFT_COUNTRY: &str = "Ethiopia";
pub const SHIFT_EVENT_TYPE: &str = "Battles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// A previously silent location suddenly hosts a run of deadly events
    EmergingHotspot,
    /// A quiet country records a burst of mass-casualty events
    FatalitySpike,
    /// An actor never seen before carries out several attacks
    NewActor,
    /// A protest-dominated country turns to armed clashes
    DynamicShift,
}

/// Alert a scenario must provoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundTruth {
    pub kind: AlertKind,
    pub country: &'static str,
    pub location: Option<&'static str>,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::EmergingHotspot,
        Scenario::FatalitySpike,
        Scenario::NewActor,
        Scenario::DynamicShift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::EmergingHotspot => "emerging_hotspot",
            Scenario::FatalitySpike => "fatality_spike",
            Scenario::NewActor => "new_actor",
            Scenario::DynamicShift => "dynamic_shift",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name.trim())
    }

    pub fn ground_truth(&self) -> GroundTruth {
        match self {
            Scenario::EmergingHotspot => GroundTruth {
                kind: AlertKind::EmergingHotspot,
                country: EMERGING_COUNTRY,
                location: Some(EMERGING_LOCATION),
            },
            Scenario::FatalitySpike => GroundTruth {
                kind: AlertKind::FatalitySpike,
                country: SPIKE_COUNTRY,
                location: None,
            },
            Scenario::NewActor => GroundTruth {
                kind: AlertKind::NewActor,
                country: NEW_ACTOR_COUNTRY,
                location: None,
            },
            Scenario::DynamicShift => GroundTruth {
                kind: AlertKind::ConflictDynamicShift,
                country: SHIFT_COUNTRY,
                location: None,
            },
        }
    }
}
