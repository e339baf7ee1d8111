//! Analysis thresholds
//!
//! Every constant the pipeline compares against lives here with its
//! default. A JSON config file only needs to name the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// Thresholds for the increasing/decreasing/stable classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub increasing_above: f64,
    pub decreasing_below: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            increasing_above: 0.1,
            decreasing_below: -0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Length of every top-N list inside a profile
    pub top_n: usize,
    /// Candidate actors taken from each actor slot by frequency
    pub actor_candidates_per_slot: usize,
    /// Minimum associated events for an actor to get a profile
    pub actor_min_events: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            actor_candidates_per_slot: 20,
            actor_min_events: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotspotConfig {
    pub min_events: u64,
    pub min_fatalities: u64,
    pub max_hotspots: usize,
    pub top_event_types: usize,
    pub escalating_above: f64,
    pub deescalating_below: f64,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            min_events: 5,
            min_fatalities: 10,
            max_hotspots: 20,
            top_event_types: 3,
            escalating_above: 0.4,
            deescalating_below: 0.15,
        }
    }
}

/// Which events form the fatality-spike baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpikeBaseline {
    /// Only events dated before the trailing window
    #[default]
    BeforeWindow,
    /// Every event of the country, trailing window included
    AllTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub window_days: u64,
    pub new_actor_buffer_days: u64,

    pub emerging_min_recent: u64,
    pub emerging_min_total: u64,
    pub emerging_recent_ratio: f64,
    pub emerging_high_fatalities: u64,

    pub spike_min_events: u64,
    pub spike_ratio: f64,
    pub spike_high_fatalities: u64,
    pub spike_baseline: SpikeBaseline,

    /// Names this short or shorter are treated as placeholders
    pub new_actor_max_noise_len: usize,
    pub new_actor_min_events: u64,
    pub new_actor_high_fatalities: u64,

    pub shift_min_country_events: u64,
    pub shift_min_partition_events: u64,
    pub shift_share_increase: f64,
    pub new_dynamic_min_share: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            new_actor_buffer_days: 60,
            emerging_min_recent: 3,
            emerging_min_total: 5,
            emerging_recent_ratio: 0.7,
            emerging_high_fatalities: 10,
            spike_min_events: 10,
            spike_ratio: 2.0,
            spike_high_fatalities: 50,
            spike_baseline: SpikeBaseline::BeforeWindow,
            new_actor_max_noise_len: 3,
            new_actor_min_events: 3,
            new_actor_high_fatalities: 20,
            shift_min_country_events: 10,
            shift_min_partition_events: 5,
            shift_share_increase: 0.2,
            new_dynamic_min_share: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SampleConfig {
    pub max_recent_fatal: usize,
    pub per_hotspot: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            max_recent_fatal: 100,
            per_hotspot: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotesConfig {
    pub event_type: String,
    pub keywords: Vec<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            event_type: "Strategic developments".to_string(),
            keywords: [
                "peace agreement",
                "ceasefire",
                "negotiation",
                "deployment",
                "withdrawal",
                "mobilization",
                "troop",
                "arrest",
                "headquarters",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Top-level configuration for a full insight run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    pub trend: TrendConfig,
    pub profiles: ProfileConfig,
    pub hotspots: HotspotConfig,
    pub alerts: AlertConfig,
    pub sample: SampleConfig,
    pub notes: NotesConfig,
    /// Run the alert detectors on scoped worker threads
    pub parallel_detectors: bool,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            trend: TrendConfig::default(),
            profiles: ProfileConfig::default(),
            hotspots: HotspotConfig::default(),
            alerts: AlertConfig::default(),
            sample: SampleConfig::default(),
            notes: NotesConfig::default(),
            parallel_detectors: false,
        }
    }
}

impl InsightConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| InsightError::io(path, e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: InsightConfig =
            serde_json::from_str(raw).map_err(|e| InsightError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alerts.window_days == 0 {
            return Err(InsightError::Config(
                "alerts.window_days must be at least 1".to_string(),
            ));
        }
        if self.trend.decreasing_below > self.trend.increasing_above {
            return Err(InsightError::Config(
                "trend.decreasing_below exceeds trend.increasing_above".to_string(),
            ));
        }
        if self.hotspots.deescalating_below > self.hotspots.escalating_above {
            return Err(InsightError::Config(
                "hotspots.deescalating_below exceeds hotspots.escalating_above".to_string(),
            ));
        }
        Ok(())
    }
}
