//! Quarter-split trend estimation
//!
//! A group's date span is cut into quarters; the earliest and the most
//! recent quarter are compared. The same split drives both the
//! increasing/decreasing label used by profiles and the
//! escalating/deescalating label used by hotspots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{HotspotConfig, TrendConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendEstimate {
    pub trend: Trend,
    /// Signed (recent - early) / early, unrounded
    pub factor: f64,
}

impl TrendEstimate {
    pub const STABLE: TrendEstimate = TrendEstimate {
        trend: Trend::Stable,
        factor: 0.0,
    };
}

/// Hotspot activity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Escalating,
    Deescalating,
    Ongoing,
    Unknown,
}

/// Event counts in the first and last quarter of a non-empty span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterSplit {
    pub early: u64,
    pub recent: u64,
    pub total: u64,
}

/// `None` for an empty collection or a zero-length span.
///
/// Dates are whole days, so `date >= max - span/4` is evaluated exactly as
/// `4 * offset >= 3 * span` and `date <= min + span/4` as `4 * offset <= span`.
pub fn quarter_split(dates: &[NaiveDate]) -> Option<QuarterSplit> {
    let min = *dates.iter().min()?;
    let max = *dates.iter().max()?;
    let span = (max - min).num_days();
    if span <= 0 {
        return None;
    }

    let mut split = QuarterSplit {
        early: 0,
        recent: 0,
        total: dates.len() as u64,
    };
    for date in dates {
        let offset = (*date - min).num_days();
        if 4 * offset >= 3 * span {
            split.recent += 1;
        }
        if 4 * offset <= span {
            split.early += 1;
        }
    }
    Some(split)
}

pub fn estimate(dates: &[NaiveDate], config: &TrendConfig) -> TrendEstimate {
    let Some(split) = quarter_split(dates) else {
        return TrendEstimate::STABLE;
    };

    let factor = if split.early > 0 {
        (split.recent as f64 - split.early as f64) / split.early as f64
    } else if split.recent > 0 {
        1.0
    } else {
        0.0
    };

    let trend = if factor > config.increasing_above {
        Trend::Increasing
    } else if factor < config.decreasing_below {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    TrendEstimate { trend, factor }
}

pub fn classify_activity(dates: &[NaiveDate], config: &HotspotConfig) -> Activity {
    let Some(split) = quarter_split(dates) else {
        return Activity::Unknown;
    };

    let recent_ratio = split.recent as f64 / split.total as f64;
    if recent_ratio > config.escalating_above {
        Activity::Escalating
    } else if recent_ratio < config.deescalating_below {
        Activity::Deescalating
    } else {
        Activity::Ongoing
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn days(ds: &[u32]) -> Vec<NaiveDate> {
        ds.iter().map(|&d| day(d)).collect()
    }

    #[test]
    fn test_zero_span_is_stable() {
        let dates = vec![day(5); 10];
        assert_eq!(estimate(&dates, &TrendConfig::default()), TrendEstimate::STABLE);
        assert_eq!(estimate(&[], &TrendConfig::default()), TrendEstimate::STABLE);
    }

    #[test]
    fn test_increasing_and_decreasing() {
        let config = TrendConfig::default();

        // span 8 days: early <= day 3, recent >= day 7
        let rising = days(&[1, 7, 8, 9, 9]);
        let est = estimate(&rising, &config);
        assert_eq!(est.trend, Trend::Increasing);
        assert!((est.factor - 3.0).abs() < 1e-12);

        let falling = days(&[1, 1, 2, 3, 9]);
        let est = estimate(&falling, &config);
        assert_eq!(est.trend, Trend::Decreasing);
        assert!((est.factor - (-0.75)).abs() < 1e-12);

        let flat = days(&[1, 5, 9]);
        assert_eq!(estimate(&flat, &config).trend, Trend::Stable);
    }

    #[test]
    fn test_quarter_boundaries_with_fractional_quarter() {
        // span 3 days -> quarter is 18h: only day 4 is recent, only day 1 is early
        let split = quarter_split(&days(&[1, 2, 3, 4])).unwrap();
        assert_eq!(split.early, 1);
        assert_eq!(split.recent, 1);
        assert_eq!(split.total, 4);
    }

    #[test]
    fn test_hotspot_activity_labels() {
        let config = HotspotConfig::default();
        assert_eq!(classify_activity(&days(&[1, 4]), &config), Activity::Escalating);
        assert_eq!(classify_activity(&days(&[3, 3]), &config), Activity::Unknown);
        assert_eq!(
            classify_activity(&days(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 29]), &config),
            Activity::Deescalating
        );
        assert_eq!(
            classify_activity(&days(&[1, 2, 3, 4, 5]), &config),
            Activity::Ongoing
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.756), -0.76);
        assert_eq!(round2(0.0), 0.0);
    }
}
