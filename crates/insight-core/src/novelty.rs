//! Rolling novelty index
//!
//! Remembers which terms were seen on which days over a trailing window.
//! A text is novel in proportion to how many of its terms are absent from
//! that memory. Storage is behind [`NoveltyStore`] so tests run against
//! memory and the CLI against a JSON file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{InsightError, Result};
use crate::trend::round2;

pub const DEFAULT_WINDOW_DAYS: u64 = 30;

static TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").expect("term pattern"));

/// Distinct lower-cased words of at least four word characters
pub fn terms(text: &str) -> BTreeSet<String> {
    TERM.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

pub trait NoveltyStore {
    /// Days on which `term` was recorded, if any remain
    fn get(&self, term: &str) -> Option<&[NaiveDate]>;
    fn put(&mut self, term: &str, date: NaiveDate);
    /// Drop every sighting older than `cutoff`, and terms left with none
    fn prune(&mut self, cutoff: NaiveDate);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNoveltyStore {
    entries: BTreeMap<String, Vec<NaiveDate>>,
}

impl MemoryNoveltyStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NoveltyStore for MemoryNoveltyStore {
    fn get(&self, term: &str) -> Option<&[NaiveDate]> {
        self.entries.get(term).map(Vec::as_slice)
    }

    fn put(&mut self, term: &str, date: NaiveDate) {
        self.entries.entry(term.to_string()).or_default().push(date);
    }

    fn prune(&mut self, cutoff: NaiveDate) {
        self.entries.retain(|_, dates| {
            dates.retain(|d| *d >= cutoff);
            !dates.is_empty()
        });
    }
}

/// Memory store persisted as a JSON object of term to ISO dates
#[derive(Debug, Clone)]
pub struct JsonNoveltyStore {
    path: PathBuf,
    memory: MemoryNoveltyStore,
}

impl JsonNoveltyStore {
    /// Open the index at `path`; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| InsightError::io(&path, e))?;
            serde_json::from_str(&raw).map_err(|e| InsightError::NoveltyIndex {
                path: path.clone(),
                source: e,
            })?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), terms = entries.len(), "Opened novelty index");
        Ok(Self {
            path,
            memory: MemoryNoveltyStore { entries },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| InsightError::io(parent, e))?;
        }
        let raw = serde_json::to_string(&self.memory.entries).map_err(|e| InsightError::Serialize {
            target: self.path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&self.path, raw).map_err(|e| InsightError::io(&self.path, e))
    }
}

impl NoveltyStore for JsonNoveltyStore {
    fn get(&self, term: &str) -> Option<&[NaiveDate]> {
        self.memory.get(term)
    }

    fn put(&mut self, term: &str, date: NaiveDate) {
        self.memory.put(term, date);
    }

    fn prune(&mut self, cutoff: NaiveDate) {
        self.memory.prune(cutoff);
    }
}

pub struct NoveltyIndex<S: NoveltyStore> {
    store: S,
    window_days: u64,
}

impl<S: NoveltyStore> NoveltyIndex<S> {
    pub fn new(store: S) -> Self {
        Self::with_window(store, DEFAULT_WINDOW_DAYS)
    }

    pub fn with_window(store: S, window_days: u64) -> Self {
        Self { store, window_days }
    }

    /// Share of unseen terms in `text`, rounded to 2 decimals.
    ///
    /// The text's terms are recorded for `today` afterwards and sightings
    /// older than the window are pruned.
    pub fn score(&mut self, text: &str, today: NaiveDate) -> f64 {
        let terms = terms(text);
        let seen = terms.iter().filter(|t| self.store.get(t).is_some()).count();
        let score = 1.0 - seen as f64 / terms.len().max(1) as f64;

        for term in &terms {
            self.store.put(term, today);
        }
        let cutoff = today
            .checked_sub_days(Days::new(self.window_days))
            .unwrap_or(NaiveDate::MIN);
        self.store.prune(cutoff);

        round2(score)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_terms_are_long_lowercase_words() {
        let found = terms("Troop deployment: the TROOP moved to Aden.");
        let expected: BTreeSet<String> =
            ["troop", "deployment", "moved", "aden"].into_iter().map(String::from).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_score_partial_overlap() {
        let mut index = NoveltyIndex::new(MemoryNoveltyStore::default());
        assert_eq!(index.score("ceasefire talks resume", day(4, 1)), 1.0);
        // "ceasefire" and "talks" seen, "collapse" new
        assert_eq!(index.score("ceasefire talks collapse", day(4, 2)), 0.33);
        // no terms at all
        assert_eq!(index.score("a an of", day(4, 2)), 1.0);
    }

    #[test]
    fn test_window_prunes_old_sightings() {
        let mut index = NoveltyIndex::new(MemoryNoveltyStore::default());
        index.score("mobilization", day(1, 1));
        assert_eq!(index.score("mobilization", day(1, 31)), 0.0);
        // last seen 2025-01-31, which is outside the window by 2025-03-05
        index.score("unrelated", day(3, 5));
        assert!(index.store().get("mobilization").is_none());
        assert_eq!(index.score("mobilization", day(3, 5)), 1.0);
    }

    #[test]
    fn test_json_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("novelty.json");

        let mut index = NoveltyIndex::new(JsonNoveltyStore::open(&path).unwrap());
        index.score("withdrawal announced", day(4, 1));
        index.store().save().unwrap();

        let mut reopened = NoveltyIndex::new(JsonNoveltyStore::open(&path).unwrap());
        assert_eq!(reopened.score("withdrawal announced", day(4, 2)), 0.0);
        assert_eq!(reopened.store().path(), path.as_path());
    }

    #[test]
    fn test_corrupt_index_is_reported_as_such() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novelty.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let err = JsonNoveltyStore::open(&path).unwrap_err();
        assert!(matches!(err, InsightError::NoveltyIndex { .. }));
        assert!(!err.is_data_not_found());
        assert!(err.to_string().starts_with("Corrupt novelty index"));
    }
}
