//! Strategic development notes
//!
//! Events of the strategic-developments category carry free-text notes
//! (agreements, deployments, arrests). They are surfaced separately with
//! the strategic keywords each one mentions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NotesConfig;
use crate::error::{InsightError, Result};
use crate::event::EventSet;
use crate::novelty::{NoveltyIndex, NoveltyStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicNote {
    pub id: String,
    pub date: NaiveDate,
    pub country: String,
    pub location: String,
    pub notes: String,
    /// Configured keywords found in the text, in configuration order
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty: Option<f64>,
}

fn matched_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
        .cloned()
        .collect()
}

pub fn strategic_notes(events: &EventSet, config: &NotesConfig) -> Vec<StrategicNote> {
    let notes: Vec<StrategicNote> = events
        .iter()
        .filter(|e| e.event_type.eq_ignore_ascii_case(&config.event_type))
        .filter_map(|e| {
            let text = e.notes.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
            Some(StrategicNote {
                id: e.id.clone(),
                date: e.date,
                country: e.country.clone(),
                location: e.location.clone(),
                notes: text.to_string(),
                keywords: matched_keywords(text, &config.keywords),
                novelty: None,
            })
        })
        .collect();

    info!(notes = notes.len(), "Extracted strategic development notes");
    notes
}

/// Score each note against the rolling index, in order, recording its terms.
pub fn annotate_novelty<S: NoveltyStore>(
    notes: &mut [StrategicNote],
    index: &mut NoveltyIndex<S>,
    today: NaiveDate,
) {
    for note in notes {
        note.novelty = Some(index.score(&note.notes, today));
    }
}

/// Pretty JSON array of the notes, as printed by the `notes` command
pub fn notes_json(notes: &[StrategicNote]) -> Result<String> {
    serde_json::to_string_pretty(notes).map_err(|e| InsightError::Serialize {
        target: "strategic notes".to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::novelty::MemoryNoveltyStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn events() -> EventSet {
        vec![
            Event::new("1", day(1), "Syria", "Damascus", "Strategic developments", "Gov", 0).with_notes(
                "Peace agreement negotiation with opposition forces announced in Damascus. Military deployment witnessed in suburbs.",
            ),
            Event::new("2", day(2), "Syria", "Sayda", "Battles", "A", 3).with_notes("Peace agreement broken"),
            Event::new("3", day(3), "Syria", "Homs", "strategic developments", "Gov", 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_only_strategic_events_with_text() {
        let notes = strategic_notes(&events(), &NotesConfig::default());
        assert_eq!(notes.len(), 1);
        let note = &notes[0];
        assert_eq!(note.location, "Damascus");
        assert_eq!(note.keywords, vec!["peace agreement", "negotiation", "deployment"]);
        assert_eq!(note.novelty, None);
    }

    #[test]
    fn test_novelty_annotation_drops_on_repeat() {
        let mut notes = strategic_notes(&events(), &NotesConfig::default());
        notes.push(notes[0].clone());

        let mut index = NoveltyIndex::new(MemoryNoveltyStore::default());
        annotate_novelty(&mut notes, &mut index, day(5));
        assert_eq!(notes[0].novelty, Some(1.0));
        assert_eq!(notes[1].novelty, Some(0.0));
    }

    #[test]
    fn test_notes_json_lists_keywords_and_novelty() {
        let mut notes = strategic_notes(&events(), &NotesConfig::default());
        let mut index = NoveltyIndex::new(MemoryNoveltyStore::default());
        annotate_novelty(&mut notes, &mut index, day(5));

        let json: serde_json::Value = serde_json::from_str(&notes_json(&notes).unwrap()).unwrap();
        assert_eq!(json[0]["location"], "Damascus");
        assert_eq!(json[0]["keywords"][1], "negotiation");
        assert_eq!(json[0]["novelty"], 1.0);
        assert_eq!(notes_json(&[]).unwrap(), "[]");
    }
}
