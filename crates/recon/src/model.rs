use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;

/// Numeric key of one narrative event in the reference text table.
pub type StoryId = i64;

/// Numeric key of a character in the reference text table.
pub type CharaId = i64;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub title: String,
    pub text: String,
}

/// Which pool an upstream event belongs to, from its single-letter code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `c`
    Character,
    /// `s`
    SupportCard,
    /// `m`
    Scenario,
    /// Any other code. Kept so the record can still be matched.
    Unknown(String),
}

impl EventKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => Self::Character,
            "s" => Self::SupportCard,
            "m" => Self::Scenario,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Character => "c",
            Self::SupportCard => "s",
            Self::Scenario => "m",
            Self::Unknown(code) => code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character => write!(f, "character"),
            Self::SupportCard => write!(f, "support_card"),
            Self::Scenario => write!(f, "scenario"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// One scraped upstream record. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    pub name: String,
    /// Display name as scraped; may carry a qualifier such as `(新衣装)`.
    pub chara_name: String,
    pub kind: EventKind,
    pub choices: Vec<Choice>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Story id → the source record chosen for it.
///
/// Holds at most one record per story id; a later insert for the same id
/// replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTable {
    entries: BTreeMap<StoryId, SourceEvent>,
}

impl ResolvedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record that was replaced, if any.
    pub(crate) fn insert(&mut self, story_id: StoryId, event: SourceEvent) -> Option<SourceEvent> {
        self.entries.insert(story_id, event)
    }

    pub fn get(&self, story_id: StoryId) -> Option<&SourceEvent> {
        self.entries.get(&story_id)
    }

    pub fn contains(&self, story_id: StoryId) -> bool {
        self.entries.contains_key(&story_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending story id order.
    pub fn iter(&self) -> impl Iterator<Item = (StoryId, &SourceEvent)> {
        self.entries.iter().map(|(id, ev)| (*id, ev))
    }

    /// Emit the table as output events with display-formatted choice text.
    pub fn export(&self) -> Vec<ResolvedEvent> {
        self.iter()
            .map(|(story_id, event)| ResolvedEvent {
                story_id,
                choices: event
                    .choices
                    .iter()
                    .map(|c| Choice {
                        title: c.title.clone(),
                        text: crate::aggregate::format_choice_text(&c.text),
                    })
                    .collect(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEvent {
    pub story_id: StoryId,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_records: usize,
    pub excluded_records: usize,
    pub matched_records: usize,
    pub dropped_records: usize,
    pub resolved_story_ids: usize,
    pub overwritten_story_ids: usize,
    pub diagnostic_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct ReconResult {
    pub table: ResolvedTable,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: RunSummary,
}
