//! Structured record of every anomaly seen during a run.
//!
//! Diagnostics never stop a run. The engine appends them in the order they
//! occur; callers decide how to surface them (log lines, counts, JSON).

use std::fmt;

use serde::Serialize;

use crate::model::{CharaId, StoryId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Display name has no entry in the character index. Reported once per name.
    UnknownCharacter { chara_name: String },
    /// Upstream kind code outside `c` / `s` / `m`. The record is still processed.
    UnknownEventKind { code: String, event_name: String },
    /// No exact match and no unique substring match. Record dropped.
    UnknownEvent {
        event_name: String,
        chara_id: Option<CharaId>,
        fuzzy_candidates: usize,
    },
    /// Accepted a unique substring match whose story id does not carry the
    /// character's prefix.
    FuzzyMatch {
        event_name: String,
        chara_id: CharaId,
        story_id: StoryId,
        text: String,
    },
    /// Several exact matches and no tie-break applied. Record dropped.
    Ambiguous {
        event_name: String,
        chara_id: Option<CharaId>,
        candidates: Vec<StoryId>,
    },
    /// A story id was resolved twice with different choices; the later record won.
    ConflictingDuplicate {
        story_id: StoryId,
        replaced: String,
        kept: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnknownCharacter,
    UnknownEventKind,
    UnknownEvent,
    FuzzyMatch,
    Ambiguous,
    ConflictingDuplicate,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter => write!(f, "unknown_character"),
            Self::UnknownEventKind => write!(f, "unknown_event_kind"),
            Self::UnknownEvent => write!(f, "unknown_event"),
            Self::FuzzyMatch => write!(f, "fuzzy_match"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::ConflictingDuplicate => write!(f, "conflicting_duplicate"),
        }
    }
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::UnknownCharacter { .. } => DiagnosticKind::UnknownCharacter,
            Self::UnknownEventKind { .. } => DiagnosticKind::UnknownEventKind,
            Self::UnknownEvent { .. } => DiagnosticKind::UnknownEvent,
            Self::FuzzyMatch { .. } => DiagnosticKind::FuzzyMatch,
            Self::Ambiguous { .. } => DiagnosticKind::Ambiguous,
            Self::ConflictingDuplicate { .. } => DiagnosticKind::ConflictingDuplicate,
        }
    }
}

fn chara(chara_id: &Option<CharaId>) -> String {
    chara_id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter { chara_name } => {
                write!(f, "unknown event chara: {chara_name}")
            }
            Self::UnknownEventKind { code, event_name } => {
                write!(f, "unknown event type '{code}' on event {event_name}")
            }
            Self::UnknownEvent { event_name, chara_id, fuzzy_candidates } => write!(
                f,
                "unknown event {event_name} for chara {} ({fuzzy_candidates} substring candidates)",
                chara(chara_id)
            ),
            Self::FuzzyMatch { event_name, chara_id, story_id, text } => write!(
                f,
                "fuzzily mapped {event_name} for chara {chara_id} to {story_id} {text}"
            ),
            Self::Ambiguous { event_name, chara_id, candidates } => write!(
                f,
                "more than one event for {event_name} (chara {}): {candidates:?}",
                chara(chara_id)
            ),
            Self::ConflictingDuplicate { story_id, replaced, kept } => write!(
                f,
                "story {story_id} resolved twice with different choices: {replaced} replaced by {kept}"
            ),
        }
    }
}

/// Append-only diagnostic sink threaded through one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind(), "{diagnostic}");
        self.events.push(diagnostic);
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.iter().filter(|d| d.kind() == kind).count()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.events
    }
}
