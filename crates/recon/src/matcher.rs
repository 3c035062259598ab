use std::collections::BTreeSet;

use crate::config::ExceptionTables;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::ReconError;
use crate::model::{CharaId, StoryId};
use crate::reference::ReferenceStore;

/// Event shared by every trainee; each gets its own copy of the story.
pub const DANCE_LESSON: &str = "ダンスレッスン";

/// Story ids for a character's own events start with one of these, followed
/// by the character id.
const CHARA_STORY_PREFIXES: [&str; 2] = ["50", "80"];

/// Build the story id of a character's dance lesson: `50{chara}506`.
pub fn dance_lesson_story_id(chara_id: CharaId) -> Option<StoryId> {
    format!("50{chara_id}506").parse().ok()
}

/// Whether `story_id` carries the prefix of `chara_id`.
pub fn has_chara_prefix(story_id: StoryId, chara_id: CharaId) -> bool {
    let id = story_id.to_string();
    CHARA_STORY_PREFIXES
        .iter()
        .any(|prefix| id.starts_with(&format!("{prefix}{chara_id}")))
}

// ---------------------------------------------------------------------------
// Tie-break ladder
// ---------------------------------------------------------------------------

/// One rule for narrowing several exact matches. Returns `None` for "no opinion".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep only the character's templated dance lesson id.
    DanceLessonTemplate,
    /// Keep every candidate when they equal a hand-verified set.
    PermittedDuplicate,
}

/// Evaluated in order; the first rule with an opinion decides.
pub const DEFAULT_TIE_BREAKERS: &[TieBreaker] =
    &[TieBreaker::DanceLessonTemplate, TieBreaker::PermittedDuplicate];

impl TieBreaker {
    pub fn resolve(
        self,
        event_name: &str,
        chara_id: Option<CharaId>,
        candidates: &[StoryId],
        tables: &ExceptionTables,
    ) -> Option<Vec<StoryId>> {
        match self {
            Self::DanceLessonTemplate => {
                if event_name != DANCE_LESSON {
                    return None;
                }
                let story_id = dance_lesson_story_id(chara_id?)?;
                candidates.contains(&story_id).then(|| vec![story_id])
            }
            Self::PermittedDuplicate => {
                let permitted = tables.permitted_duplicate(event_name, chara_id)?;
                let found: BTreeSet<StoryId> = candidates.iter().copied().collect();
                (&found == permitted).then(|| candidates.to_vec())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Looks a normalized event name up in the reference title table.
pub struct Matcher<'a> {
    store: &'a dyn ReferenceStore,
    tables: &'a ExceptionTables,
    tie_breakers: &'a [TieBreaker],
}

impl<'a> Matcher<'a> {
    pub fn new(store: &'a dyn ReferenceStore, tables: &'a ExceptionTables) -> Self {
        Self {
            store,
            tables,
            tie_breakers: DEFAULT_TIE_BREAKERS,
        }
    }

    pub fn with_tie_breakers(mut self, tie_breakers: &'a [TieBreaker]) -> Self {
        self.tie_breakers = tie_breakers;
        self
    }

    /// Story ids for `event_name`. Empty means the record is dropped; more
    /// than one id only comes from a tie-break rule.
    pub fn match_event(
        &self,
        event_name: &str,
        chara_id: Option<CharaId>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<StoryId>, ReconError> {
        let exact = self.store.story_ids_by_text(event_name)?;

        match exact.len() {
            0 => self.match_substring(event_name, chara_id, diagnostics),
            1 => Ok(exact),
            _ => Ok(self.break_tie(event_name, chara_id, exact, diagnostics)),
        }
    }

    fn match_substring(
        &self,
        event_name: &str,
        chara_id: Option<CharaId>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<StoryId>, ReconError> {
        // An empty needle would match every title.
        let rows = if event_name.is_empty() {
            Vec::new()
        } else {
            self.store.stories_containing(event_name)?
        };

        if let [(story_id, text)] = rows.as_slice() {
            if let Some(chara_id) = chara_id {
                if !has_chara_prefix(*story_id, chara_id) {
                    diagnostics.record(Diagnostic::FuzzyMatch {
                        event_name: event_name.to_string(),
                        chara_id,
                        story_id: *story_id,
                        text: text.clone(),
                    });
                }
            }
            return Ok(vec![*story_id]);
        }

        diagnostics.record(Diagnostic::UnknownEvent {
            event_name: event_name.to_string(),
            chara_id,
            fuzzy_candidates: rows.len(),
        });
        Ok(Vec::new())
    }

    fn break_tie(
        &self,
        event_name: &str,
        chara_id: Option<CharaId>,
        candidates: Vec<StoryId>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<StoryId> {
        for rule in self.tie_breakers {
            if let Some(resolved) = rule.resolve(event_name, chara_id, &candidates, self.tables) {
                tracing::debug!(event_name, ?rule, ?resolved, "tie broken");
                return resolved;
            }
        }

        diagnostics.record(Diagnostic::Ambiguous {
            event_name: event_name.to_string(),
            chara_id,
            candidates,
        });
        Vec::new()
    }
}
