//! The read-only reference data the engine consults.

use crate::error::ReconError;
use crate::model::{CharaId, StoryId};

/// Queries the engine issues against the reference text table.
///
/// Implementations scope every story query to event titles; character
/// enumeration is scoped to character display names. Any error aborts the run.
pub trait ReferenceStore {
    /// Every (display name, character id) pair.
    fn character_names(&self) -> Result<Vec<(String, CharaId)>, ReconError>;

    /// Story ids whose title text equals `text`.
    fn story_ids_by_text(&self, text: &str) -> Result<Vec<StoryId>, ReconError>;

    /// (story id, title text) for every title that contains `text`.
    fn stories_containing(&self, text: &str) -> Result<Vec<(StoryId, String)>, ReconError>;
}

/// In-memory reference data, used by tests and by callers that already hold
/// the table contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    characters: Vec<(String, CharaId)>,
    stories: Vec<(StoryId, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, name: &str, chara_id: CharaId) -> Self {
        self.characters.push((name.to_string(), chara_id));
        self
    }

    pub fn with_story(mut self, story_id: StoryId, text: &str) -> Self {
        self.stories.push((story_id, text.to_string()));
        self
    }
}

impl ReferenceStore for MemoryStore {
    fn character_names(&self) -> Result<Vec<(String, CharaId)>, ReconError> {
        Ok(self.characters.clone())
    }

    fn story_ids_by_text(&self, text: &str) -> Result<Vec<StoryId>, ReconError> {
        Ok(self
            .stories
            .iter()
            .filter(|(_, t)| t == text)
            .map(|(id, _)| *id)
            .collect())
    }

    fn stories_containing(&self, text: &str) -> Result<Vec<(StoryId, String)>, ReconError> {
        Ok(self
            .stories
            .iter()
            .filter(|(_, t)| t.contains(text))
            .cloned()
            .collect())
    }
}
