use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ExceptionTables;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::ReconError;
use crate::model::CharaId;
use crate::reference::ReferenceStore;

// Outfit / variant qualifiers such as `(新衣装)`.
static QUALIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.+\)").expect("static regex"));

/// Strip the parenthesised qualifier from a scraped display name.
pub fn strip_qualifier(display_name: &str) -> Cow<'_, str> {
    QUALIFIER.replace_all(display_name, "")
}

/// Character display name → character id, built once per run.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    ids: HashMap<String, CharaId>,
}

impl NameIndex {
    /// Later pairs for the same name win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, CharaId)>) -> Self {
        Self {
            ids: pairs.into_iter().collect(),
        }
    }

    pub fn load(store: &dyn ReferenceStore) -> Result<Self, ReconError> {
        let index = Self::from_pairs(store.character_names()?);
        tracing::debug!(characters = index.len(), "loaded character name index");
        Ok(index)
    }

    pub fn lookup(&self, name: &str) -> Option<CharaId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolves scraped display names against a [`NameIndex`], reporting each
/// unresolved name once.
pub struct CharaResolver<'a> {
    index: &'a NameIndex,
    tables: &'a ExceptionTables,
    reported: HashSet<String>,
}

impl<'a> CharaResolver<'a> {
    pub fn new(index: &'a NameIndex, tables: &'a ExceptionTables) -> Self {
        Self {
            index,
            tables,
            reported: HashSet::new(),
        }
    }

    pub fn resolve(&mut self, display_name: &str, diagnostics: &mut Diagnostics) -> Option<CharaId> {
        let name = strip_qualifier(display_name);
        let chara_id = self.index.lookup(&name);
        if chara_id.is_none()
            && !self.tables.is_ignored_chara_name(&name)
            && self.reported.insert(name.to_string())
        {
            diagnostics.record(Diagnostic::UnknownCharacter {
                chara_name: name.into_owned(),
            });
        }
        chara_id
    }
}
