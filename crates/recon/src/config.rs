use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::ReconError;
use crate::model::{CharaId, StoryId};

const BUILTIN_TABLES: &str = include_str!("../data/exceptions.toml");

/// (event name, character id). `None` keys events with no registered character.
pub type NameKey = (String, Option<CharaId>);

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDocument {
    #[serde(default)]
    excluded_names: Vec<String>,
    #[serde(default)]
    ignored_chara_names: Vec<String>,
    #[serde(default)]
    removable_suffixes: Vec<String>,
    #[serde(default)]
    chara_exclusions: Vec<CharaExclusionEntry>,
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
    #[serde(default)]
    permitted_duplicates: Vec<PermittedDuplicateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CharaExclusionEntry {
    name: String,
    #[serde(default)]
    chara_id: Option<CharaId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverrideEntry {
    name: String,
    #[serde(default)]
    chara_id: Option<CharaId>,
    canonical: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PermittedDuplicateEntry {
    name: String,
    #[serde(default)]
    chara_id: Option<CharaId>,
    story_ids: Vec<StoryId>,
}

// ---------------------------------------------------------------------------
// Loaded tables
// ---------------------------------------------------------------------------

/// Immutable exception data consulted by the exclusion filter, the normalizer
/// and the matcher's tie-break ladder.
///
/// Key names are stored NFC-composed so lookups agree with normalized input.
#[derive(Debug, Clone, Default)]
pub struct ExceptionTables {
    excluded_names: HashSet<String>,
    ignored_chara_names: HashSet<String>,
    removable_suffixes: Vec<String>,
    chara_exclusions: HashSet<NameKey>,
    overrides: HashMap<NameKey, String>,
    permitted_duplicates: HashMap<NameKey, BTreeSet<StoryId>>,
}

/// Entry counts, for `check-exceptions` and startup logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TableCounts {
    pub excluded_names: usize,
    pub ignored_chara_names: usize,
    pub removable_suffixes: usize,
    pub chara_exclusions: usize,
    pub overrides: usize,
    pub permitted_duplicates: usize,
}

fn compose(s: &str) -> String {
    s.nfc().collect()
}

impl ExceptionTables {
    /// The tables shipped with the crate.
    pub fn builtin() -> Result<Self, ReconError> {
        Self::from_toml(BUILTIN_TABLES)
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let doc: TableDocument =
            toml::from_str(input).map_err(|e| ReconError::TableParse(e.to_string()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: TableDocument) -> Result<Self, ReconError> {
        let mut tables = ExceptionTables::default();

        for name in doc.excluded_names {
            non_empty("excluded_names", &name)?;
            tables.excluded_names.insert(compose(&name));
        }

        for name in doc.ignored_chara_names {
            non_empty("ignored_chara_names", &name)?;
            tables.ignored_chara_names.insert(name);
        }

        for suffix in doc.removable_suffixes {
            non_empty("removable_suffixes", &suffix)?;
            let suffix = compose(&suffix);
            if !tables.removable_suffixes.contains(&suffix) {
                tables.removable_suffixes.push(suffix);
            }
        }

        for entry in doc.chara_exclusions {
            non_empty("chara_exclusions", &entry.name)?;
            let key = (compose(&entry.name), entry.chara_id);
            if !tables.chara_exclusions.insert(key) {
                return Err(repeated("chara_exclusions", &entry.name, entry.chara_id));
            }
        }

        for entry in doc.overrides {
            non_empty("overrides", &entry.name)?;
            non_empty("overrides.canonical", &entry.canonical)?;
            let key = (compose(&entry.name), entry.chara_id);
            if tables.overrides.insert(key, entry.canonical).is_some() {
                return Err(repeated("overrides", &entry.name, entry.chara_id));
            }
        }

        for entry in doc.permitted_duplicates {
            non_empty("permitted_duplicates", &entry.name)?;
            let ids: BTreeSet<StoryId> = entry.story_ids.iter().copied().collect();
            if ids.len() < 2 {
                return Err(ReconError::TableValidation(format!(
                    "permitted_duplicates: '{}' must list at least 2 distinct story ids",
                    entry.name
                )));
            }
            let key = (compose(&entry.name), entry.chara_id);
            if tables.permitted_duplicates.insert(key, ids).is_some() {
                return Err(repeated("permitted_duplicates", &entry.name, entry.chara_id));
            }
        }

        Ok(tables)
    }

    pub fn is_excluded_name(&self, event_name: &str) -> bool {
        self.excluded_names.contains(event_name)
    }

    pub fn is_chara_excluded(&self, event_name: &str, chara_id: Option<CharaId>) -> bool {
        self.chara_exclusions.contains(&(event_name.to_string(), chara_id))
    }

    pub fn is_ignored_chara_name(&self, chara_name: &str) -> bool {
        self.ignored_chara_names.contains(chara_name)
    }

    pub fn removable_suffixes(&self) -> &[String] {
        &self.removable_suffixes
    }

    pub fn override_for(&self, event_name: &str, chara_id: Option<CharaId>) -> Option<&str> {
        self.overrides
            .get(&(event_name.to_string(), chara_id))
            .map(String::as_str)
    }

    pub fn permitted_duplicate(
        &self,
        event_name: &str,
        chara_id: Option<CharaId>,
    ) -> Option<&BTreeSet<StoryId>> {
        self.permitted_duplicates.get(&(event_name.to_string(), chara_id))
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            excluded_names: self.excluded_names.len(),
            ignored_chara_names: self.ignored_chara_names.len(),
            removable_suffixes: self.removable_suffixes.len(),
            chara_exclusions: self.chara_exclusions.len(),
            overrides: self.overrides.len(),
            permitted_duplicates: self.permitted_duplicates.len(),
        }
    }
}

fn non_empty(table: &str, value: &str) -> Result<(), ReconError> {
    if value.trim().is_empty() {
        return Err(ReconError::TableValidation(format!("{table}: empty name")));
    }
    Ok(())
}

fn repeated(table: &str, name: &str, chara_id: Option<CharaId>) -> ReconError {
    let chara = chara_id.map_or_else(|| "none".to_string(), |id| id.to_string());
    ReconError::TableValidation(format!("{table}: duplicate key ('{name}', {chara})"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_load() {
        let tables = ExceptionTables::builtin().unwrap();
        let counts = tables.counts();
        assert_eq!(counts.excluded_names, 11);
        assert_eq!(counts.chara_exclusions, 1);
        assert_eq!(counts.permitted_duplicates, 4);
        assert_eq!(counts.overrides, 34);
        assert!(tables.is_excluded_name("追加の自主トレ"));
        assert!(tables.is_chara_excluded("夏合宿(3年目)終了", Some(1007)));
        assert!(!tables.is_chara_excluded("夏合宿(3年目)終了", Some(1008)));
        assert!(tables.is_ignored_chara_name("URA"));
        assert_eq!(
            tables.override_for("楽しめ！一番", Some(1009)),
            Some("楽しめ！　1番！")
        );
        assert_eq!(tables.override_for("楽しめ！一番", Some(1010)), None);
    }

    #[test]
    fn permitted_duplicate_without_chara() {
        let tables = ExceptionTables::builtin().unwrap();
        let ids = tables.permitted_duplicate("上々の面構えッ！", None).unwrap();
        assert_eq!(ids.iter().copied().collect::<Vec<_>>(), vec![400001024, 400001037]);
        assert!(tables.permitted_duplicate("上々の面構えッ！", Some(1001)).is_none());
    }

    #[test]
    fn keys_are_composed() {
        // "ガ" written as カ + combining dakuten
        let input = "excluded_names = [\"\u{30AB}\u{3099}ッツ\"]\n";
        let tables = ExceptionTables::from_toml(input).unwrap();
        assert!(tables.is_excluded_name("\u{30AC}ッツ"));
    }

    #[test]
    fn empty_document_is_valid() {
        let tables = ExceptionTables::from_toml("").unwrap();
        assert_eq!(tables.counts().overrides, 0);
        assert!(tables.removable_suffixes().is_empty());
    }

    #[test]
    fn reject_unknown_field() {
        let err = ExceptionTables::from_toml("excluded = [\"a\"]\n").unwrap_err();
        assert!(matches!(err, ReconError::TableParse(_)));
    }

    #[test]
    fn reject_short_duplicate_set() {
        let input = r#"
[[permitted_duplicates]]
name = "x"
chara_id = 1001
story_ids = [501001001, 501001001]
"#;
        let err = ExceptionTables::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn reject_repeated_override_key() {
        let input = r#"
[[overrides]]
name = "a"
chara_id = 1001
canonical = "b"

[[overrides]]
name = "a"
chara_id = 1001
canonical = "c"
"#;
        let err = ExceptionTables::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate key ('a', 1001)"));
    }

    #[test]
    fn reject_empty_name() {
        let err = ExceptionTables::from_toml("excluded_names = [\"  \"]\n").unwrap_err();
        assert!(matches!(err, ReconError::TableValidation(_)));
    }

    #[test]
    fn same_name_different_chara_is_distinct() {
        let input = r#"
[[overrides]]
name = "a"
chara_id = 1001
canonical = "b"

[[overrides]]
name = "a"
canonical = "c"
"#;
        let tables = ExceptionTables::from_toml(input).unwrap();
        assert_eq!(tables.override_for("a", Some(1001)), Some("b"));
        assert_eq!(tables.override_for("a", None), Some("c"));
    }
}
