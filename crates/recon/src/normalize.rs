//! Event name canonicalization.
//!
//! Steps, in order:
//! 1. Unicode NFC
//! 2. Punctuation variants → the forms the reference table uses
//! 3. Removable suffixes stripped
//! 4. Per-(name, character) override

use unicode_normalization::UnicodeNormalization;

use crate::config::ExceptionTables;
use crate::model::CharaId;

/// Halfwidth katakana middle dot and its reference-table form.
pub const MIDDLE_DOT_VARIANT: (char, char) = ('\u{FF65}', '\u{30FB}');
/// ASCII tilde and the fullwidth wave used by the reference table.
pub const WAVE_DASH_VARIANT: (char, char) = ('~', '\u{FF5E}');

/// Step 1 only. Exclusion checks run on this form.
pub fn compose(name: &str) -> String {
    name.nfc().collect()
}

fn replace_variants(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == MIDDLE_DOT_VARIANT.0 {
                MIDDLE_DOT_VARIANT.1
            } else if c == WAVE_DASH_VARIANT.0 {
                WAVE_DASH_VARIANT.1
            } else {
                c
            }
        })
        .collect()
}

fn strip_suffixes<'a>(mut name: &'a str, suffixes: &[String]) -> &'a str {
    loop {
        let before = name.len();
        for suffix in suffixes {
            if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
                name = stripped;
            }
        }
        if name.len() == before {
            return name;
        }
    }
}

/// Map a raw event name to the key looked up in the reference table.
pub fn normalize_event_name(
    raw: &str,
    chara_id: Option<CharaId>,
    tables: &ExceptionTables,
) -> String {
    let composed = compose(raw);
    let replaced = replace_variants(&composed);
    let stripped = strip_suffixes(&replaced, tables.removable_suffixes());

    match tables.override_for(stripped, chara_id) {
        Some(canonical) => canonical.to_string(),
        None => stripped.to_string(),
    }
}
