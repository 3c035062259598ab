use crate::config::ExceptionTables;
use crate::model::CharaId;

/// Outcome of the exclusion check that runs before any matching work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    /// Name is excluded for every character.
    ExcludedName,
    /// (name, character) pair is excluded.
    ExcludedForChara,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Self::Admit
    }
}

/// `event_name` must already be NFC-composed; exclusion keys are stored composed.
pub fn admit(tables: &ExceptionTables, event_name: &str, chara_id: Option<CharaId>) -> Admission {
    if tables.is_excluded_name(event_name) {
        Admission::ExcludedName
    } else if tables.is_chara_excluded(event_name, chara_id) {
        Admission::ExcludedForChara
    } else {
        Admission::Admit
    }
}
