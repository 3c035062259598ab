use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::model::{ResolvedTable, SourceEvent, StoryId};

/// Control markers in upstream choice text that render as a line break.
const LINE_BREAK_MARKERS: [&str; 2] = ["[br]", "<hr>"];

pub fn format_choice_text(text: &str) -> String {
    LINE_BREAK_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, "\n"))
}

/// Store `event` under every id in `story_ids`. Returns how many ids already
/// held a record.
///
/// Upstream lists one entry per support card rarity, so the same story id can
/// resolve more than once; the later record replaces the earlier one. A
/// replacement whose choices differ is recorded as a diagnostic.
pub fn fold_into(
    table: &mut ResolvedTable,
    event: &SourceEvent,
    story_ids: &[StoryId],
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut overwritten = 0;
    for &story_id in story_ids {
        if let Some(previous) = table.insert(story_id, event.clone()) {
            overwritten += 1;
            if previous.choices != event.choices {
                diagnostics.record(Diagnostic::ConflictingDuplicate {
                    story_id,
                    replaced: previous.name,
                    kept: event.name.clone(),
                });
            }
        }
    }
    overwritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::model::{Choice, EventKind};

    fn event(name: &str, choice_text: &str) -> SourceEvent {
        SourceEvent {
            name: name.into(),
            chara_name: "キタサンブラック".into(),
            kind: EventKind::SupportCard,
            choices: vec![Choice {
                title: "上".into(),
                text: choice_text.into(),
            }],
        }
    }

    #[test]
    fn formats_both_markers() {
        assert_eq!(format_choice_text("体力+10[br]やる気アップ"), "体力+10\nやる気アップ");
        assert_eq!(format_choice_text("a<hr>b[br]c"), "a\nb\nc");
        assert_eq!(format_choice_text("plain"), "plain");
    }

    #[test]
    fn stores_every_id() {
        let mut table = ResolvedTable::new();
        let mut diags = Diagnostics::new();
        let n = fold_into(&mut table, &event("e", "t"), &[1, 2, 3], &mut diags);
        assert_eq!(n, 0);
        assert_eq!(table.len(), 3);
        assert!(diags.is_empty());
    }

    #[test]
    fn identical_rarity_variant_overwrites_silently() {
        let mut table = ResolvedTable::new();
        let mut diags = Diagnostics::new();
        fold_into(&mut table, &event("SR", "体力+10"), &[830001001], &mut diags);
        let n = fold_into(&mut table, &event("SSR", "体力+10"), &[830001001], &mut diags);
        assert_eq!(n, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(830001001).unwrap().name, "SSR");
        assert!(diags.is_empty());
    }

    #[test]
    fn differing_choices_overwrite_with_diagnostic() {
        let mut table = ResolvedTable::new();
        let mut diags = Diagnostics::new();
        fold_into(&mut table, &event("SR", "体力+10"), &[830001001], &mut diags);
        fold_into(&mut table, &event("SSR", "体力+15"), &[830001001], &mut diags);
        assert_eq!(table.get(830001001).unwrap().choices[0].text, "体力+15");
        assert_eq!(diags.count(DiagnosticKind::ConflictingDuplicate), 1);
    }

    #[test]
    fn export_formats_text_in_id_order() {
        let mut table = ResolvedTable::new();
        let mut diags = Diagnostics::new();
        fold_into(&mut table, &event("b", "x[br]y"), &[20], &mut diags);
        fold_into(&mut table, &event("a", "p<hr>q"), &[10], &mut diags);
        let out = table.export();
        assert_eq!(out.iter().map(|e| e.story_id).collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(out[0].choices[0].text, "p\nq");
        assert_eq!(out[1].choices[0].text, "x\ny");
        // Stored record keeps the raw text.
        assert_eq!(table.get(20).unwrap().choices[0].text, "x[br]y");
    }
}
