use crate::aggregate::fold_into;
use crate::config::ExceptionTables;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::ReconError;
use crate::evidence::{compute_summary, RecordCounts};
use crate::exclusion::{admit, Admission};
use crate::matcher::Matcher;
use crate::model::{ReconResult, ResolvedTable, SourceEvent};
use crate::names::{CharaResolver, NameIndex};
use crate::normalize::{compose, normalize_event_name};
use crate::reference::ReferenceStore;

/// Resolve every record against the reference store.
///
/// Unresolvable and ambiguous records are dropped with a diagnostic. Only a
/// reference store failure returns `Err`, and then nothing is returned.
pub fn run(
    tables: &ExceptionTables,
    store: &dyn ReferenceStore,
    events: &[SourceEvent],
) -> Result<ReconResult, ReconError> {
    let index = NameIndex::load(store)?;
    run_with_index(tables, store, &index, events)
}

/// As [`run`], with a prebuilt character index.
pub fn run_with_index(
    tables: &ExceptionTables,
    store: &dyn ReferenceStore,
    index: &NameIndex,
    events: &[SourceEvent],
) -> Result<ReconResult, ReconError> {
    let matcher = Matcher::new(store, tables);
    let mut resolver = CharaResolver::new(index, tables);
    let mut diagnostics = Diagnostics::new();
    let mut table = ResolvedTable::new();
    let mut counts = RecordCounts {
        total: events.len(),
        ..RecordCounts::default()
    };

    for event in events {
        let composed = compose(&event.name);

        if !event.kind.is_known() {
            diagnostics.record(Diagnostic::UnknownEventKind {
                code: event.kind.code().to_string(),
                event_name: composed.clone(),
            });
        }

        let chara_id = resolver.resolve(&event.chara_name, &mut diagnostics);

        let admission = admit(tables, &composed, chara_id);
        if admission != Admission::Admit {
            tracing::debug!(event_name = %composed, ?chara_id, ?admission, "excluded");
            counts.excluded += 1;
            continue;
        }

        let key = normalize_event_name(&composed, chara_id, tables);
        let story_ids = matcher.match_event(&key, chara_id, &mut diagnostics)?;
        if story_ids.is_empty() {
            counts.dropped += 1;
            continue;
        }

        counts.matched += 1;
        counts.overwritten += fold_into(&mut table, event, &story_ids, &mut diagnostics);
    }

    let diagnostics = diagnostics.into_vec();
    let summary = compute_summary(counts, &table, &diagnostics);

    Ok(ReconResult {
        table,
        diagnostics,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::model::{Choice, EventKind};
    use crate::reference::MemoryStore;

    fn event(name: &str, chara: &str, kind: &str) -> SourceEvent {
        SourceEvent {
            name: name.into(),
            chara_name: chara.into(),
            kind: EventKind::from_code(kind),
            choices: vec![Choice {
                title: "選択肢".into(),
                text: "体力+10".into(),
            }],
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_character("ダイワスカーレット", 1009)
            .with_character("ゴールドシップ", 1007)
            .with_story(501009506, "ダンスレッスン")
            .with_story(501007506, "ダンスレッスン")
            .with_story(501009101, "一番の証明")
    }

    #[test]
    fn unknown_kind_is_reported_and_still_matched() {
        let tables = ExceptionTables::builtin().unwrap();
        let events = vec![event("一番の証明", "ダイワスカーレット", "x")];
        let result = run(&tables, &store(), &events).unwrap();
        assert!(result.table.contains(501009101));
        assert_eq!(
            result.summary.diagnostic_counts[&DiagnosticKind::UnknownEventKind.to_string()],
            1
        );
    }

    #[test]
    fn qualifier_resolves_chara_for_dance_lesson() {
        let tables = ExceptionTables::builtin().unwrap();
        let events = vec![
            event("ダンスレッスン", "ダイワスカーレット(新衣装)", "c"),
            event("ダンスレッスン", "ゴールドシップ", "c"),
        ];
        let result = run(&tables, &store(), &events).unwrap();
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.get(501009506).unwrap().chara_name, "ダイワスカーレット(新衣装)");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn counts_add_up() {
        let tables = ExceptionTables::builtin().unwrap();
        let events = vec![
            event("一番の証明", "ダイワスカーレット", "c"),
            event("追加の自主トレ", "ダイワスカーレット", "c"),
            event("どこにもない", "ダイワスカーレット", "c"),
        ];
        let result = run(&tables, &store(), &events).unwrap();
        let s = &result.summary;
        assert_eq!(s.total_records, 3);
        assert_eq!(s.matched_records, 1);
        assert_eq!(s.excluded_records, 1);
        assert_eq!(s.dropped_records, 1);
        assert_eq!(s.matched_records + s.excluded_records + s.dropped_records, s.total_records);
    }
}
