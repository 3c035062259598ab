use std::collections::BTreeMap;

use crate::diagnostic::Diagnostic;
use crate::model::{ResolvedTable, RunSummary};

/// Per-record tallies kept by the engine loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCounts {
    pub total: usize,
    pub excluded: usize,
    pub matched: usize,
    pub dropped: usize,
    pub overwritten: usize,
}

/// Compute summary statistics for a finished run.
pub fn compute_summary(
    counts: RecordCounts,
    table: &ResolvedTable,
    diagnostics: &[Diagnostic],
) -> RunSummary {
    let mut diagnostic_counts: BTreeMap<String, usize> = BTreeMap::new();
    for d in diagnostics {
        *diagnostic_counts.entry(d.kind().to_string()).or_insert(0) += 1;
    }

    RunSummary {
        total_records: counts.total,
        excluded_records: counts.excluded,
        matched_records: counts.matched,
        dropped_records: counts.dropped,
        resolved_story_ids: table.len(),
        overwritten_story_ids: counts.overwritten,
        diagnostic_counts,
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records: {} matched, {} dropped, {} excluded; {} story ids ({} overwritten), {} diagnostics",
            self.total_records,
            self.matched_records,
            self.dropped_records,
            self.excluded_records,
            self.resolved_story_ids,
            self.overwritten_story_ids,
            self.diagnostic_counts.values().sum::<usize>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let diagnostics = vec![
            Diagnostic::UnknownCharacter { chara_name: "a".into() },
            Diagnostic::Ambiguous {
                event_name: "x".into(),
                chara_id: Some(1001),
                candidates: vec![1, 2],
            },
            Diagnostic::Ambiguous {
                event_name: "y".into(),
                chara_id: None,
                candidates: vec![3, 4],
            },
        ];
        let counts = RecordCounts {
            total: 10,
            excluded: 2,
            matched: 6,
            dropped: 2,
            overwritten: 1,
        };
        let summary = compute_summary(counts, &ResolvedTable::new(), &diagnostics);
        assert_eq!(summary.total_records, 10);
        assert_eq!(summary.matched_records, 6);
        assert_eq!(summary.resolved_story_ids, 0);
        assert_eq!(summary.diagnostic_counts["ambiguous"], 2);
        assert_eq!(summary.diagnostic_counts["unknown_character"], 1);
        assert!(summary.to_string().starts_with("10 records"));
    }
}
