use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One output row: repository overlap identifiers, PR metadata, and every
/// per-PR analysis counter. Column order matches the declaration order.
/// The two nested maps are JSON-encoded strings inside their CSV columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub repo_name: String,
    pub v1_commit: String,
    pub v2_commit: String,
    pub v1_date: DateTime<Utc>,
    pub v2_date: DateTime<Utc>,
    pub pr_number: u64,
    pub pr_title: String,
    pub pr_url: String,
    pub merge_date: DateTime<Utc>,
    pub author: String,
    pub files_changed: u64,
    pub api_additions: u64,
    pub api_deletions: u64,
    pub files_added: u64,
    pub files_modified: u64,
    pub files_deleted: u64,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub code_additions: u64,
    pub code_deletions: u64,
    pub comment_additions: u64,
    pub comment_deletions: u64,
    #[serde(with = "json_map")]
    pub languages_changed: BTreeMap<String, u64>,
    #[serde(with = "json_map")]
    pub change_types: BTreeMap<String, u64>,
    pub imports_added: u64,
    pub functions_added: u64,
    pub classes_added: u64,
    pub test_changes: u64,
}

/// Serialize a map as a JSON string so it survives a flat CSV column.
mod json_map {
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded = serde_json::to_string(map).map_err(S::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, u64>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        serde_json::from_str(&encoded).map_err(D::Error::custom)
    }
}

/// Run-wide totals and averages over the full record collection.
/// Computed once at the end; an empty collection yields no summary at all.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryStatistics {
    pub total_prs_analyzed: u64,
    pub total_repos: u64,
    pub total_files_changed: u64,
    pub total_files_added: u64,
    pub total_files_modified: u64,
    pub total_files_deleted: u64,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub total_code_additions: u64,
    pub total_code_deletions: u64,
    pub total_comment_additions: u64,
    pub total_comment_deletions: u64,
    pub total_imports_added: u64,
    pub total_functions_added: u64,
    pub total_classes_added: u64,
    pub total_test_changes: u64,
    pub avg_files_per_pr: f64,
    pub avg_lines_added_per_pr: f64,
    pub avg_lines_removed_per_pr: f64,
}

impl SummaryStatistics {
    /// Fold the record collection into totals and per-PR averages.
    /// Returns None on an empty collection — no data, not a division fault.
    pub fn compute(records: &[AnalysisRecord]) -> Option<SummaryStatistics> {
        if records.is_empty() {
            return None;
        }

        let count = records.len() as u64;
        let repos: HashSet<&str> = records.iter().map(|r| r.repo_name.as_str()).collect();
        let sum = |field: fn(&AnalysisRecord) -> u64| records.iter().map(field).sum::<u64>();

        let total_files_changed = sum(|r| r.files_changed);
        let total_lines_added = sum(|r| r.total_lines_added);
        let total_lines_removed = sum(|r| r.total_lines_removed);

        Some(SummaryStatistics {
            total_prs_analyzed: count,
            total_repos: repos.len() as u64,
            total_files_changed,
            total_files_added: sum(|r| r.files_added),
            total_files_modified: sum(|r| r.files_modified),
            total_files_deleted: sum(|r| r.files_deleted),
            total_lines_added,
            total_lines_removed,
            total_code_additions: sum(|r| r.code_additions),
            total_code_deletions: sum(|r| r.code_deletions),
            total_comment_additions: sum(|r| r.comment_additions),
            total_comment_deletions: sum(|r| r.comment_deletions),
            total_imports_added: sum(|r| r.imports_added),
            total_functions_added: sum(|r| r.functions_added),
            total_classes_added: sum(|r| r.classes_added),
            total_test_changes: sum(|r| r.test_changes),
            avg_files_per_pr: total_files_changed as f64 / count as f64,
            avg_lines_added_per_pr: total_lines_added as f64 / count as f64,
            avg_lines_removed_per_pr: total_lines_removed as f64 / count as f64,
        })
    }
}

/// Processed/skipped counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    pub processed_repos: u64,
    pub skipped_repos: u64,
    pub prs_analyzed: u64,
    pub prs_skipped: u64,
}

#[cfg(test)]
pub(crate) fn sample_record(repo_name: &str, pr_number: u64) -> AnalysisRecord {
    use crate::scan::parse_timestamp;

    let mut languages_changed = BTreeMap::new();
    languages_changed.insert("Python".to_string(), 3);
    languages_changed.insert("JavaScript".to_string(), 1);
    let mut change_types = BTreeMap::new();
    change_types.insert("modification".to_string(), 4);

    AnalysisRecord {
        repo_name: repo_name.to_string(),
        v1_commit: "abc1234".to_string(),
        v2_commit: "def5678".to_string(),
        v1_date: parse_timestamp("2020-01-01T00:00:00Z").unwrap(),
        v2_date: parse_timestamp("2020-06-01T00:00:00Z").unwrap(),
        pr_number,
        pr_title: "Fix the retry loop, \"quoted\"".to_string(),
        pr_url: format!("https://github.com/{repo_name}/pull/{pr_number}"),
        merge_date: parse_timestamp("2020-03-01T12:00:00Z").unwrap(),
        author: "alice".to_string(),
        files_changed: 4,
        api_additions: 12,
        api_deletions: 3,
        files_added: 1,
        files_modified: 2,
        files_deleted: 1,
        total_lines_added: 10,
        total_lines_removed: 5,
        code_additions: 8,
        code_deletions: 4,
        comment_additions: 2,
        comment_deletions: 1,
        languages_changed,
        change_types,
        imports_added: 1,
        functions_added: 2,
        classes_added: 0,
        test_changes: 1,
    }
}
