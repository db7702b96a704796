pub mod types;

pub use types::{AnalysisRecord, RunStats, SummaryStatistics};

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write output file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to encode records: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output column set, in order. serde derives the same order from the
/// record struct; this list exists so an empty run still writes a header.
const RECORD_COLUMNS: [&str; 28] = [
    "repo_name", "v1_commit", "v2_commit", "v1_date", "v2_date",
    "pr_number", "pr_title", "pr_url", "merge_date", "author",
    "files_changed", "api_additions", "api_deletions",
    "files_added", "files_modified", "files_deleted",
    "total_lines_added", "total_lines_removed",
    "code_additions", "code_deletions",
    "comment_additions", "comment_deletions",
    "languages_changed", "change_types",
    "imports_added", "functions_added", "classes_added", "test_changes",
];

/// Write the full record collection to a CSV file.
///
/// Called only once the collection is fully assembled, so a crashed run
/// never leaves a half-written file behind. An empty collection still gets
/// a header so the output stays structurally valid.
pub fn write_records(path: &Path, records: &[AnalysisRecord]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(RECORD_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), records = records.len(), "saved analysis records");
    Ok(())
}

/// Read a record CSV back into memory.
#[allow(dead_code)] // Exercised by round-trip tests; kept for downstream consumers
pub fn read_records(path: &Path) -> Result<Vec<AnalysisRecord>, ReportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    debug!(path = %path.display(), records = records.len(), "read analysis records");
    Ok(records)
}

/// Write summary statistics as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &SummaryStatistics) -> Result<(), ReportError> {
    let encoded = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, encoded)?;
    info!(path = %path.display(), "saved summary statistics");
    Ok(())
}

/// Print the summary to the terminal.
pub fn print_summary(summary: &SummaryStatistics) {
    println!();
    println!("{}", "═══ Summary Statistics ═══".bold());
    println!("PRs analyzed:        {}", summary.total_prs_analyzed);
    println!("Repositories:        {}", summary.total_repos);
    println!(
        "Files changed:       {} (+{} ~{} -{})",
        summary.total_files_changed,
        summary.total_files_added,
        summary.total_files_modified,
        summary.total_files_deleted
    );
    println!(
        "Lines:               {} {}",
        format!("+{}", summary.total_lines_added).green(),
        format!("-{}", summary.total_lines_removed).red()
    );
    println!(
        "Code vs comments:    +{}/-{} code, +{}/-{} comments",
        summary.total_code_additions,
        summary.total_code_deletions,
        summary.total_comment_additions,
        summary.total_comment_deletions
    );
    println!(
        "Patterns:            {} imports, {} functions, {} classes, {} test touches",
        summary.total_imports_added,
        summary.total_functions_added,
        summary.total_classes_added,
        summary.total_test_changes
    );
    println!(
        "Averages per PR:     {:.2} files, {:.2} lines added, {:.2} lines removed",
        summary.avg_files_per_pr, summary.avg_lines_added_per_pr, summary.avg_lines_removed_per_pr
    );
    println!();
}

/// Print the end-of-run processed/skipped accounting.
pub fn print_run_stats(stats: &RunStats) {
    println!(
        "{} {} repos processed, {} skipped; {} PRs analyzed, {} skipped",
        "Done:".bold(),
        stats.processed_repos,
        stats.skipped_repos,
        stats.prs_analyzed,
        stats.prs_skipped
    );
}

#[cfg(test)]
mod tests {
    use super::types::sample_record;
    use super::*;

    #[test]
    fn test_csv_round_trip_preserves_every_field() {
        let records = vec![sample_record("org/a", 1), sample_record("org/b", 2)];
        let dir = std::env::temp_dir();
        let path = dir.join("pr_change_analyzer_round_trip.csv");

        write_records(&path, &records).unwrap();
        let restored = read_records(&path).unwrap();
        assert_eq!(restored, records);
        // Nested maps decode to the same key/value pairs.
        assert_eq!(restored[0].languages_changed.get("Python"), Some(&3));
        assert_eq!(restored[0].change_types.get("modification"), Some(&4));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_csv_header_column_order() {
        let dir = std::env::temp_dir();
        let path = dir.join("pr_change_analyzer_header.csv");
        write_records(&path, &[sample_record("org/a", 1)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert!(header.starts_with("repo_name,v1_commit,v2_commit,v1_date,v2_date,pr_number"));
        assert!(header.ends_with("imports_added,functions_added,classes_added,test_changes"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_collection_writes_header_only() {
        let dir = std::env::temp_dir();
        let path = dir.join("pr_change_analyzer_empty.csv");
        write_records(&path, &[]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("repo_name,"));
        let restored = read_records(&path).unwrap();
        assert!(restored.is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_summary_json() {
        let summary = SummaryStatistics::compute(&[sample_record("org/a", 1)]).unwrap();
        let dir = std::env::temp_dir();
        let path = dir.join("pr_change_analyzer_summary.json");
        write_summary(&path, &summary).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(decoded["total_prs_analyzed"], 1);
        assert_eq!(decoded["avg_files_per_pr"], 4.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_print_helpers_do_not_panic() {
        let summary = SummaryStatistics::compute(&[sample_record("org/a", 1)]).unwrap();
        print_summary(&summary);
        print_run_stats(&RunStats::default());
    }
}
