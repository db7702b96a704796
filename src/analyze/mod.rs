pub mod diff;
pub mod patterns;

pub use patterns::PatternSet;

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::Config;
use crate::github::types::PrFile;
use crate::github::{GitHubClient, HttpFailure};

/// How a file changed, derived from its line deltas alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Addition,
    Deletion,
    Modification,
    Refactoring,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Addition => write!(f, "addition"),
            ChangeType::Deletion => write!(f, "deletion"),
            ChangeType::Modification => write!(f, "modification"),
            ChangeType::Refactoring => write!(f, "refactoring"),
        }
    }
}

/// Classify a file's change from its added/removed line counts.
/// A lopsided delta (more than 10 lines apart) on a touched file reads as
/// refactoring rather than plain modification.
pub fn classify_change(additions: u64, deletions: u64) -> ChangeType {
    if additions == 0 {
        ChangeType::Deletion
    } else if deletions == 0 {
        ChangeType::Addition
    } else if additions.abs_diff(deletions) > 10 {
        ChangeType::Refactoring
    } else {
        ChangeType::Modification
    }
}

/// Map a filename to a language label by lowercase extension.
/// Unrecognized or missing extensions map to "Other".
pub fn language_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "py" => "Python",
        "js" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "java" => "Java",
        "c" => "C",
        "cpp" => "C++",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "scala" => "Scala",
        "sh" => "Shell",
        "css" => "CSS",
        "html" => "HTML",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "xml" => "XML",
        "sql" => "SQL",
        _ => "Other",
    }
}

/// Per-PR counters, built incrementally by folding over the PR's files.
#[derive(Debug, Clone, Default)]
pub struct PrAnalysis {
    pub files_added: u64,
    pub files_modified: u64,
    pub files_deleted: u64,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub code_additions: u64,
    pub code_deletions: u64,
    pub comment_additions: u64,
    pub comment_deletions: u64,
    pub languages_changed: BTreeMap<String, u64>,
    pub change_types: BTreeMap<String, u64>,
    pub imports_added: u64,
    pub functions_added: u64,
    pub classes_added: u64,
    pub test_changes: u64,
    /// Files actually fetched for this PR (capped by file_fetch_limit).
    pub files_seen: u64,
}

impl PrAnalysis {
    /// Fold one changed file into the running totals.
    pub fn record_file(&mut self, file: &PrFile, pattern_set: &PatternSet) {
        self.files_seen += 1;

        // The live API reports deleted files as "removed"; older exports
        // said "deleted". Count either.
        match file.status.as_str() {
            "added" => self.files_added += 1,
            "removed" | "deleted" => self.files_deleted += 1,
            "modified" => self.files_modified += 1,
            _ => {}
        }

        self.total_lines_added += file.additions;
        self.total_lines_removed += file.deletions;

        let language = language_for(&file.filename);
        *self.languages_changed.entry(language.to_string()).or_insert(0) += 1;

        let change_type = classify_change(file.additions, file.deletions);
        *self.change_types.entry(change_type.to_string()).or_insert(0) += 1;

        if let Some(patch) = file.patch.as_deref() {
            let counts = diff::classify_diff_lines(patch);
            self.code_additions += counts.code_additions;
            self.code_deletions += counts.code_deletions;
            self.comment_additions += counts.comment_additions;
            self.comment_deletions += counts.comment_deletions;

            let hits = pattern_set.detect(&file.filename, patch);
            self.imports_added += u64::from(hits.imports_added);
            self.functions_added += u64::from(hits.functions_added);
            self.classes_added += u64::from(hits.classes_added);
            self.test_changes += u64::from(hits.test_file);
        } else if file.filename.to_lowercase().contains("test") {
            // Binary/oversized test files still count as a test touch.
            self.test_changes += 1;
        }
    }
}

/// Fetch and analyze every changed file of one pull request.
///
/// A single call fetches up to `file_fetch_limit` files; PRs with more files
/// are analyzed on that prefix only. A fetch failure is returned to the
/// caller, which skips this PR from aggregation without aborting the
/// repository loop.
pub async fn analyze_pr_files(
    client: &GitHubClient,
    config: &Config,
    repo_name: &str,
    pr_number: u64,
    pattern_set: &PatternSet,
) -> Result<PrAnalysis, HttpFailure> {
    let endpoint = format!("repos/{repo_name}/pulls/{pr_number}/files");
    let params = vec![(
        "per_page".to_string(),
        config.crawl.file_fetch_limit.to_string(),
    )];

    let response = client.get(&endpoint, &params).await?;
    let files: Vec<PrFile> = serde_json::from_value(response.body).unwrap_or_default();
    debug!(repo = repo_name, pr = pr_number, files = files.len(), "fetched PR files");

    let mut analysis = PrAnalysis::default();
    for file in &files {
        analysis.record_file(file, pattern_set);
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{page, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    fn file(name: &str, status: &str, additions: u64, deletions: u64, patch: Option<&str>) -> PrFile {
        PrFile {
            filename: name.to_string(),
            status: status.to_string(),
            additions,
            deletions,
            patch: patch.map(str::to_string),
        }
    }

    #[test]
    fn test_classify_change_cases() {
        assert_eq!(classify_change(5, 0), ChangeType::Addition);
        assert_eq!(classify_change(0, 5), ChangeType::Deletion);
        assert_eq!(classify_change(20, 5), ChangeType::Refactoring);
        assert_eq!(classify_change(12, 10), ChangeType::Modification);
    }

    #[test]
    fn test_language_table() {
        assert_eq!(language_for("src/main.py"), "Python");
        assert_eq!(language_for("lib/App.TSX"), "TypeScript");
        assert_eq!(language_for("deploy.yml"), "YAML");
        assert_eq!(language_for("README"), "Other");
        assert_eq!(language_for("weird.xyz"), "Other");
    }

    #[test]
    fn test_record_file_accumulates() {
        let patterns = PatternSet::new();
        let mut analysis = PrAnalysis::default();

        analysis.record_file(
            &file("src/app.py", "added", 12, 0, Some("+import os\n+def run():\n+# setup\n")),
            &patterns,
        );
        analysis.record_file(
            &file("tests/test_app.py", "modified", 4, 2, Some("+assert run()\n-old\n")),
            &patterns,
        );
        analysis.record_file(&file("legacy.js", "removed", 0, 30, Some("-gone\n")), &patterns);

        assert_eq!(analysis.files_seen, 3);
        assert_eq!(analysis.files_added, 1);
        assert_eq!(analysis.files_modified, 1);
        assert_eq!(analysis.files_deleted, 1);
        assert_eq!(analysis.total_lines_added, 16);
        assert_eq!(analysis.total_lines_removed, 32);
        assert_eq!(analysis.imports_added, 1);
        assert_eq!(analysis.functions_added, 1);
        assert_eq!(analysis.test_changes, 1);
        assert_eq!(analysis.languages_changed.get("Python"), Some(&2));
        assert_eq!(analysis.languages_changed.get("JavaScript"), Some(&1));
        assert_eq!(analysis.change_types.get("addition"), Some(&1));
        assert_eq!(analysis.change_types.get("modification"), Some(&1));
        assert_eq!(analysis.change_types.get("deletion"), Some(&1));
    }

    #[test]
    fn test_pattern_counts_are_per_file_presence() {
        // Three imports in one file still count once for that file.
        let patterns = PatternSet::new();
        let mut analysis = PrAnalysis::default();
        analysis.record_file(
            &file("a.py", "modified", 3, 0, Some("+import a\n+import b\n+import c\n")),
            &patterns,
        );
        assert_eq!(analysis.imports_added, 1);
    }

    #[test]
    fn test_missing_patch_skips_line_classification() {
        let patterns = PatternSet::new();
        let mut analysis = PrAnalysis::default();
        analysis.record_file(&file("logo.png", "added", 0, 0, None), &patterns);
        assert_eq!(analysis.code_additions, 0);
        assert_eq!(analysis.files_added, 1);
    }

    #[tokio::test]
    async fn test_analyze_pr_files_fetch_failure_propagates() {
        let transport = MockTransport::failing_after(vec![], 0);
        let client = GitHubClient::with_transport(Box::new(transport), Duration::ZERO);
        let result =
            analyze_pr_files(&client, &Config::default(), "org/repo", 1, &PatternSet::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_analyze_pr_files_happy_path() {
        let body = json!([
            {"filename": "src/a.py", "status": "added", "additions": 5, "deletions": 0,
             "patch": "+import os\n+x = 1\n"},
            {"filename": "src/b.js", "status": "modified", "additions": 2, "deletions": 2,
             "patch": "+// note\n+work()\n-old()\n-// stale\n"}
        ]);
        let client = GitHubClient::with_transport(
            Box::new(MockTransport::new(vec![page(body, None)])),
            Duration::ZERO,
        );
        let analysis =
            analyze_pr_files(&client, &Config::default(), "org/repo", 1, &PatternSet::new())
                .await
                .unwrap();
        assert_eq!(analysis.files_seen, 2);
        assert_eq!(analysis.comment_additions, 1);
        assert_eq!(analysis.comment_deletions, 1);
        assert_eq!(analysis.code_additions, 3);
        assert_eq!(analysis.code_deletions, 1);
    }
}
