/// Line-level counts extracted from one file's unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub code_additions: u64,
    pub code_deletions: u64,
    pub comment_additions: u64,
    pub comment_deletions: u64,
    pub lines_added: u64,
    pub lines_removed: u64,
}

/// Classify the added/removed lines of a unified diff into code vs comment
/// changes.
///
/// Heuristic, not a grammar parse: a counted line containing `#`, `//`, or
/// `/*` anywhere is treated as a comment change, which will misclassify code
/// carrying those substrings inside string or regex literals. The `+++`/`---`
/// file headers are excluded; context lines are ignored.
pub fn classify_diff_lines(diff_text: &str) -> DiffCounts {
    let mut counts = DiffCounts::default();

    for line in diff_text.split('\n') {
        if line.starts_with('+') && !line.starts_with("+++") {
            counts.lines_added += 1;
            if is_comment_like(line) {
                counts.comment_additions += 1;
            } else {
                counts.code_additions += 1;
            }
        } else if line.starts_with('-') && !line.starts_with("---") {
            counts.lines_removed += 1;
            if is_comment_like(line) {
                counts.comment_deletions += 1;
            } else {
                counts.code_deletions += 1;
            }
        }
    }

    counts
}

fn is_comment_like(line: &str) -> bool {
    line.contains('#') || line.contains("//") || line.contains("/*")
}
