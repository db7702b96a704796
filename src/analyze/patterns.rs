use regex::Regex;

/// Structural-pattern hits for one file's diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternHits {
    pub imports_added: bool,
    pub functions_added: bool,
    pub classes_added: bool,
    pub test_file: bool,
}

/// Line-anchored regexes over added diff lines, compiled once per run.
///
/// These are presence checks per file, not occurrence counts, and they are
/// textual heuristics: a `const` arrow assignment or `async` call form is
/// taken as a function definition without parsing any grammar.
pub struct PatternSet {
    imports: Regex,
    functions: Regex,
    classes: Regex,
}

impl PatternSet {
    pub fn new() -> Self {
        // Hard-coded patterns; compilation cannot fail at runtime.
        Self {
            imports: Regex::new(r"(?m)^\+.*(?:import\s|require\()").expect("imports pattern"),
            functions: Regex::new(r"(?m)^\+\s*(?:def|function|const.*=.*\(|async.*\()")
                .expect("functions pattern"),
            classes: Regex::new(r"(?m)^\+\s*class\s+").expect("classes pattern"),
        }
    }

    /// Check a file's diff text and filename against every pattern.
    pub fn detect(&self, filename: &str, diff_text: &str) -> PatternHits {
        PatternHits {
            imports_added: self.imports.is_match(diff_text),
            functions_added: self.functions.is_match(diff_text),
            classes_added: self.classes.is_match(diff_text),
            // Filename check, not diff content.
            test_file: filename.to_lowercase().contains("test"),
        }
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_import_addition() {
        let patterns = PatternSet::new();
        let hits = patterns.detect("src/app.py", "+import os\n context\n");
        assert!(hits.imports_added);
        assert!(!hits.functions_added);
    }

    #[test]
    fn test_detects_require_addition() {
        let patterns = PatternSet::new();
        let hits = patterns.detect("src/app.js", "+const fs = require('fs')\n");
        assert!(hits.imports_added);
    }

    #[test]
    fn test_removed_import_does_not_count() {
        let patterns = PatternSet::new();
        let hits = patterns.detect("src/app.py", "-import os\n");
        assert!(!hits.imports_added);
    }

    #[test]
    fn test_detects_function_forms() {
        let patterns = PatternSet::new();
        assert!(patterns.detect("a.py", "+def handler():\n").functions_added);
        assert!(patterns.detect("a.js", "+function handler() {\n").functions_added);
        assert!(patterns.detect("a.js", "+const handler = (req) => {\n").functions_added);
        assert!(patterns.detect("a.js", "+async fetchAll()\n").functions_added);
        assert!(!patterns.detect("a.js", "+let total = 0;\n").functions_added);
    }

    #[test]
    fn test_detects_class_addition() {
        let patterns = PatternSet::new();
        assert!(patterns.detect("a.py", "+class Worker:\n").classes_added);
        assert!(!patterns.detect("a.py", "+subclass = make()\n").classes_added);
    }

    #[test]
    fn test_test_file_is_filename_based() {
        let patterns = PatternSet::new();
        assert!(patterns.detect("tests/test_api.py", "+x = 1\n").test_file);
        assert!(patterns.detect("src/IntegrationTest.java", "").test_file);
        assert!(!patterns.detect("src/main.py", "+assert test\n").test_file);
    }

    #[test]
    fn test_multiline_anchoring() {
        // The + must open its own line, not appear mid-line.
        let patterns = PatternSet::new();
        let hits = patterns.detect("a.py", " x = y + import_count\n+import re\n");
        assert!(hits.imports_added);
        let none = patterns.detect("a.py", " x = y + imports\n");
        assert!(!none.imports_added);
    }
}
