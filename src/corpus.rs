use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read snapshot mapping: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse snapshot mapping: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of a snapshot mapping file.
#[derive(Debug, Deserialize)]
struct MappingRow {
    repo_name: String,
    commit_hash: String,
}

/// Insertion-ordered repo_name -> commit_hash mapping.
///
/// Duplicate keys keep their first-seen position but take the last value,
/// matching dict semantics of the mapping producers.
#[derive(Debug, Default)]
pub struct RevisionMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl RevisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repo_name: String, revision: String) {
        match self.index.get(&repo_name) {
            Some(&pos) => self.entries[pos].1 = revision,
            None => {
                self.index.insert(repo_name.clone(), self.entries.len());
                self.entries.push((repo_name, revision));
            }
        }
    }

    pub fn get(&self, repo_name: &str) -> Option<&str> {
        self.index
            .get(repo_name)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Paired with len() per convention
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A repository present in both snapshots, with its revision in each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapEntry {
    pub repo_name: String,
    pub v1_revision: String,
    pub v2_revision: String,
}

/// Load a snapshot mapping CSV (header: repo_name,commit_hash).
/// Whitespace around values is trimmed.
pub fn load_mapping(path: &Path) -> Result<RevisionMap, CorpusError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut map = RevisionMap::new();
    for row in reader.deserialize() {
        let row: MappingRow = row?;
        map.insert(row.repo_name, row.commit_hash);
    }

    info!(path = %path.display(), repos = map.len(), "loaded snapshot mapping");
    Ok(map)
}

/// Intersect two revision mappings on repository name.
///
/// Output order follows the iteration order of the first mapping. Keys
/// missing from either side simply produce no entry.
pub fn intersect(v1: &RevisionMap, v2: &RevisionMap) -> Vec<OverlapEntry> {
    v1.iter()
        .filter_map(|(repo_name, v1_revision)| {
            v2.get(repo_name).map(|v2_revision| OverlapEntry {
                repo_name: repo_name.to_string(),
                v1_revision: v1_revision.to_string(),
                v2_revision: v2_revision.to_string(),
            })
        })
        .collect()
}
