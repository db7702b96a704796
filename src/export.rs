use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read snapshot dump: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to write mapping file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One side of a bulk export: a JSONL snapshot dump reduced to a
/// repo_name,commit_hash mapping CSV.
#[derive(Debug, Clone)]
pub struct ExportSpec {
    pub label: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    /// JSON field holding the repository name in this dump.
    pub repo_key: String,
    /// JSON field holding the snapshot revision in this dump.
    pub hash_key: String,
}

const PROGRESS_EVERY: u64 = 10_000;

/// Stream both snapshot dumps into mapping CSVs concurrently.
///
/// The two sides are independent — each owns its output file and shares no
/// state — so they run as two blocking tasks joined at the end. Returns the
/// (v1, v2) row counts written.
pub async fn export_snapshots(v1: ExportSpec, v2: ExportSpec) -> Result<(u64, u64), ExportError> {
    let v1_task = tokio::task::spawn_blocking(move || export_one(&v1));
    let v2_task = tokio::task::spawn_blocking(move || export_one(&v2));

    let (v1_result, v2_result) = tokio::try_join!(v1_task, v2_task)?;
    Ok((v1_result?, v2_result?))
}

/// Stream one JSONL dump into a mapping CSV. Rows missing either key (or
/// not valid JSON) are skipped and counted; the stream never aborts for a
/// single bad row.
fn export_one(spec: &ExportSpec) -> Result<u64, ExportError> {
    info!(side = spec.label, input = %spec.input.display(), "exporting snapshot mapping");
    let start = std::time::Instant::now();

    let reader = BufReader::new(File::open(&spec.input)?);
    let mut writer = csv::Writer::from_path(&spec.output)?;
    writer.write_record(["repo_name", "commit_hash"])?;

    let mut written = 0u64;
    let mut skipped = 0u64;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let row: serde_json::Value = match serde_json::from_str(&line) {
            Ok(row) => row,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let repo_name = row.get(&spec.repo_key).and_then(|v| v.as_str());
        let commit_hash = row.get(&spec.hash_key).and_then(|v| v.as_str());

        match (repo_name, commit_hash) {
            (Some(repo_name), Some(commit_hash)) => {
                writer.write_record([repo_name, commit_hash])?;
                written += 1;
                if written % PROGRESS_EVERY == 0 {
                    let rate = written as f64 / start.elapsed().as_secs_f64();
                    info!(side = spec.label, rows = written, rows_per_sec = rate, "export progress");
                }
            }
            _ => skipped += 1,
        }
    }

    writer.flush()?;
    if skipped > 0 {
        warn!(side = spec.label, skipped, "rows missing expected keys were skipped");
    }
    info!(
        side = spec.label,
        rows = written,
        elapsed_secs = start.elapsed().as_secs_f64(),
        output = %spec.output.display(),
        "export complete"
    );
    Ok(written)
}
