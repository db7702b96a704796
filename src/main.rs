mod analyze;
mod config;
mod corpus;
mod export;
mod github;
mod report;
mod scan;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use crate::analyze::PatternSet;
use crate::config::Config;
use crate::corpus::OverlapEntry;
use crate::github::GitHubClient;
use crate::report::{AnalysisRecord, RunStats, SummaryStatistics};
use crate::scan::{RepoWindow, SkipReason};

/// PR Change Analyzer — finds the pull requests merged between two corpus
/// snapshots for every repository present in both, and computes per-PR
/// change metrics from their diffs.
#[derive(Parser, Debug)]
#[command(name = "pr-change-analyzer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl GitHub for PRs merged between the two snapshots and analyze them
    Analyze {
        /// First snapshot mapping CSV (repo_name,commit_hash)
        v1_mapping: PathBuf,

        /// Second snapshot mapping CSV (repo_name,commit_hash)
        v2_mapping: PathBuf,

        /// Output CSV, one row per analyzed pull request
        #[arg(short, long, default_value = "code_changes_analysis.csv")]
        output: PathBuf,

        /// Output JSON file for summary statistics
        #[arg(long, default_value = "code_changes_summary.json")]
        summary: PathBuf,
    },

    /// Reduce two JSONL snapshot dumps to repo_name,commit_hash mapping CSVs
    Export {
        /// First snapshot dump (JSONL)
        v1_input: PathBuf,

        /// Second snapshot dump (JSONL)
        v2_input: PathBuf,

        /// Mapping CSV written for the first snapshot
        #[arg(long, default_value = "v1_repos.csv")]
        v1_output: PathBuf,

        /// Mapping CSV written for the second snapshot
        #[arg(long, default_value = "v2_repos.csv")]
        v2_output: PathBuf,

        /// JSON field holding the repo name in the first dump
        #[arg(long, default_value = "max_stars_repo_name")]
        v1_repo_key: String,

        /// JSON field holding the revision in the first dump
        #[arg(long, default_value = "max_stars_repo_head_hexsha")]
        v1_hash_key: String,

        /// JSON field holding the repo name in the second dump
        #[arg(long, default_value = "repo_name")]
        v2_repo_key: String,

        /// JSON field holding the revision in the second dump
        #[arg(long, default_value = "revision_id")]
        v2_hash_key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            v1_mapping,
            v2_mapping,
            output,
            summary,
        } => run_analysis(&v1_mapping, &v2_mapping, &output, &summary).await,
        Command::Export {
            v1_input,
            v2_input,
            v1_output,
            v2_output,
            v1_repo_key,
            v1_hash_key,
            v2_repo_key,
            v2_hash_key,
        } => {
            let v1 = export::ExportSpec {
                label: "v1",
                input: v1_input,
                output: v1_output,
                repo_key: v1_repo_key,
                hash_key: v1_hash_key,
            };
            let v2 = export::ExportSpec {
                label: "v2",
                input: v2_input,
                output: v2_output,
                repo_key: v2_repo_key,
                hash_key: v2_hash_key,
            };
            let (v1_rows, v2_rows) = export::export_snapshots(v1, v2).await?;
            info!(v1_rows, v2_rows, "snapshot export finished");
            Ok(())
        }
    }
}

/// The sequential crawl: intersect the mappings, then walk each overlap
/// repository through filters, date resolution, the windowed PR scan, and
/// per-PR file analysis. A failure stops only the unit it belongs to.
async fn run_analysis(
    v1_mapping: &Path,
    v2_mapping: &Path,
    output: &Path,
    summary_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let config = Config::load()?;
    let token = config
        .github_token()
        .ok_or("GitHub token not found: set GITHUB_TOKEN or [github].token in .pr-change-analyzer.toml")?;
    let client = GitHubClient::new(token, config.rate_delay());
    let pattern_set = PatternSet::new();

    let repo_v1 = corpus::load_mapping(v1_mapping)?;
    let repo_v2 = corpus::load_mapping(v2_mapping)?;
    let overlap = corpus::intersect(&repo_v1, &repo_v2);
    info!(
        v1 = repo_v1.len(),
        v2 = repo_v2.len(),
        overlap = overlap.len(),
        "found overlap repositories"
    );

    let mut records: Vec<AnalysisRecord> = Vec::new();
    let mut stats = RunStats::default();

    for entry in &overlap {
        let span = info_span!("repo", name = %entry.repo_name);
        let _guard = span.enter();

        match process_repository(&client, &config, &pattern_set, entry, &mut records, &mut stats)
            .await
        {
            Ok(()) => stats.processed_repos += 1,
            Err(reason) => {
                warn!(reason = %reason, "skipping repository");
                stats.skipped_repos += 1;
            }
        }
    }

    info!(
        processed = stats.processed_repos,
        skipped = stats.skipped_repos,
        prs = records.len(),
        "analysis complete"
    );

    report::write_records(output, &records)?;
    match SummaryStatistics::compute(&records) {
        Some(summary) => {
            report::write_summary(summary_path, &summary)?;
            report::print_summary(&summary);
        }
        None => println!("No pull requests matched; no summary written."),
    }
    report::print_run_stats(&stats);

    Ok(())
}

/// Process one overlap repository end to end. Returns the typed skip reason
/// when the repository is excluded; per-PR failures are absorbed into the
/// run stats instead.
async fn process_repository(
    client: &GitHubClient,
    config: &Config,
    pattern_set: &PatternSet,
    entry: &OverlapEntry,
    records: &mut Vec<AnalysisRecord>,
    stats: &mut RunStats,
) -> Result<(), SkipReason> {
    let repo_name = &entry.repo_name;

    if !scan::passes_language_filter(client, config, repo_name).await {
        return Err(SkipReason::LanguageFilter);
    }
    if !scan::passes_stars_filter(client, config, repo_name).await {
        return Err(SkipReason::StarsFilter);
    }

    let v1_date = scan::resolve_commit_date(client, repo_name, &entry.v1_revision)
        .await
        .map_err(|err| {
            warn!(revision = %entry.v1_revision, error = %err, "v1 commit date unresolved");
            SkipReason::CommitDateUnavailable
        })?;
    let v2_date = scan::resolve_commit_date(client, repo_name, &entry.v2_revision)
        .await
        .map_err(|err| {
            warn!(revision = %entry.v2_revision, error = %err, "v2 commit date unresolved");
            SkipReason::CommitDateUnavailable
        })?;

    let window = RepoWindow { v1_date, v2_date };
    if window.is_inverted() {
        // An inverted open interval can never match; fail fast instead of
        // spending capped pages on an empty scan.
        return Err(SkipReason::InvertedWindow);
    }

    let prs = scan::scan_merged_prs(client, config, repo_name, &window).await;
    info!(
        prs = prs.len(),
        from = %window.v1_date.date_naive(),
        to = %window.v2_date.date_naive(),
        "merged PRs in window"
    );

    for pr in prs {
        match analyze::analyze_pr_files(client, config, repo_name, pr.number, pattern_set).await {
            Ok(analysis) => {
                records.push(build_record(entry, &window, &pr, &analysis));
                stats.prs_analyzed += 1;
            }
            Err(err) => {
                warn!(pr = pr.number, error = %err, "skipping PR, file fetch failed");
                stats.prs_skipped += 1;
            }
        }
    }

    Ok(())
}

/// Flatten overlap identifiers, PR metadata, and analysis counters into one
/// output row.
fn build_record(
    entry: &OverlapEntry,
    window: &RepoWindow,
    pr: &scan::PullRequestRecord,
    analysis: &analyze::PrAnalysis,
) -> AnalysisRecord {
    AnalysisRecord {
        repo_name: entry.repo_name.clone(),
        v1_commit: short_revision(&entry.v1_revision),
        v2_commit: short_revision(&entry.v2_revision),
        v1_date: window.v1_date,
        v2_date: window.v2_date,
        pr_number: pr.number,
        pr_title: pr.title.clone(),
        pr_url: pr.url.clone(),
        merge_date: pr.merge_date,
        author: pr.author.clone(),
        files_changed: analysis.files_seen,
        api_additions: pr.additions,
        api_deletions: pr.deletions,
        files_added: analysis.files_added,
        files_modified: analysis.files_modified,
        files_deleted: analysis.files_deleted,
        total_lines_added: analysis.total_lines_added,
        total_lines_removed: analysis.total_lines_removed,
        code_additions: analysis.code_additions,
        code_deletions: analysis.code_deletions,
        comment_additions: analysis.comment_additions,
        comment_deletions: analysis.comment_deletions,
        languages_changed: analysis.languages_changed.clone(),
        change_types: analysis.change_types.clone(),
        imports_added: analysis.imports_added,
        functions_added: analysis.functions_added,
        classes_added: analysis.classes_added,
        test_changes: analysis.test_changes,
    }
}

/// Abbreviated revision identifier for the output rows.
fn short_revision(revision: &str) -> String {
    revision.chars().take(7).collect()
}
