use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::github::pagination::PageState;
use crate::github::types::{CommitResponse, PullItem};
use crate::github::{GitHubClient, HttpFailure};

/// Why a repository was excluded from the crawl. Expected conditions are
/// values, not exceptions; the run loop tallies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LanguageFilter,
    StarsFilter,
    CommitDateUnavailable,
    InvertedWindow,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::LanguageFilter => write!(f, "below language threshold"),
            SkipReason::StarsFilter => write!(f, "below stars threshold"),
            SkipReason::CommitDateUnavailable => write!(f, "commit date unavailable"),
            SkipReason::InvertedWindow => write!(f, "inverted snapshot window"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("commit lookup failed: {0}")]
    Http(#[from] HttpFailure),

    #[error("commit response missing committer date")]
    MissingField,

    #[error("malformed commit timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// The open time interval between a repository's two snapshot commits.
#[derive(Debug, Clone, Copy)]
pub struct RepoWindow {
    pub v1_date: DateTime<Utc>,
    pub v2_date: DateTime<Utc>,
}

impl RepoWindow {
    /// Strictly-inside check, exclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.v1_date < instant && instant < self.v2_date
    }

    pub fn is_inverted(&self) -> bool {
        self.v1_date >= self.v2_date
    }
}

/// A merged pull request retained by the window scan. Immutable once built.
#[derive(Debug, Clone)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub merge_date: DateTime<Utc>,
    pub author: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

/// Parse an ISO-8601 instant; a trailing `Z` is accepted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Resolve a repo+revision pair to its committer timestamp.
///
/// Every variant of the error means "exclude this repository", never a fatal
/// run error; a malformed timestamp is surfaced distinctly from HTTP and
/// missing-field failures so it shows up in the diagnostics.
pub async fn resolve_commit_date(
    client: &GitHubClient,
    repo_name: &str,
    revision: &str,
) -> Result<DateTime<Utc>, ResolveError> {
    let endpoint = format!("repos/{repo_name}/commits/{revision}");
    let response = client.get(&endpoint, &[]).await?;

    let commit: CommitResponse =
        serde_json::from_value(response.body).map_err(|_| ResolveError::MissingField)?;
    let date = commit
        .commit
        .committer
        .and_then(|c| c.date)
        .ok_or(ResolveError::MissingField)?;

    parse_timestamp(&date).map_err(|source| ResolveError::Timestamp {
        value: date,
        source,
    })
}

/// True if `text` contains any keyword, case-insensitive.
/// An empty keyword list matches everything (filter disabled).
pub fn has_keywords(text: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let text_lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text_lower.contains(&keyword.to_lowercase()))
}

/// Bot heuristic: login containing "bot" (any case) or an account whose
/// type is literally Bot.
fn is_bot(login: &str, kind: &str) -> bool {
    login.to_lowercase().contains("bot") || kind.eq_ignore_ascii_case("bot")
}

/// Language filter: at least one target language must hold
/// `language_threshold` percent of the repository's bytes. An empty target
/// list disables the filter without an API call; a failed or empty languages
/// response fails the filter.
pub async fn passes_language_filter(
    client: &GitHubClient,
    config: &Config,
    repo_name: &str,
) -> bool {
    if config.filters.target_languages.is_empty() {
        return true;
    }

    let endpoint = format!("repos/{repo_name}/languages");
    let languages: BTreeMap<String, u64> = match client.get(&endpoint, &[]).await {
        Ok(response) => serde_json::from_value(response.body).unwrap_or_default(),
        Err(err) => {
            warn!(repo = repo_name, error = %err, "languages lookup failed");
            return false;
        }
    };

    let total_bytes: u64 = languages.values().sum();
    if total_bytes == 0 {
        return false;
    }

    config.filters.target_languages.iter().any(|target| {
        let lang_bytes = languages.get(target).copied().unwrap_or(0);
        let percentage = (lang_bytes as f64 / total_bytes as f64) * 100.0;
        percentage >= config.filters.language_threshold
    })
}

/// Stars filter: counts one unpaginated stargazers page, an approximation
/// that works for thresholds below the server's page size.
pub async fn passes_stars_filter(
    client: &GitHubClient,
    config: &Config,
    repo_name: &str,
) -> bool {
    let endpoint = format!("repos/{repo_name}/stargazers");
    let stargazers = match client.get(&endpoint, &[]).await {
        Ok(response) => response.body.as_array().map(Vec::len).unwrap_or(0),
        Err(err) => {
            warn!(repo = repo_name, error = %err, "stargazers lookup failed");
            return false;
        }
    };
    stargazers >= config.filters.min_stars
}

/// Walk the closed-pulls listing for one repository, newest-updated first,
/// retaining merged, human-authored PRs whose merge timestamp falls strictly
/// inside the window and whose title/body pass the keyword filter.
///
/// Stops at the page cap even if a next cursor remains — history is
/// deliberately incomplete for very active repositories. Any HTTP failure
/// ends the scan for this repository only, keeping PRs already collected.
pub async fn scan_merged_prs(
    client: &GitHubClient,
    config: &Config,
    repo_name: &str,
    window: &RepoWindow,
) -> Vec<PullRequestRecord> {
    let first_page = format!("https://api.github.com/repos/{repo_name}/pulls");
    let first_params = vec![
        ("state".to_string(), "closed".to_string()),
        ("sort".to_string(), "updated".to_string()),
        ("direction".to_string(), "desc".to_string()),
        ("per_page".to_string(), config.crawl.per_page.to_string()),
    ];

    let mut retained = Vec::new();
    let mut state = PageState {
        next_cursor: Some(first_page),
    };
    let mut first_request = true;
    let mut pages_fetched = 0usize;

    while let Some(cursor) = state.next_cursor.take() {
        if pages_fetched >= config.crawl.max_pages {
            debug!(repo = repo_name, pages = pages_fetched, "page cap reached");
            break;
        }

        // Cursor URLs already encode the query; params only on the first call.
        let params: &[(String, String)] = if first_request { &first_params } else { &[] };
        first_request = false;

        let response = match client.get_url(&cursor, params).await {
            Ok(response) => response,
            Err(err) => {
                warn!(repo = repo_name, error = %err, "PR listing failed, ending scan for repo");
                break;
            }
        };
        pages_fetched += 1;

        let items: Vec<PullItem> = match serde_json::from_value(response.body) {
            Ok(items) => items,
            Err(err) => {
                warn!(repo = repo_name, error = %err, "unexpected PR listing shape, ending scan for repo");
                break;
            }
        };

        for item in items {
            if let Some(record) = filter_pull_item(config, repo_name, item, window) {
                retained.push(record);
            }
        }

        state.next_cursor = response.next;
    }

    retained
}

/// Apply the retention predicate to one listing item.
fn filter_pull_item(
    config: &Config,
    repo_name: &str,
    item: PullItem,
    window: &RepoWindow,
) -> Option<PullRequestRecord> {
    let merged_at = item.merged_at.as_deref()?;

    if is_bot(&item.user.login, &item.user.kind) {
        debug!(repo = repo_name, pr = item.number, author = %item.user.login, "skipping bot PR");
        return None;
    }

    let merge_date = match parse_timestamp(merged_at) {
        Ok(date) => date,
        Err(err) => {
            warn!(
                repo = repo_name,
                pr = item.number,
                value = merged_at,
                error = %err,
                "malformed merge timestamp, excluding PR"
            );
            return None;
        }
    };

    if !window.contains(merge_date) {
        return None;
    }

    let title_ok = has_keywords(&item.title, &config.filters.title_keywords);
    let body_ok = has_keywords(item.body.as_deref().unwrap_or(""), &config.filters.body_keywords);
    if !(title_ok || body_ok) {
        debug!(repo = repo_name, pr = item.number, "skipping PR without keyword match");
        return None;
    }

    Some(PullRequestRecord {
        number: item.number,
        title: item.title,
        url: item.html_url,
        merge_date,
        author: item.user.login,
        additions: item.additions,
        deletions: item.deletions,
        changed_files: item.changed_files,
    })
}
