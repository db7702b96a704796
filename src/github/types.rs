use serde::Deserialize;

/// Commit resource, reduced to the committer date path we consume.
#[derive(Debug, Deserialize)]
pub struct CommitResponse {
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub committer: Option<CommitActor>,
}

#[derive(Debug, Deserialize)]
pub struct CommitActor {
    pub date: Option<String>,
}

/// Account that authored a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
    /// "User", "Bot", "Organization", ...
    #[serde(rename = "type")]
    pub kind: String,
}

/// One item from the closed-pulls listing.
///
/// The listing endpoint omits the line/file counters for some PRs, so they
/// default to zero rather than failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct PullItem {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub html_url: String,
    pub merged_at: Option<String>,
    pub user: Actor,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
}

/// One entry from the pull-request-files listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PrFile {
    pub filename: String,
    /// "added", "removed", "modified", "renamed", ...
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    /// Unified diff text; absent for binary or very large files.
    pub patch: Option<String>,
}
