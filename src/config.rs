use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-change-analyzer.toml.
///
/// All fields are optional — the tool works with zero config plus a
/// GITHUB_TOKEN environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Repository/PR filter thresholds
    #[serde(default)]
    pub filters: FilterConfig,

    /// Crawl pacing and pagination knobs
    #[serde(default)]
    pub crawl: CrawlConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Only keep repos where one of these languages holds enough of the
    /// codebase. Empty list disables the language filter.
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Minimum percentage of bytes in a target language.
    #[serde(default = "default_language_threshold")]
    pub language_threshold: f64,

    /// Minimum stargazer count a repo must have.
    #[serde(default = "default_min_stars")]
    pub min_stars: usize,

    /// Minimum collaborators a repo must have (accepted but not enforced;
    /// kept for config compatibility with the collector scripts).
    #[serde(default = "default_min_collaborators")]
    #[allow(dead_code)]
    pub min_collaborators: usize,

    /// Keep a PR if its title contains any of these keywords.
    /// Empty list matches every title.
    #[serde(default)]
    pub title_keywords: Vec<String>,

    /// Keep a PR if its body contains any of these keywords.
    /// Empty list matches every body.
    #[serde(default)]
    pub body_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            target_languages: Vec::new(),
            language_threshold: default_language_threshold(),
            min_stars: default_min_stars(),
            min_collaborators: default_min_collaborators(),
            title_keywords: Vec::new(),
            body_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Pause after every API call, in milliseconds. The GitHub rate budget
    /// is shared per token, so the crawl is paced unconditionally.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Hard cap on pull-request listing pages fetched per repository.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Pull requests per listing page.
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Changed files fetched per PR in a single call (no further pagination).
    #[serde(default = "default_file_fetch_limit")]
    pub file_fetch_limit: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: default_rate_limit_ms(),
            max_pages: default_max_pages(),
            per_page: default_per_page(),
            file_fetch_limit: default_file_fetch_limit(),
        }
    }
}

fn default_language_threshold() -> f64 {
    10.0
}

fn default_min_stars() -> usize {
    25
}

fn default_min_collaborators() -> usize {
    5
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_max_pages() -> usize {
    10
}

fn default_per_page() -> usize {
    100
}

fn default_file_fetch_limit() -> usize {
    300
}

impl Config {
    /// Load configuration from .pr-change-analyzer.toml in the current
    /// directory. Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-change-analyzer.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Rate-limit delay as a Duration.
    pub fn rate_delay(&self) -> Duration {
        Duration::from_millis(self.crawl.rate_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert!(config.filters.target_languages.is_empty());
        assert_eq!(config.filters.min_stars, 25);
        assert_eq!(config.filters.language_threshold, 10.0);
        assert_eq!(config.crawl.max_pages, 10);
        assert_eq!(config.crawl.per_page, 100);
        assert_eq!(config.crawl.file_fetch_limit, 300);
        assert_eq!(config.rate_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[filters]
target_languages = ["Python", "JavaScript"]
min_stars = 50
title_keywords = ["fix", "bug"]

[crawl]
rate_limit_ms = 250
max_pages = 3
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.filters.target_languages.len(), 2);
        assert_eq!(config.filters.min_stars, 50);
        assert_eq!(config.filters.title_keywords, vec!["fix", "bug"]);
        assert_eq!(config.crawl.rate_limit_ms, 250);
        assert_eq!(config.crawl.max_pages, 3);
        // Unspecified knobs keep their defaults.
        assert_eq!(config.crawl.per_page, 100);
        assert!(config.filters.body_keywords.is_empty());
    }
}
