//! Caller configuration and its merge over fixed defaults.
//!
//! [`UserConfig`] mirrors what a caller may set (every field optional, camelCase
//! on disk). [`ScraperConfig::from_user`] is the single place where those
//! values are laid over the defaults; nothing here outlives one invocation.

use crate::error::ConfigError;
use crate::models::QueryVars;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://news.google.com/search";
pub const DEFAULT_TIMEFRAME: &str = "7d";
pub const DEFAULT_LIMIT: usize = 99;
pub const DEFAULT_LOG_LEVEL: &str = "error";
pub const DEFAULT_BROWSER_URL: &str = "http://localhost:3000";

/// Options supplied by the caller. Unset fields take the defaults of
/// [`ScraperConfig`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    /// Sent as the `q` query parameter.
    pub search_term: Option<String>,
    /// Sent as the `when` query parameter, e.g. `1h`, `7d`.
    pub timeframe: Option<String>,
    /// Extra raw query parameters (`hl`, `gl`, `ceid`, ...).
    pub query_vars: Option<QueryVars>,
    /// Replaces the search endpoint, e.g. with a topic page URL.
    pub base_url: Option<String>,
    #[serde(rename = "prettyURLs")]
    pub pretty_urls: Option<bool>,
    pub get_article_content: Option<bool>,
    pub filter_words: Option<Vec<String>>,
    pub filter_case_sensitive: Option<bool>,
    pub filter_whole_word: Option<bool>,
    pub limit: Option<i64>,
    /// Extra Chrome command-line flags for the browser launch.
    pub browser_args: Option<Vec<String>>,
    pub headless: Option<bool>,
    pub log_level: Option<String>,
    /// Browserless endpoint used by [`crate::scrape_news`].
    pub browser_url: Option<String>,
    pub browser_token: Option<String>,
}

impl UserConfig {
    /// Load a config file. `.json` files are read as JSON, anything else as YAML.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: display.clone(),
                source,
            })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&raw).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&raw).map_err(|e| e.to_string())
        };

        let config = parsed.map_err(|message| ConfigError::Parse {
            path: display,
            message,
        })?;
        debug!("Loaded user config");
        Ok(config)
    }

    /// Lay `other` over `self`: any field set in `other` wins.
    pub fn overridden_by(self, other: UserConfig) -> UserConfig {
        UserConfig {
            search_term: other.search_term.or(self.search_term),
            timeframe: other.timeframe.or(self.timeframe),
            query_vars: match (self.query_vars, other.query_vars) {
                (Some(mut base), Some(top)) => {
                    for (k, v) in top.iter() {
                        base.insert(k, v);
                    }
                    Some(base)
                }
                (base, top) => top.or(base),
            },
            base_url: other.base_url.or(self.base_url),
            pretty_urls: other.pretty_urls.or(self.pretty_urls),
            get_article_content: other.get_article_content.or(self.get_article_content),
            filter_words: other.filter_words.or(self.filter_words),
            filter_case_sensitive: other.filter_case_sensitive.or(self.filter_case_sensitive),
            filter_whole_word: other.filter_whole_word.or(self.filter_whole_word),
            limit: other.limit.or(self.limit),
            browser_args: other.browser_args.or(self.browser_args),
            headless: other.headless.or(self.headless),
            log_level: other.log_level.or(self.log_level),
            browser_url: other.browser_url.or(self.browser_url),
            browser_token: other.browser_token.or(self.browser_token),
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub timeframe: String,
    pub query_vars: QueryVars,
    pub base_url: String,
    pub pretty_urls: bool,
    pub get_article_content: bool,
    pub filter_words: Vec<String>,
    pub filter_case_sensitive: bool,
    pub filter_whole_word: bool,
    pub limit: usize,
    pub browser_args: Vec<String>,
    pub headless: bool,
    pub browser_url: String,
    pub browser_token: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            query_vars: QueryVars::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            pretty_urls: true,
            get_article_content: false,
            filter_words: Vec::new(),
            filter_case_sensitive: false,
            filter_whole_word: false,
            limit: DEFAULT_LIMIT,
            browser_args: Vec::new(),
            headless: true,
            browser_url: DEFAULT_BROWSER_URL.to_string(),
            browser_token: None,
        }
    }
}

impl ScraperConfig {
    /// Merge caller options over the defaults.
    pub fn from_user(user: UserConfig) -> Self {
        let defaults = ScraperConfig::default();
        let search_term = user.search_term.filter(|s| !s.is_empty());
        let timeframe = user.timeframe.unwrap_or(defaults.timeframe);

        // caller vars first, then `when`, then `q`
        let mut query_vars = user.query_vars.unwrap_or_default();
        query_vars.insert("when", timeframe.clone());
        if let Some(term) = search_term {
            query_vars.insert("q", term);
        }

        Self {
            timeframe,
            query_vars,
            base_url: user.base_url.unwrap_or(defaults.base_url),
            pretty_urls: user.pretty_urls.unwrap_or(defaults.pretty_urls),
            get_article_content: user
                .get_article_content
                .unwrap_or(defaults.get_article_content),
            filter_words: user.filter_words.unwrap_or_default(),
            filter_case_sensitive: user
                .filter_case_sensitive
                .unwrap_or(defaults.filter_case_sensitive),
            filter_whole_word: user.filter_whole_word.unwrap_or(defaults.filter_whole_word),
            limit: effective_limit(user.limit),
            browser_args: user.browser_args.unwrap_or_default(),
            headless: user.headless.unwrap_or(defaults.headless),
            browser_url: user.browser_url.unwrap_or(defaults.browser_url),
            browser_token: user.browser_token,
        }
    }
}

/// Positive limits pass through; anything else means the default ceiling.
pub fn effective_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => DEFAULT_LIMIT,
    }
}
