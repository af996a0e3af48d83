//! Request URL construction.
//!
//! The listing URL is the configured base URL followed by the merged query
//! parameters, in the order [`crate::ScraperConfig::from_user`] left them:
//!
//! ```text
//! https://news.google.com/search?hl=en-US&when=7d&q=Artificial%20Intelligence
//! └─────────── base_url ───────┘└ caller ┘└ when ┘└────── search term ──────┘
//! ```
//!
//! Keys and values are percent-encoded with `urlencoding`, so spaces become
//! `%20` rather than `+`.

use crate::config::ScraperConfig;
use crate::models::QueryVars;
use itertools::Itertools;

/// Serialize query parameters as `?k=v&k2=v2`, percent-encoding keys and
/// values and keeping insertion order. An empty mapping yields `""`.
pub fn build_query_string(vars: &QueryVars) -> String {
    if vars.is_empty() {
        return String::new();
    }
    let joined = vars
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .join("&");
    format!("?{joined}")
}

/// Full listing URL for a resolved config.
///
/// # Arguments
///
/// * `config` - Merged configuration
///
/// # Returns
///
/// `base_url` with the query string appended.
pub fn build_search_url(config: &ScraperConfig) -> String {
    format!(
        "{}{}",
        config.base_url,
        build_query_string(&config.query_vars)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    fn parse_back(query: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_empty_vars_yield_empty_string() {
        assert_eq!(build_query_string(&QueryVars::new()), "");
    }

    #[test]
    fn test_encodes_keys_and_values() {
        let vars: QueryVars = [("q", "rust & go"), ("ceid", "US:en")].into_iter().collect();
        assert_eq!(build_query_string(&vars), "?q=rust%20%26%20go&ceid=US%3Aen");
    }

    #[test]
    fn test_round_trip() {
        let vars: QueryVars = [
            ("q", "élection 2024"),
            ("when", "7d"),
            ("weird key", "a=b&c"),
            ("plus", "1+1"),
        ]
        .into_iter()
        .collect();

        let parsed = parse_back(&build_query_string(&vars));
        let expected: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_deterministic_output() {
        let a: QueryVars = [("hl", "en-US"), ("gl", "US")].into_iter().collect();
        let b = a.clone();
        assert_eq!(build_query_string(&a), build_query_string(&b));
    }

    #[test]
    fn test_build_search_url_default_endpoint() {
        let config = ScraperConfig::from_user(UserConfig {
            search_term: Some("Artificial Intelligence".to_string()),
            ..Default::default()
        });
        assert_eq!(
            build_search_url(&config),
            "https://news.google.com/search?when=7d&q=Artificial%20Intelligence"
        );
    }

    #[test]
    fn test_build_search_url_topic_page() {
        let config = ScraperConfig::from_user(UserConfig {
            base_url: Some("https://news.google.com/topics/CAAqIggKIhxDQkFTRHdv".to_string()),
            query_vars: Some(
                [("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        });
        assert_eq!(
            build_search_url(&config),
            "https://news.google.com/topics/CAAqIggKIhxDQkFTRHdv?hl=en-US&gl=US&ceid=US%3Aen&when=7d"
        );
    }
}
