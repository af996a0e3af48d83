//! Data models for extracted articles and request parameters.
//!
//! - [`Article`]: one news item pulled from a rendered listing page
//! - [`QueryVars`]: insertion-ordered query parameters for the request URL
//!
//! `Article` serializes with the camelCase field names the JSON consumers of
//! this scraper already expect (`articleType`).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single news item extracted from a listing page.
///
/// Every field except `content` is always present; missing page elements
/// become empty strings rather than errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Headline text, trimmed.
    pub title: String,
    /// Absolute aggregator link, or the publisher URL once resolved.
    pub link: String,
    /// Absolute thumbnail URL, or empty.
    pub image: String,
    /// Publisher display name, or empty.
    pub source: String,
    /// ISO-8601 UTC timestamp with millisecond precision, or empty.
    pub datetime: String,
    /// Relative time label as rendered ("3 hours ago").
    pub time: String,
    /// Which layout produced the record: `topic` for the modern layout,
    /// `regular` / `topicFeatured` / `topicSmall` for the legacy one.
    pub article_type: String,
    /// Body text, only set when content enrichment ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Article {
    /// Whether the record has a usable headline.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Query parameters kept in insertion order.
///
/// Re-inserting a key overwrites its value without moving it, so the
/// serialized query string is reproducible for identical input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryVars(Vec<(String, String)>);

impl QueryVars {
    /// An empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = QueryVars::new();
        for (k, v) in iter {
            vars.insert(k, v);
        }
        vars
    }
}

impl Serialize for QueryVars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct QueryVarsVisitor;

impl<'de> Visitor<'de> for QueryVarsVisitor {
    type Value = QueryVars;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of query parameter names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut vars = QueryVars::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            vars.insert(k, v);
        }
        Ok(vars)
    }
}

impl<'de> Deserialize<'de> for QueryVars {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(QueryVarsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_serializes_camel_case() {
        let article = Article {
            title: "Hello".to_string(),
            article_type: "topic".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"articleType\":\"topic\""));
        assert!(!json.contains("content"));
    }

    #[test]
    fn test_article_content_serialized_when_present() {
        let article = Article {
            title: "Hello".to_string(),
            content: Some("Body".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"content\":\"Body\""));
    }

    #[test]
    fn test_has_title() {
        let mut article = Article::default();
        assert!(!article.has_title());
        article.title = "   \n".to_string();
        assert!(!article.has_title());
        article.title = "Headline".to_string();
        assert!(article.has_title());
    }

    #[test]
    fn test_query_vars_insert_replaces_in_place() {
        let mut vars = QueryVars::new();
        vars.insert("hl", "en-US");
        vars.insert("when", "1d");
        vars.insert("gl", "US");
        vars.insert("when", "7d");

        let keys: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["hl", "when", "gl"]);
        assert_eq!(vars.get("when"), Some("7d"));
    }

    #[test]
    fn test_query_vars_deserialize_keeps_document_order() {
        let yaml = "ceid: \"US:en\"\nhl: en-US\ngl: US\n";
        let vars: QueryVars = serde_yaml::from_str(yaml).unwrap();

        let keys: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ceid", "hl", "gl"]);
        assert_eq!(vars.get("ceid"), Some("US:en"));
    }

    #[test]
    fn test_query_vars_json_roundtrip() {
        let vars: QueryVars = [("q", "rust"), ("when", "7d")].into_iter().collect();
        let json = serde_json::to_string(&vars).unwrap();
        assert_eq!(json, r#"{"q":"rust","when":"7d"}"#);
        let back: QueryVars = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vars);
    }
}
