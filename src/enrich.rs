//! Optional body-text enrichment.
//!
//! Each record's link is opened in the shared page, its body text extracted,
//! and the record kept only when the keyword filter accepts that text.
//! Navigation reuses one page, so records are processed strictly one after
//! another.

use crate::browser::{BrowserPage, WaitUntil};
use crate::error::BrowserError;
use crate::extract::fields::selector;
use crate::models::Article;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

static CONTENT_ROOTS: Lazy<[Selector; 3]> =
    Lazy::new(|| [selector("article"), selector("main"), selector("body")]);
static TEXT_BLOCKS: Lazy<Selector> =
    Lazy::new(|| selector("p, h1, h2, h3, h4, h5, h6, li, blockquote"));
static NON_CONTENT: Lazy<Selector> = Lazy::new(|| selector("script, style, noscript"));

/// Keyword allow-list applied to enriched body text.
///
/// Matching is a case-insensitive substring test unless configured
/// otherwise. An empty list accepts everything.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    words: Vec<String>,
    case_sensitive: bool,
    patterns: Option<Vec<Regex>>,
}

impl KeywordFilter {
    pub fn new(words: Vec<String>) -> Self {
        Self::with_options(words, false, false)
    }

    /// Build a filter from raw keywords.
    ///
    /// Blank entries are ignored.
    ///
    /// # Arguments
    ///
    /// * `words` - Keywords, any one of which must appear in the text
    /// * `case_sensitive` - Compare letters exactly
    /// * `whole_word` - Require a non-word character or text edge on both
    ///   sides of the keyword, so `C++` matches in "I love C++ code" but
    ///   `art` does not match "smart"
    pub fn with_options(words: Vec<String>, case_sensitive: bool, whole_word: bool) -> Self {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let patterns = whole_word.then(|| {
            words
                .iter()
                .filter_map(|w| {
                    RegexBuilder::new(&format!(r"(?:^|\W){}(?:\W|$)", regex::escape(w)))
                        .case_insensitive(!case_sensitive)
                        .build()
                        .ok()
                })
                .collect()
        });

        Self {
            words,
            case_sensitive,
            patterns,
        }
    }

    pub fn accepts(&self, text: &str) -> bool {
        if self.words.is_empty() {
            return true;
        }
        if let Some(patterns) = &self.patterns {
            return patterns.iter().any(|re| re.is_match(text));
        }
        if self.case_sensitive {
            self.words.iter().any(|w| text.contains(w.as_str()))
        } else {
            let haystack = text.to_lowercase();
            self.words
                .iter()
                .any(|w| haystack.contains(&w.to_lowercase()))
        }
    }
}

fn is_inside_non_content(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| NON_CONTENT.matches(&ancestor))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Readable body text of a page: block-level text inside the main content
/// root, one block per line.
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Some(root) = CONTENT_ROOTS
        .iter()
        .find_map(|sel| document.select(sel).next())
    else {
        return String::new();
    };

    let blocks: Vec<String> = root
        .select(&TEXT_BLOCKS)
        // nested blocks (li > p) would otherwise be counted twice
        .filter(|block| {
            !block
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|a| a.id() != root.id())
                .any(|a| TEXT_BLOCKS.matches(&a))
        })
        .filter(|block| !is_inside_non_content(*block))
        .map(|block| collapse_whitespace(&block.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    if !blocks.is_empty() {
        return blocks.join("\n");
    }

    let text: String = root
        .descendants()
        .filter(|node| {
            node.parent()
                .and_then(ElementRef::wrap)
                .is_none_or(|parent| !NON_CONTENT.matches(&parent))
        })
        .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&text)
}

async fn fetch_body<P: BrowserPage>(page: &mut P, link: &str) -> Result<String, BrowserError> {
    page.goto(link, WaitUntil::NetworkIdle2).await?;
    let html = page.content().await?;
    Ok(extract_body_text(&html))
}

/// Attach body text to every record the filter accepts, in order. Records
/// whose page cannot be loaded are dropped.
#[instrument(level = "info", skip_all, fields(count = articles.len(), filter_words = filter.words.len()))]
pub async fn enrich_articles<P: BrowserPage>(
    page: &mut P,
    articles: Vec<Article>,
    filter: &KeywordFilter,
) -> Vec<Article> {
    let total = articles.len();
    let mut kept = Vec::with_capacity(total);

    for mut article in articles {
        match fetch_body(page, &article.link).await {
            Ok(content) if filter.accepts(&content) => {
                debug!(link = %article.link, bytes = content.len(), "Enriched article");
                article.content = Some(content);
                kept.push(article);
            }
            Ok(content) => {
                debug!(
                    link = %article.link,
                    preview = %truncate_for_log(&content, 120),
                    "Article content did not match filter words"
                );
            }
            Err(e) => {
                warn!(link = %article.link, error = %e, "Failed to fetch article content; dropping");
            }
        }
    }

    info!(total, kept = kept.len(), "Finished content enrichment");
    kept
}
